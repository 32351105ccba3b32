use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

use super::{CatalogItem, ContentKind, Domain, Outcome, Suggestion, SuggestionKey};

/// Identity of the user the process is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sessions are unique per (user, domain)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user: UserId,
    pub domain: Domain,
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user, self.domain.as_str())
    }
}

/// One favorite as it appears in the baseline context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub title: String,
    pub line: String,
}

/// Natural-language summary of the user's favorites, captured when a session is created
///
/// Kept per entry so titles can be filtered out before prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    entries: Vec<BaselineEntry>,
}

impl Baseline {
    pub fn from_favorites<T: ContentKind>(favorites: &[CatalogItem<T>]) -> Self {
        let entries = favorites
            .iter()
            .map(|item| {
                let mut line = item.title.trim().to_string();
                let description = item.content.describe();
                if !description.is_empty() {
                    line.push_str(&format!(" ({})", description));
                }
                if let Some(genre) = item.primary_genre() {
                    line.push_str(&format!(" [{}]", genre));
                }
                BaselineEntry {
                    title: item.title.clone(),
                    line,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[BaselineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_title(&self, title: &str) -> bool {
        let wanted = title.trim().to_lowercase();
        self.entries
            .iter()
            .any(|e| e.title.trim().to_lowercase() == wanted)
    }

    /// Copy of the baseline without the given titles (case-insensitive)
    pub fn without_titles(&self, titles: &[String]) -> Self {
        let excluded: Vec<String> = titles.iter().map(|t| t.trim().to_lowercase()).collect();
        let entries = self
            .entries
            .iter()
            .filter(|e| !excluded.contains(&e.title.trim().to_lowercase()))
            .cloned()
            .collect();
        Self { entries }
    }

    /// Renders the baseline as one line per favorite
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- {}", e.line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-user, per-domain context used to generate and track suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session<T> {
    pub key: SessionKey,
    pub task_directive: String,
    pub baseline: Baseline,
    /// Seed payload; doubles as the output template given to the generative service
    pub content: T,
    pub favorites: Vec<CatalogItem<T>>,
    pub queue: Vec<CatalogItem<T>>,
    pub suggestions: HashMap<SuggestionKey, Suggestion<T>>,
    pub created_at: DateTime<Utc>,
}

impl<T: ContentKind> Session<T> {
    pub fn new(user: UserId, task_directive: String, baseline: Baseline) -> Self {
        Self {
            key: SessionKey {
                user,
                domain: T::DOMAIN,
            },
            task_directive,
            baseline,
            content: T::default(),
            favorites: Vec::new(),
            queue: Vec::new(),
            suggestions: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Seeds the session's favorites and queue
    pub fn with_lists(
        mut self,
        favorites: Vec<CatalogItem<T>>,
        queue: Vec<CatalogItem<T>>,
    ) -> Self {
        self.favorites = favorites;
        self.queue = queue;
        self
    }

    /// Recorded suggestions, oldest first
    pub fn history(&self) -> Vec<&Suggestion<T>> {
        let mut history: Vec<&Suggestion<T>> = self.suggestions.values().collect();
        history.sort_by(|a, b| {
            a.suggested_at
                .cmp(&b.suggested_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        history
    }

    /// Titles of recorded suggestions whose outcome matches `filter`, oldest first
    pub fn titles_where(&self, filter: impl Fn(Outcome) -> bool) -> Vec<String> {
        self.history()
            .into_iter()
            .filter(|s| filter(s.outcome))
            .map(|s| s.title.clone())
            .collect()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{CatalogId, CatalogItem, ContentKind, Outcome};
use crate::services::similarity::normalize;

/// Normalized composite key identifying one logical item within a domain
///
/// Built from the title and the domain's key fields, each passed through the
/// similarity engine's normalization, so casing and punctuation never matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SuggestionKey(String);

impl SuggestionKey {
    /// Joins the normalized parts with `|`
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: Vec<String> = parts.into_iter().map(|p| normalize(p.as_ref())).collect();
        Self(normalized.join("|"))
    }

    /// Default keyer: title followed by the content's key fields
    pub fn derive<T: ContentKind>(title: &str, content: &T) -> Self {
        Self::from_parts(std::iter::once(title).chain(content.key_fields()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SuggestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated, possibly catalog-reconciled recommendation
///
/// Everything except `outcome` is fixed once the suggestion is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion<T> {
    pub title: String,
    pub primary_genre: String,
    pub reasoning: String,
    pub content: T,
    pub outcome: Outcome,
    pub key: SuggestionKey,
    /// Set when the suggestion was reconciled with a catalog entry
    pub catalog_id: Option<CatalogId>,
    pub artwork: Option<String>,
    pub suggested_at: DateTime<Utc>,
}

impl<T: ContentKind> Suggestion<T> {
    pub fn new(
        title: impl Into<String>,
        primary_genre: impl Into<String>,
        reasoning: impl Into<String>,
        content: T,
    ) -> Self {
        let title = title.into();
        let key = SuggestionKey::derive(&title, &content);
        Self {
            title,
            primary_genre: primary_genre.into(),
            reasoning: reasoning.into(),
            content,
            outcome: Outcome::Pending,
            key,
            catalog_id: None,
            artwork: None,
            suggested_at: Utc::now(),
        }
    }

    /// Builds the record stored for an item returned to the user
    pub fn from_item(item: &CatalogItem<T>, reasoning: impl Into<String>) -> Self {
        let mut suggestion = Self::new(
            item.title.clone(),
            item.primary_genre().unwrap_or_default(),
            reasoning,
            item.content.clone(),
        );
        suggestion.catalog_id = item.id.clone();
        suggestion.artwork = item.artwork.clone();
        suggestion
    }

    /// The item as handed to the presentation layer
    pub fn to_item(&self) -> CatalogItem<T> {
        let genres = if self.primary_genre.trim().is_empty() {
            Vec::new()
        } else {
            vec![self.primary_genre.clone()]
        };

        CatalogItem {
            id: self.catalog_id.clone(),
            title: self.title.clone(),
            genres,
            content: self.content.clone(),
            artwork: self.artwork.clone(),
        }
    }

    /// Whether both identifying fields needed for reconciliation are present
    pub fn is_identifiable(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.secondary().trim().is_empty()
    }
}

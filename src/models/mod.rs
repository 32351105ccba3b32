use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod catalog;
pub mod content;
pub mod message;
pub mod session;
pub mod suggestion;

pub use catalog::{CatalogId, CatalogItem};
pub use content::{
    BookContent, ContentKind, DomainLists, MovieContent, MusicContent, TvShowContent,
    VideoGameContent,
};
pub use message::{Message, MessageRole};
pub use session::{Baseline, BaselineEntry, Session, SessionKey, UserId};
pub use suggestion::{Suggestion, SuggestionKey};

/// One of the five content categories a user can get suggestions for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Music,
    Movie,
    TvShow,
    VideoGame,
    Book,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Music,
        Domain::Movie,
        Domain::TvShow,
        Domain::VideoGame,
        Domain::Book,
    ];

    /// Stable identifier used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Music => "music",
            Domain::Movie => "movie",
            Domain::TvShow => "tv_show",
            Domain::VideoGame => "video_game",
            Domain::Book => "book",
        }
    }

    /// Human-readable name of a single item in this domain
    pub fn noun(&self) -> &'static str {
        match self {
            Domain::Music => "music track",
            Domain::Movie => "movie",
            Domain::TvShow => "TV show",
            Domain::VideoGame => "video game",
            Domain::Book => "book",
        }
    }

    /// Static instructions given to the generative service for this domain's sessions
    pub fn task_directive(&self) -> String {
        format!(
            "You are a recommendation assistant for {noun}s. Suggest exactly one {noun} \
             the user has not seen in this conversation, that fits their taste, and explain \
             briefly why they would enjoy it. Only suggest real {noun}s that exist.",
            noun = self.noun()
        )
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// Identifier of a generative suggestion-service provider (e.g. "openai")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user's reaction to a suggestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Pending,
    Liked,
    Disliked,
    Skipped,
    Added,
}

impl Outcome {
    /// Liked and Added both put the item into the user's favorites
    pub fn is_positive(&self) -> bool {
        matches!(self, Outcome::Liked | Outcome::Added)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::Pending => "pending",
            Outcome::Liked => "liked",
            Outcome::Disliked => "disliked",
            Outcome::Skipped => "skipped",
            Outcome::Added => "added",
        };
        write!(f, "{}", label)
    }
}

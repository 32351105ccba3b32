use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{ContentKind, SuggestionKey};

/// Identifier assigned to an item by a catalog service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogId(pub String);

impl CatalogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A domain item as exchanged with the presentation layer
///
/// Items coming from a catalog service carry its identifier. Stub items, built
/// from generative output when reconciliation finds no catalog match, have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem<T> {
    pub id: Option<CatalogId>,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub content: T,
    /// Artwork reference (cover, poster, box art) as given by the catalog
    #[serde(default)]
    pub artwork: Option<String>,
}

impl<T> CatalogItem<T> {
    /// Creates a catalog-backed item
    pub fn new(id: CatalogId, title: impl Into<String>, content: T) -> Self {
        Self {
            id: Some(id),
            title: title.into(),
            genres: Vec::new(),
            content,
            artwork: None,
        }
    }

    /// Creates an item that is not backed by any catalog entry
    pub fn stub(title: impl Into<String>, genres: Vec<String>, content: T) -> Self {
        Self {
            id: None,
            title: title.into(),
            genres,
            content,
            artwork: None,
        }
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    pub fn is_stub(&self) -> bool {
        self.id.is_none()
    }

    /// Case-insensitive title comparison used for list deduplication
    pub fn same_title(&self, title: &str) -> bool {
        self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }

    pub fn primary_genre(&self) -> Option<&str> {
        self.genres.first().map(String::as_str)
    }
}

impl<T: ContentKind> CatalogItem<T> {
    /// Dedup key of the logical item this entry refers to
    pub fn key(&self) -> SuggestionKey {
        SuggestionKey::derive(&self.title, &self.content)
    }
}

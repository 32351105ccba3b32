use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

use crate::{
    models::{CatalogItem, Domain},
    services::{registry::Registry, session::SessionStore},
};

/// Behaviour shared by the five domain payloads
pub trait ContentKind:
    Clone + Default + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const DOMAIN: Domain;

    /// Name of the field that must be present for a suggestion to be usable
    const SECONDARY_FIELD: &'static str;

    /// Whether catalog searches append the secondary field to the title query
    const SEARCH_WITH_SECONDARY: bool;

    /// Alternative names `(field, alias)` accepted when parsing generated payloads
    const FIELD_ALIASES: &'static [(&'static str, &'static str)] = &[];

    /// Value of the primary identifying field besides the title
    fn secondary(&self) -> &str;

    /// Fields that, together with the title, identify one logical item
    fn key_fields(&self) -> Vec<&str>;

    /// Short natural-language description, e.g. "by The Beatles, from Abbey Road"
    fn describe(&self) -> String;

    /// Copies every field that is blank here from `other`
    fn fill_blanks(&mut self, other: &Self);

    fn slot(lists: &DomainLists) -> &Vec<CatalogItem<Self>>;

    fn slot_mut(lists: &mut DomainLists) -> &mut Vec<CatalogItem<Self>>;

    fn session_store(registry: &Registry) -> &SessionStore<Self>;
}

/// Typed per-domain item lists, shared across domains by the favorites and queue stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainLists {
    #[serde(default)]
    pub music: Vec<CatalogItem<MusicContent>>,
    #[serde(default)]
    pub movies: Vec<CatalogItem<MovieContent>>,
    #[serde(default)]
    pub tv_shows: Vec<CatalogItem<TvShowContent>>,
    #[serde(default)]
    pub video_games: Vec<CatalogItem<VideoGameContent>>,
    #[serde(default)]
    pub books: Vec<CatalogItem<BookContent>>,
}

impl DomainLists {
    /// Total number of items across all domains
    pub fn len(&self) -> usize {
        self.music.len()
            + self.movies.len()
            + self.tv_shows.len()
            + self.video_games.len()
            + self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expands to the accessors tying a content kind to its list slot and session store
macro_rules! domain_slots {
    ($lists:ident, $store:ident) => {
        fn slot(lists: &DomainLists) -> &Vec<CatalogItem<Self>> {
            &lists.$lists
        }

        fn slot_mut(lists: &mut DomainLists) -> &mut Vec<CatalogItem<Self>> {
            &mut lists.$lists
        }

        fn session_store(registry: &Registry) -> &SessionStore<Self> {
            registry.$store()
        }
    };
}

/// Overwrites blank fields of `$target` with the values from `$source`
macro_rules! fill_blank_fields {
    ($target:expr, $source:expr, $($field:ident),+) => {
        $(
            if $target.$field.trim().is_empty() {
                $target.$field = $source.$field.clone();
            }
        )+
    };
}

fn join_parts(parts: &[(&str, &str)]) -> String {
    parts
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{} {}", label, value.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicContent {
    pub artist: String,
    pub album: String,
}

impl ContentKind for MusicContent {
    const DOMAIN: Domain = Domain::Music;
    const SECONDARY_FIELD: &'static str = "artist";
    const SEARCH_WITH_SECONDARY: bool = true;

    fn secondary(&self) -> &str {
        &self.artist
    }

    fn key_fields(&self) -> Vec<&str> {
        vec![self.artist.as_str(), self.album.as_str()]
    }

    fn describe(&self) -> String {
        join_parts(&[("by", self.artist.as_str()), ("from", self.album.as_str())])
    }

    fn fill_blanks(&mut self, other: &Self) {
        fill_blank_fields!(self, other, artist, album);
    }

    domain_slots!(music, music);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieContent {
    pub director: String,
    pub writer: String,
    #[serde(alias = "posterPath")]
    pub poster_path: String,
}

impl ContentKind for MovieContent {
    const DOMAIN: Domain = Domain::Movie;
    const SECONDARY_FIELD: &'static str = "director";
    const SEARCH_WITH_SECONDARY: bool = false;
    const FIELD_ALIASES: &'static [(&'static str, &'static str)] =
        &[("poster_path", "posterPath")];

    fn secondary(&self) -> &str {
        &self.director
    }

    fn key_fields(&self) -> Vec<&str> {
        vec![self.director.as_str(), self.writer.as_str()]
    }

    fn describe(&self) -> String {
        join_parts(&[
            ("directed by", self.director.as_str()),
            ("written by", self.writer.as_str()),
        ])
    }

    fn fill_blanks(&mut self, other: &Self) {
        fill_blank_fields!(self, other, director, writer, poster_path);
    }

    domain_slots!(movies, movies);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvShowContent {
    #[serde(alias = "creator")]
    pub director: String,
    pub writer: String,
    #[serde(alias = "posterPath")]
    pub poster_path: String,
}

impl ContentKind for TvShowContent {
    const DOMAIN: Domain = Domain::TvShow;
    const SECONDARY_FIELD: &'static str = "director";
    const SEARCH_WITH_SECONDARY: bool = false;
    const FIELD_ALIASES: &'static [(&'static str, &'static str)] =
        &[("director", "creator"), ("poster_path", "posterPath")];

    fn secondary(&self) -> &str {
        &self.director
    }

    fn key_fields(&self) -> Vec<&str> {
        vec![self.director.as_str(), self.writer.as_str()]
    }

    fn describe(&self) -> String {
        join_parts(&[
            ("created by", self.director.as_str()),
            ("written by", self.writer.as_str()),
        ])
    }

    fn fill_blanks(&mut self, other: &Self) {
        fill_blank_fields!(self, other, director, writer, poster_path);
    }

    domain_slots!(tv_shows, tv_shows);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoGameContent {
    pub developer: String,
    pub publisher: String,
}

impl ContentKind for VideoGameContent {
    const DOMAIN: Domain = Domain::VideoGame;
    const SECONDARY_FIELD: &'static str = "developer";
    const SEARCH_WITH_SECONDARY: bool = false;

    fn secondary(&self) -> &str {
        &self.developer
    }

    fn key_fields(&self) -> Vec<&str> {
        vec![self.developer.as_str(), self.publisher.as_str()]
    }

    fn describe(&self) -> String {
        join_parts(&[
            ("developed by", self.developer.as_str()),
            ("published by", self.publisher.as_str()),
        ])
    }

    fn fill_blanks(&mut self, other: &Self) {
        fill_blank_fields!(self, other, developer, publisher);
    }

    domain_slots!(video_games, video_games);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookContent {
    pub author: String,
}

impl ContentKind for BookContent {
    const DOMAIN: Domain = Domain::Book;
    const SECONDARY_FIELD: &'static str = "author";
    const SEARCH_WITH_SECONDARY: bool = true;

    fn secondary(&self) -> &str {
        &self.author
    }

    fn key_fields(&self) -> Vec<&str> {
        vec![self.author.as_str()]
    }

    fn describe(&self) -> String {
        join_parts(&[("by", self.author.as_str())])
    }

    fn fill_blanks(&mut self, other: &Self) {
        fill_blank_fields!(self, other, author);
    }

    domain_slots!(books, books);
}

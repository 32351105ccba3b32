use std::sync::Arc;

use crate::{
    models::{
        BookContent, ContentKind, MovieContent, MusicContent, TvShowContent, UserId,
        VideoGameContent,
    },
    services::{
        lists::ItemListStore,
        persistence::PersistentListStore,
        session::SessionStore,
        settings::{Settings, SettingsStore},
    },
};

/// Sessions and shared stores of the bound user
///
/// Built once at startup and passed by `Arc` to every orchestrator.
pub struct Registry {
    user: UserId,
    music: SessionStore<MusicContent>,
    movies: SessionStore<MovieContent>,
    tv_shows: SessionStore<TvShowContent>,
    video_games: SessionStore<VideoGameContent>,
    books: SessionStore<BookContent>,
    favorites: ItemListStore,
    queue: ItemListStore,
    settings: SettingsStore,
}

impl Registry {
    /// Creates a registry whose favorites and queue live only in memory
    pub fn new(user: UserId, settings: Settings) -> Self {
        Self::build(
            user,
            settings,
            ItemListStore::new("favorites"),
            ItemListStore::new("queue"),
        )
    }

    /// Creates a registry backed by durable favorites/queue stores and loads their contents
    ///
    /// A backend that fails to load is logged and its store starts empty.
    pub async fn load(
        user: UserId,
        settings: Settings,
        favorites_backend: Arc<dyn PersistentListStore>,
        queue_backend: Arc<dyn PersistentListStore>,
    ) -> Self {
        let registry = Self::build(
            user,
            settings,
            ItemListStore::with_backend("favorites", favorites_backend),
            ItemListStore::with_backend("queue", queue_backend),
        );

        for store in [&registry.favorites, &registry.queue] {
            if let Err(e) = store.hydrate().await {
                tracing::error!(error = %e, store = store.name(), "Failed to load persisted list, starting empty");
            }
        }

        registry
    }

    fn build(
        user: UserId,
        settings: Settings,
        favorites: ItemListStore,
        queue: ItemListStore,
    ) -> Self {
        tracing::info!(user = %user, provider = %settings.provider, "Registry initialized");
        Self {
            user,
            music: SessionStore::new(),
            movies: SessionStore::new(),
            tv_shows: SessionStore::new(),
            video_games: SessionStore::new(),
            books: SessionStore::new(),
            favorites,
            queue,
            settings: SettingsStore::new(settings),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn music(&self) -> &SessionStore<MusicContent> {
        &self.music
    }

    pub fn movies(&self) -> &SessionStore<MovieContent> {
        &self.movies
    }

    pub fn tv_shows(&self) -> &SessionStore<TvShowContent> {
        &self.tv_shows
    }

    pub fn video_games(&self) -> &SessionStore<VideoGameContent> {
        &self.video_games
    }

    pub fn books(&self) -> &SessionStore<BookContent> {
        &self.books
    }

    /// Session store of the domain `T` belongs to
    pub fn sessions<T: ContentKind>(&self) -> &SessionStore<T> {
        T::session_store(self)
    }

    pub fn favorites(&self) -> &ItemListStore {
        &self.favorites
    }

    pub fn queue(&self) -> &ItemListStore {
        &self.queue
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

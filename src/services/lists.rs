use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{CatalogItem, ContentKind, DomainLists},
    services::persistence::PersistentListStore,
};

/// One typed list per domain behind a single lock, optionally written through to a durable store
///
/// Adding an item whose title is already present (case-insensitive) is a no-op,
/// never an error.
pub struct ItemListStore {
    name: &'static str,
    lists: RwLock<DomainLists>,
    backend: Option<Arc<dyn PersistentListStore>>,
}

impl ItemListStore {
    /// Creates a purely in-memory store
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lists: RwLock::new(DomainLists::default()),
            backend: None,
        }
    }

    /// Creates a store that writes every mutation through to `backend`
    pub fn with_backend(name: &'static str, backend: Arc<dyn PersistentListStore>) -> Self {
        Self {
            name,
            lists: RwLock::new(DomainLists::default()),
            backend: Some(backend),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replaces the in-memory state with the backend's contents; returns the item count
    pub async fn hydrate(&self) -> AppResult<usize> {
        let Some(backend) = &self.backend else {
            return Ok(0);
        };

        let loaded = backend.load().await?;
        let count = loaded.len();
        *self.lists.write().await = loaded;

        tracing::info!(
            store = self.name,
            backend = backend.name(),
            items = count,
            "List store hydrated"
        );
        Ok(count)
    }

    pub async fn list<T: ContentKind>(&self) -> Vec<CatalogItem<T>> {
        T::slot(&*self.lists.read().await).clone()
    }

    pub async fn contains_title<T: ContentKind>(&self, title: &str) -> bool {
        T::slot(&*self.lists.read().await)
            .iter()
            .any(|item| item.same_title(title))
    }

    /// Replaces the domain's list wholesale
    pub async fn replace<T: ContentKind>(&self, items: Vec<CatalogItem<T>>) {
        let mut lists = self.lists.write().await;
        *T::slot_mut(&mut lists) = items;
        self.write_through(&lists).await;
    }

    /// Appends the item unless its title is already present; returns whether it was added
    pub async fn upsert<T: ContentKind>(&self, item: CatalogItem<T>) -> bool {
        let mut lists = self.lists.write().await;
        let slot = T::slot_mut(&mut lists);
        if slot.iter().any(|existing| existing.same_title(&item.title)) {
            tracing::debug!(store = self.name, domain = %T::DOMAIN, title = %item.title, "Duplicate entry ignored");
            return false;
        }

        slot.push(item);
        self.write_through(&lists).await;
        true
    }

    /// Removes every item of the domain matching the predicate; returns how many were removed
    pub async fn remove_where<T, P>(&self, predicate: P) -> usize
    where
        T: ContentKind,
        P: Fn(&CatalogItem<T>) -> bool,
    {
        let mut lists = self.lists.write().await;
        let slot = T::slot_mut(&mut lists);
        let before = slot.len();
        slot.retain(|item| !predicate(item));
        let removed = before - slot.len();

        if removed > 0 {
            self.write_through(&lists).await;
        }
        removed
    }

    /// Saves under the caller's write lock so backend writes stay ordered
    ///
    /// Failures are logged; the in-memory state remains authoritative for the process.
    async fn write_through(&self, lists: &DomainLists) {
        let Some(backend) = &self.backend else {
            return;
        };

        if let Err(e) = backend.save(lists).await {
            tracing::error!(
                error = %e,
                store = self.name,
                backend = backend.name(),
                "Failed to persist list store"
            );
        }
    }
}

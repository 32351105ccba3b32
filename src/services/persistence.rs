use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::{error::AppResult, models::DomainLists};

/// Loads and saves the complete set of per-domain lists
#[async_trait::async_trait]
pub trait PersistentListStore: Send + Sync {
    async fn load(&self) -> AppResult<DomainLists>;

    async fn save(&self, lists: &DomainLists) -> AppResult<()>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Process-local list store, useful as a default backend and in tests
#[derive(Default)]
pub struct InMemoryListStore {
    lists: Mutex<DomainLists>,
    saves: AtomicUsize,
}

impl InMemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `lists`
    pub fn with_lists(lists: DomainLists) -> Self {
        Self {
            lists: Mutex::new(lists),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PersistentListStore for InMemoryListStore {
    async fn load(&self) -> AppResult<DomainLists> {
        Ok(self.lists.lock().await.clone())
    }

    async fn save(&self, lists: &DomainLists) -> AppResult<()> {
        *self.lists.lock().await = lists.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

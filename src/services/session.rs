use std::{collections::HashMap, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};

use crate::{
    error::{AppError, AppResult},
    models::{
        Baseline, CatalogItem, ContentKind, Outcome, Session, Suggestion, SuggestionKey, UserId,
    },
};

type Keyer<T> = Box<dyn Fn(&Suggestion<T>) -> SuggestionKey + Send + Sync>;
type Equality<T> = Box<dyn Fn(&Suggestion<T>, &Suggestion<T>) -> bool + Send + Sync>;

/// Overrides for how `add_suggestion_with` identifies duplicates
///
/// The keyer replaces the default title + key-fields derivation. The equality
/// predicate additionally catches logically-equal entries stored under a
/// different key; those entries are replaced by the new suggestion.
pub struct DedupPolicy<T> {
    keyer: Option<Keyer<T>>,
    equal: Option<Equality<T>>,
}

impl<T> Default for DedupPolicy<T> {
    fn default() -> Self {
        Self {
            keyer: None,
            equal: None,
        }
    }
}

impl<T: ContentKind> DedupPolicy<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyer(
        mut self,
        keyer: impl Fn(&Suggestion<T>) -> SuggestionKey + Send + Sync + 'static,
    ) -> Self {
        self.keyer = Some(Box::new(keyer));
        self
    }

    pub fn with_equality(
        mut self,
        equal: impl Fn(&Suggestion<T>, &Suggestion<T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.equal = Some(Box::new(equal));
        self
    }

    fn key_for(&self, suggestion: &Suggestion<T>) -> SuggestionKey {
        match &self.keyer {
            Some(keyer) => keyer(suggestion),
            None => SuggestionKey::derive(&suggestion.title, &suggestion.content),
        }
    }
}

/// Shared handle to one session and its lock
pub struct SessionHandle<T> {
    inner: Arc<RwLock<Session<T>>>,
}

impl<T> Clone for SessionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ContentKind> SessionHandle<T> {
    pub async fn read(&self) -> RwLockReadGuard<'_, Session<T>> {
        self.inner.read().await
    }

    /// Owned copy of the session state
    pub async fn snapshot(&self) -> Session<T> {
        self.inner.read().await.clone()
    }

    /// Whether two handles point at the same session
    pub fn same_session(&self, other: &SessionHandle<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Holds the sessions of one content domain, keyed by user
///
/// Each session sits behind its own lock; the map lock is only held to find or
/// insert a handle.
pub struct SessionStore<T> {
    sessions: RwLock<HashMap<UserId, SessionHandle<T>>>,
}

impl<T: ContentKind> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ContentKind> SessionStore<T> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the user's session, creating it on first access
    ///
    /// `task_fn` and `baseline_fn` only run when the session is created. The
    /// baseline is therefore a snapshot of the favorites at creation time.
    pub async fn get_or_create<F, B>(
        &self,
        user: &UserId,
        task_fn: F,
        baseline_fn: B,
    ) -> SessionHandle<T>
    where
        F: FnOnce() -> String,
        B: FnOnce() -> Baseline,
    {
        self.get_or_create_with(user, || {
            Session::new(user.clone(), task_fn(), baseline_fn())
        })
        .await
    }

    /// Like `get_or_create`, but `build` assembles the whole session on first access
    pub async fn get_or_create_with<F>(&self, user: &UserId, build: F) -> SessionHandle<T>
    where
        F: FnOnce() -> Session<T>,
    {
        if let Some(handle) = self.sessions.read().await.get(user) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have created it while we waited for the write lock
        if let Some(handle) = sessions.get(user) {
            return handle.clone();
        }

        let session = build();
        tracing::info!(
            domain = %T::DOMAIN,
            user = %user,
            baseline_entries = session.baseline.entries().len(),
            favorites = session.favorites.len(),
            queued = session.queue.len(),
            "Session created"
        );

        let handle = SessionHandle {
            inner: Arc::new(RwLock::new(session)),
        };
        sessions.insert(user.clone(), handle.clone());
        handle
    }

    pub async fn get(&self, user: &UserId) -> Option<SessionHandle<T>> {
        self.sessions.read().await.get(user).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Records a suggestion as Pending under its default dedup key
    pub async fn add_suggestion(
        &self,
        session: &SessionHandle<T>,
        suggestion: Suggestion<T>,
    ) -> SuggestionKey {
        self.add_suggestion_with(session, suggestion, &DedupPolicy::default())
            .await
    }

    /// Records a suggestion as Pending, overwriting any live entry for the same item
    ///
    /// Concurrent calls resolving to the same key are not fenced against each
    /// other; the last write wins.
    pub async fn add_suggestion_with(
        &self,
        session: &SessionHandle<T>,
        mut suggestion: Suggestion<T>,
        policy: &DedupPolicy<T>,
    ) -> SuggestionKey {
        let key = policy.key_for(&suggestion);
        suggestion.key = key.clone();
        suggestion.outcome = Outcome::Pending;

        let mut session = session.inner.write().await;

        if let Some(equal) = &policy.equal {
            let stale: Vec<SuggestionKey> = session
                .suggestions
                .iter()
                .filter(|(existing_key, existing)| {
                    **existing_key != key && equal(*existing, &suggestion)
                })
                .map(|(existing_key, _)| existing_key.clone())
                .collect();

            for stale_key in stale {
                session.suggestions.remove(&stale_key);
                tracing::debug!(
                    domain = %T::DOMAIN,
                    key = %stale_key,
                    replacement = %key,
                    "Replaced equal suggestion stored under another key"
                );
            }
        }

        let replaced = session.suggestions.insert(key.clone(), suggestion).is_some();
        tracing::debug!(domain = %T::DOMAIN, key = %key, replaced, "Suggestion recorded");

        key
    }

    /// Sets the user's outcome on a recorded suggestion
    pub async fn update_suggestion_outcome(
        &self,
        session: &SessionHandle<T>,
        key: &SuggestionKey,
        outcome: Outcome,
    ) -> AppResult<()> {
        let mut session = session.inner.write().await;

        match session.suggestions.get_mut(key) {
            Some(suggestion) => {
                let previous = suggestion.outcome;
                suggestion.outcome = outcome;
                tracing::debug!(
                    domain = %T::DOMAIN,
                    key = %key,
                    from = %previous,
                    to = %outcome,
                    "Suggestion outcome updated"
                );
                Ok(())
            }
            None => Err(AppError::NotFoundInSession {
                domain: T::DOMAIN,
                key: key.clone(),
            }),
        }
    }

    /// Recorded suggestions, oldest first
    pub async fn history(&self, session: &SessionHandle<T>) -> Vec<Suggestion<T>> {
        session
            .read()
            .await
            .history()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn favorites(&self, session: &SessionHandle<T>) -> Vec<CatalogItem<T>> {
        session.read().await.favorites.clone()
    }

    /// Replaces the session's favorites; does not rebuild the baseline
    pub async fn set_favorites(&self, session: &SessionHandle<T>, favorites: Vec<CatalogItem<T>>) {
        session.inner.write().await.favorites = favorites;
    }

    /// Adds a favorite unless one with the same title exists; returns whether it was added
    pub async fn upsert_favorite(&self, session: &SessionHandle<T>, item: CatalogItem<T>) -> bool {
        let mut session = session.inner.write().await;
        if session.favorites.iter().any(|f| f.same_title(&item.title)) {
            return false;
        }
        session.favorites.push(item);
        true
    }

    pub async fn queue(&self, session: &SessionHandle<T>) -> Vec<CatalogItem<T>> {
        session.read().await.queue.clone()
    }

    /// Appends to the queue; a case-insensitive title duplicate is a no-op returning `false`
    pub async fn add_to_queue(&self, session: &SessionHandle<T>, item: CatalogItem<T>) -> bool {
        let mut session = session.inner.write().await;
        if session.queue.iter().any(|q| q.same_title(&item.title)) {
            return false;
        }
        session.queue.push(item);
        true
    }

    /// Removes every queued item matching the predicate; returns how many were removed
    pub async fn remove_from_queue<P>(&self, session: &SessionHandle<T>, predicate: P) -> usize
    where
        P: Fn(&CatalogItem<T>) -> bool,
    {
        let mut session = session.inner.write().await;
        let before = session.queue.len();
        session.queue.retain(|item| !predicate(item));
        before - session.queue.len()
    }
}

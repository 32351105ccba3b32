use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{broadcast::error::RecvError, RwLock},
    task::JoinHandle,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Baseline, CatalogId, CatalogItem, ContentKind, Message, Outcome, ProviderId, Session,
        Suggestion,
    },
    services::{
        catalog::{self, CatalogSearch},
        credentials::CredentialStore,
        providers::{
            BackendFactory, GenerativeClient, MalformedResponse, PromptContext, SuggestionClient,
        },
        registry::Registry,
        session::{SessionHandle, SessionStore},
        similarity::{self, MatchWeights},
    },
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type ClientMap<T> = HashMap<ProviderId, Arc<dyn SuggestionClient<T>>>;

/// Suggestion workflow of one content domain
///
/// Owns the domain's suggestion clients and drives a request from prompt
/// composition through catalog reconciliation to the session record. User
/// feedback goes through here into the session and the shared stores.
pub struct DomainOrchestrator<T: ContentKind> {
    registry: Arc<Registry>,
    catalog: Arc<dyn CatalogSearch<T>>,
    clients: RwLock<ClientMap<T>>,
    /// Every provider this orchestrator has been told about, with or without a client
    known_providers: RwLock<BTreeSet<ProviderId>>,
    default_provider: ProviderId,
    credentials: Option<Arc<dyn CredentialStore>>,
    factory: Option<Arc<dyn BackendFactory>>,
    weights: MatchWeights,
    timeout: Duration,
}

impl<T: ContentKind> DomainOrchestrator<T> {
    pub fn new(
        registry: Arc<Registry>,
        catalog: Arc<dyn CatalogSearch<T>>,
        default_provider: ProviderId,
    ) -> Self {
        let mut known_providers = BTreeSet::new();
        known_providers.insert(default_provider.clone());

        Self {
            registry,
            catalog,
            clients: RwLock::new(HashMap::new()),
            known_providers: RwLock::new(known_providers),
            default_provider,
            credentials: None,
            factory: None,
            weights: MatchWeights::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Enables credential refresh: clients are rebuilt from the store's secrets
    pub fn with_credentials(
        mut self,
        credentials: Arc<dyn CredentialStore>,
        factory: Arc<dyn BackendFactory>,
    ) -> Self {
        self.credentials = Some(credentials);
        self.factory = Some(factory);
        self
    }

    /// Registers providers that credential refresh should consider
    pub fn with_providers(mut self, providers: impl IntoIterator<Item = ProviderId>) -> Self {
        self.known_providers.get_mut().extend(providers);
        self
    }

    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn store(&self) -> &SessionStore<T> {
        self.registry.sessions::<T>()
    }

    /// The user's session for this domain
    ///
    /// On first use the baseline, favorites and queue are taken from the shared stores.
    async fn session(&self) -> SessionHandle<T> {
        let user = self.registry.user();
        if let Some(handle) = self.store().get(user).await {
            return handle;
        }

        let favorites = self.registry.favorites().list::<T>().await;
        let queue = self.registry.queue().list::<T>().await;
        self.store()
            .get_or_create_with(user, || {
                let baseline = Baseline::from_favorites(&favorites);
                Session::new(user.clone(), T::DOMAIN.task_directive(), baseline)
                    .with_lists(favorites, queue)
            })
            .await
    }

    /// Generates one suggestion, reconciles it with the catalog and records it as Pending
    ///
    /// Returns the item to show and the generative service's reasoning.
    #[instrument(skip(self), fields(domain = %T::DOMAIN, request_id = %Uuid::new_v4()))]
    pub async fn get_suggestion(&self) -> AppResult<(CatalogItem<T>, String)> {
        let session = self.session().await;
        let client = self.select_client().await?;

        let context = PromptContext::from_session(&*session.read().await);
        let messages = client.compose_messages(&context)?;
        tracing::debug!(
            provider = %client.provider(),
            messages = messages.len(),
            liked = context.liked.len(),
            avoided = context.avoid.len(),
            "Prompt composed"
        );

        let generated = self.dispatch(client.as_ref(), &messages).await?;
        let (item, reasoning) = self.reconcile(generated).await?;

        let key = self
            .store()
            .add_suggestion(&session, Suggestion::from_item(&item, reasoning.clone()))
            .await;
        tracing::info!(
            title = %item.title,
            key = %key,
            provider = %client.provider(),
            stub = item.is_stub(),
            "Suggestion recorded"
        );

        Ok((item, reasoning))
    }

    /// Sends the prompt; a malformed response gets exactly one follow-up
    async fn dispatch(
        &self,
        client: &dyn SuggestionClient<T>,
        messages: &[Message],
    ) -> AppResult<Suggestion<T>> {
        tracing::debug!(provider = %client.provider(), "Prompt dispatched");

        let error = match client.send_messages(messages).await {
            Ok(suggestion) => {
                tracing::debug!(title = %suggestion.title, "Response parsed");
                return Ok(suggestion);
            }
            Err(e) => e,
        };

        let Some(malformed) = MalformedResponse::from_error(&error) else {
            tracing::error!(error = %error, provider = %client.provider(), "Suggestion request failed");
            return Err(error);
        };

        tracing::warn!(
            provider = %client.provider(),
            reason = %malformed.reason,
            "Malformed suggestion, sending follow-up"
        );

        match client.error_followup(&malformed, messages).await {
            Ok(suggestion) => {
                tracing::debug!(title = %suggestion.title, "Follow-up response parsed");
                Ok(suggestion)
            }
            Err(e) => {
                tracing::error!(error = %e, provider = %client.provider(), "Follow-up failed");
                Err(e)
            }
        }
    }

    /// Picks the closest catalog entry, falling back to a stub built from the generated fields
    async fn reconcile(&self, generated: Suggestion<T>) -> AppResult<(CatalogItem<T>, String)> {
        let query = catalog::reconciliation_query(&generated.title, &generated.content);
        let candidates = self.catalog.search(&query).await?;

        let best = similarity::best_match(
            &generated.title,
            generated.content.secondary(),
            &candidates,
            &self.weights,
            |candidate| (candidate.title.as_str(), candidate.content.secondary()),
        );

        let item = match best {
            Some(scored) => {
                tracing::debug!(
                    catalog = self.catalog.name(),
                    candidates = candidates.len(),
                    matched = %scored.item.title,
                    score = scored.score,
                    "Reconciled with catalog"
                );
                let mut item = scored.item.clone();
                item.content.fill_blanks(&generated.content);
                if item.genres.is_empty() {
                    item.genres = generated.to_item().genres;
                }
                item
            }
            None => {
                tracing::debug!(
                    catalog = self.catalog.name(),
                    query = %query,
                    "No catalog candidates, using stub"
                );
                generated.to_item()
            }
        };

        Ok((item, generated.reasoning))
    }

    /// Records the user's reaction to a suggestion
    ///
    /// An item that is not in the session is logged and otherwise ignored. Liked
    /// and Added items move into the favorites and out of the queue.
    #[instrument(skip(self, item), fields(domain = %T::DOMAIN, title = %item.title))]
    pub async fn provide_feedback(&self, outcome: Outcome, item: &CatalogItem<T>) -> AppResult<()> {
        let session = self.session().await;
        let key = item.key();

        match self
            .store()
            .update_suggestion_outcome(&session, &key, outcome)
            .await
        {
            Ok(()) => {}
            Err(e @ AppError::NotFoundInSession { .. }) => {
                tracing::warn!(error = %e, outcome = %outcome, "Feedback for unknown suggestion");
            }
            Err(e) => return Err(e),
        }

        if outcome.is_positive() {
            let added = self.registry.favorites().upsert(item.clone()).await;
            self.store().upsert_favorite(&session, item.clone()).await;
            let dequeued = self.dequeue(&session, &item.title).await;
            tracing::info!(outcome = %outcome, added, dequeued, "Item saved to favorites");
        }

        Ok(())
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem<T>>> {
        catalog::search_titles(self.catalog.clone(), query).await
    }

    pub async fn details(&self, id: &CatalogId) -> AppResult<CatalogItem<T>> {
        self.catalog.details(id).await
    }

    /// The user's favorites for this domain
    pub async fn favorites(&self) -> Vec<CatalogItem<T>> {
        self.registry.favorites().list::<T>().await
    }

    /// Replaces the favorites; the current session's baseline is left as it was
    pub async fn set_favorites(&self, items: Vec<CatalogItem<T>>) {
        let session = self.session().await;
        self.store().set_favorites(&session, items.clone()).await;
        self.registry.favorites().replace::<T>(items).await;
    }

    pub async fn queue(&self) -> Vec<CatalogItem<T>> {
        self.registry.queue().list::<T>().await
    }

    /// Queues the item; returns `false` when an item with the same title is already queued
    pub async fn add_to_queue(&self, item: CatalogItem<T>) -> bool {
        let session = self.session().await;
        self.store().add_to_queue(&session, item.clone()).await;
        self.registry.queue().upsert::<T>(item).await
    }

    /// Removes queued items with the given title; returns whether anything was removed
    pub async fn remove_from_queue(&self, title: &str) -> bool {
        let session = self.session().await;
        self.dequeue(&session, title).await > 0
    }

    async fn dequeue(&self, session: &SessionHandle<T>, title: &str) -> usize {
        self.store()
            .remove_from_queue(session, |item| item.same_title(title))
            .await;
        self.registry
            .queue()
            .remove_where::<T, _>(|item| item.same_title(title))
            .await
    }

    /// Client for the selected provider, or the default provider's when it has none
    async fn select_client(&self) -> AppResult<Arc<dyn SuggestionClient<T>>> {
        let selected = self.registry.settings().active_provider().await;
        let clients = self.clients.read().await;

        if let Some(client) = clients.get(&selected) {
            return Ok(client.clone());
        }

        match clients.get(&self.default_provider) {
            Some(client) => {
                tracing::warn!(
                    selected = %selected,
                    fallback = %self.default_provider,
                    "Selected provider unavailable, using default"
                );
                Ok(client.clone())
            }
            None => Err(AppError::CredentialsUnavailable(selected.to_string())),
        }
    }

    /// Whether a suggestion could be requested right now
    pub async fn has_valid_credentials(&self) -> bool {
        self.select_client().await.is_ok()
    }

    /// Rebuilds or drops the client of every known provider from the credential store
    pub async fn refresh_credentials(&self) -> bool {
        let mut providers = self.known_providers.read().await.clone();
        providers.extend(self.clients.read().await.keys().cloned());
        providers.insert(self.registry.settings().active_provider().await);

        for provider in &providers {
            self.refresh_provider(provider).await;
        }

        self.has_valid_credentials().await
    }

    /// Rebuilds or drops one provider's client; returns whether it now has one
    ///
    /// The domain's model from the settings is read here, at build time. Settings
    /// changed directly on the registry's `SettingsStore` take effect on the next
    /// refresh; `set_provider` and `set_model` refresh right away.
    pub async fn refresh_provider(&self, provider: &ProviderId) -> bool {
        let (Some(credentials), Some(factory)) = (&self.credentials, &self.factory) else {
            tracing::debug!(provider = %provider, "No credential store configured, nothing to refresh");
            return self.clients.read().await.contains_key(provider);
        };
        self.known_providers.write().await.insert(provider.clone());

        let backend = match credentials.get(provider).await {
            Ok(secret) => factory.build(provider, &secret),
            Err(e) => Err(e),
        };

        match backend {
            Ok(backend) => {
                let mut client =
                    GenerativeClient::<T>::new(provider.clone(), backend, self.timeout);
                let settings = self.registry.settings().get().await;
                if settings.provider == *provider {
                    client = client.with_model(settings.model_for(T::DOMAIN).map(str::to_string));
                }
                tracing::info!(
                    provider = %provider,
                    domain = %T::DOMAIN,
                    model = client.model(),
                    "Suggestion client refreshed"
                );
                self.insert_client(Arc::new(client)).await;
                true
            }
            Err(e) => {
                let removed = self.remove_client(provider).await;
                tracing::info!(
                    provider = %provider,
                    domain = %T::DOMAIN,
                    error = %e,
                    removed,
                    "Suggestion client unavailable"
                );
                false
            }
        }
    }

    /// Selects the provider used for suggestions and rebuilds the affected clients
    ///
    /// Settings are shared by every domain; orchestrators of other domains pick
    /// up the change on their next refresh. Returns whether the new provider has
    /// a client.
    pub async fn set_provider(&self, provider: ProviderId) -> bool {
        let previous = self.registry.settings().active_provider().await;
        self.registry.settings().set_provider(provider.clone()).await;

        if previous != provider {
            // The previous client was built with this domain's model override
            self.refresh_provider(&previous).await;
        }
        self.refresh_provider(&provider).await
    }

    /// Sets this domain's model and rebuilds the selected provider's client with it
    pub async fn set_model(&self, model: impl Into<String>) -> bool {
        self.registry.settings().set_model(T::DOMAIN, model).await;
        let provider = self.registry.settings().active_provider().await;
        self.refresh_provider(&provider).await
    }

    /// Adds or replaces the client for its provider; in-flight calls keep the old one
    pub async fn insert_client(&self, client: Arc<dyn SuggestionClient<T>>) {
        let provider = client.provider().clone();
        self.known_providers.write().await.insert(provider.clone());
        self.clients.write().await.insert(provider, client);
    }

    pub async fn remove_client(&self, provider: &ProviderId) -> bool {
        self.clients.write().await.remove(provider).is_some()
    }

    /// Refreshes the affected client whenever the credential store reports a change
    ///
    /// The task ends when the store's notification channel closes, or right away
    /// when no credential store is configured.
    pub fn spawn_credential_watcher(self: Arc<Self>) -> JoinHandle<()> {
        let changes = self.credentials.as_ref().map(|store| store.subscribe());

        tokio::spawn(async move {
            let Some(mut changes) = changes else {
                tracing::debug!(domain = %T::DOMAIN, "No credential store, watcher not started");
                return;
            };

            loop {
                match changes.recv().await {
                    Ok(provider) => {
                        self.refresh_provider(&provider).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(domain = %T::DOMAIN, skipped, "Missed credential changes, refreshing all");
                        self.refresh_credentials().await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(domain = %T::DOMAIN, "Credential store closed, watcher stopped");
                        break;
                    }
                }
            }
        })
    }
}

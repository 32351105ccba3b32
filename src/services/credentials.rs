use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::ProviderId,
};

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Provider secrets owned by an external store
///
/// Orchestrators only read secrets and listen for changes so they can swap the
/// affected client without a restart.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the provider's secret, or `CredentialsUnavailable` when none is stored
    async fn get(&self, provider: &ProviderId) -> AppResult<SecretString>;

    async fn set(&self, provider: &ProviderId, secret: SecretString) -> AppResult<()>;

    async fn clear(&self, provider: &ProviderId) -> AppResult<()>;

    /// Receives the id of every provider whose credentials changed
    fn subscribe(&self) -> broadcast::Receiver<ProviderId>;
}

/// Credential store kept in process memory
pub struct InMemoryCredentialStore {
    secrets: RwLock<HashMap<ProviderId, SecretString>>,
    changes: broadcast::Sender<ProviderId>,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            secrets: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, provider: &ProviderId) {
        // No subscribers is fine; nobody needs to react yet
        let _ = self.changes.send(provider.clone());
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, provider: &ProviderId) -> AppResult<SecretString> {
        self.secrets
            .read()
            .await
            .get(provider)
            .map(|secret| SecretString::new(secret.expose_secret().clone()))
            .ok_or_else(|| AppError::CredentialsUnavailable(provider.to_string()))
    }

    async fn set(&self, provider: &ProviderId, secret: SecretString) -> AppResult<()> {
        if secret.expose_secret().trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Empty credential for provider {}",
                provider
            )));
        }

        self.secrets.write().await.insert(provider.clone(), secret);
        tracing::info!(provider = %provider, "Credentials stored");
        self.notify(provider);
        Ok(())
    }

    async fn clear(&self, provider: &ProviderId) -> AppResult<()> {
        if self.secrets.write().await.remove(provider).is_some() {
            tracing::info!(provider = %provider, "Credentials cleared");
            self.notify(provider);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderId> {
        self.changes.subscribe()
    }
}

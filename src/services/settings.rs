use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{Domain, ProviderId};

/// User-selected suggestion-service provider and per-domain model choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub provider: ProviderId,
    #[serde(default)]
    pub models: HashMap<Domain, String>,
}

impl Settings {
    pub fn new(provider: impl Into<ProviderId>) -> Self {
        Self {
            provider: provider.into(),
            models: HashMap::new(),
        }
    }

    pub fn with_model(mut self, domain: Domain, model: impl Into<String>) -> Self {
        self.models.insert(domain, model.into());
        self
    }

    pub fn model_for(&self, domain: Domain) -> Option<&str> {
        self.models.get(&domain).map(String::as_str)
    }
}

/// Settings shared by every orchestrator
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub async fn get(&self) -> Settings {
        self.inner.read().await.clone()
    }

    pub async fn active_provider(&self) -> ProviderId {
        self.inner.read().await.provider.clone()
    }

    pub async fn set_provider(&self, provider: ProviderId) {
        let mut settings = self.inner.write().await;
        tracing::info!(from = %settings.provider, to = %provider, "Active provider changed");
        settings.provider = provider;
    }

    pub async fn model_for(&self, domain: Domain) -> Option<String> {
        self.inner.read().await.model_for(domain).map(str::to_string)
    }

    pub async fn set_model(&self, domain: Domain, model: impl Into<String>) {
        self.inner.write().await.models.insert(domain, model.into());
    }
}

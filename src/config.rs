use serde::Deserialize;
use std::time::Duration;

use crate::{
    models::{Domain, ProviderId, UserId},
    services::{settings::Settings, similarity::MatchWeights},
};

/// Application configuration loaded from `CURATOR_`-prefixed environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// User the registry is bound to
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Provider used when the selected one has no client
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Provider selected in the user's settings; defaults to `default_provider`
    pub active_provider: Option<String>,

    pub music_model: Option<String>,
    pub movie_model: Option<String>,
    pub tv_model: Option<String>,
    pub game_model: Option<String>,
    pub book_model: Option<String>,

    /// Deadline for a single generative call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_title_weight")]
    pub title_weight: f64,

    #[serde(default = "default_secondary_weight")]
    pub secondary_weight: f64,
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_title_weight() -> f64 {
    0.7
}

fn default_secondary_weight() -> f64 {
    0.3
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("CURATOR_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn user(&self) -> UserId {
        UserId::new(self.user_id.clone())
    }

    pub fn default_provider(&self) -> ProviderId {
        ProviderId::new(self.default_provider.clone())
    }

    /// Initial settings: the active provider plus any per-domain model overrides
    pub fn settings(&self) -> Settings {
        let provider = self
            .active_provider
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.default_provider.clone());

        let models = [
            (Domain::Music, &self.music_model),
            (Domain::Movie, &self.movie_model),
            (Domain::TvShow, &self.tv_model),
            (Domain::VideoGame, &self.game_model),
            (Domain::Book, &self.book_model),
        ];

        models
            .into_iter()
            .filter_map(|(domain, model)| model.clone().map(|m| (domain, m)))
            .fold(Settings::new(ProviderId::new(provider)), |settings, (domain, model)| {
                settings.with_model(domain, model)
            })
    }

    pub fn match_weights(&self) -> MatchWeights {
        MatchWeights::new(self.title_weight, self.secondary_weight)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

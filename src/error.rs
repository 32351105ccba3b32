use crate::models::{Domain, SuggestionKey};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Network failure or timeout talking to a generative or catalog service
    #[error("{service} request failed: {message}")]
    TransientService { service: String, message: String },

    /// The generative service answered, but not with a usable suggestion
    #[error("Malformed {domain} suggestion from {provider}: {reason}")]
    MalformedSuggestion {
        domain: Domain,
        provider: String,
        reason: String,
        /// Raw response text, replayed to the provider on follow-up
        raw: String,
    },

    #[error("Credentials unavailable for {0}")]
    CredentialsUnavailable(String),

    #[error("No {domain} suggestion with key '{key}' in session")]
    NotFoundInSession { domain: Domain, key: SuggestionKey },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a transient error for the named service
    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransientService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call later could reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::TransientService { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, AppError::MalformedSuggestion { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;

use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Baseline, ContentKind, Message, Outcome, ProviderId, Session, Suggestion},
};

pub mod generative;
pub mod parse;

pub use generative::GenerativeClient;

/// Filtered session state a client composes its prompt from
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext<T> {
    pub task_directive: String,
    /// Favorites summary with disliked titles already removed
    pub baseline: Baseline,
    pub seed: T,
    /// Earlier suggestions the user liked or added
    pub liked: Vec<String>,
    /// Earlier suggestions that must not be repeated
    pub avoid: Vec<String>,
}

impl<T: ContentKind> PromptContext<T> {
    /// Builds the prompt context, filtering the session history
    ///
    /// Disliked titles are dropped from the baseline even if they were favorites
    /// when the session started. Everything suggested before and not liked goes
    /// to the avoid list.
    pub fn from_session(session: &Session<T>) -> Self {
        let disliked = session.titles_where(|o| o == Outcome::Disliked);

        Self {
            task_directive: session.task_directive.clone(),
            baseline: session.baseline.without_titles(&disliked),
            seed: session.content.clone(),
            liked: session.titles_where(|o| o.is_positive()),
            avoid: session.titles_where(|o| !o.is_positive()),
        }
    }
}

/// A provider response that could not be turned into a suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedResponse {
    pub reason: String,
    pub raw: String,
}

impl MalformedResponse {
    /// Extracts the malformed response carried by a `MalformedSuggestion` error
    pub fn from_error(error: &AppError) -> Option<Self> {
        match error {
            AppError::MalformedSuggestion { reason, raw, .. } => Some(Self {
                reason: reason.clone(),
                raw: raw.clone(),
            }),
            _ => None,
        }
    }
}

/// Trait for suggestion-service clients of one domain
///
/// Generative services (OpenAI, Anthropic, local models, ...) plug in here and
/// return parsed, structurally valid suggestions.
///
/// `compose_messages` has a shared default so every provider prompts the same
/// way; providers only differ in how they dispatch and parse.
#[async_trait::async_trait]
pub trait SuggestionClient<T: ContentKind>: Send + Sync {
    /// Turns the task directive, baseline, history and seed into an ordered prompt
    fn compose_messages(&self, context: &PromptContext<T>) -> AppResult<Vec<Message>> {
        compose_messages(context)
    }

    /// Dispatches the prompt and parses the structured result
    ///
    /// A response without a title or the domain's secondary field fails with
    /// `MalformedSuggestion`.
    async fn send_messages(&self, messages: &[Message]) -> AppResult<Suggestion<T>>;

    /// Re-prompts once with the malformed response and what was wrong with it
    async fn error_followup(
        &self,
        malformed: &MalformedResponse,
        messages: &[Message],
    ) -> AppResult<Suggestion<T>>;

    fn provider(&self) -> &ProviderId;
}

/// Raw chat completion against a generative service
///
/// This is the seam where the HTTP client of each provider plugs in.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, model: &str, messages: &[Message]) -> AppResult<String>;

    /// Model used when the settings do not name one for the domain
    fn default_model(&self) -> &str;
}

/// Builds chat backends from freshly read credentials
pub trait BackendFactory: Send + Sync {
    fn build(
        &self,
        provider: &ProviderId,
        secret: &SecretString,
    ) -> AppResult<Arc<dyn ChatBackend>>;
}

/// JSON template describing the expected response shape
fn output_template<T: ContentKind>(seed: &T) -> AppResult<String> {
    let fields = match serde_json::to_value(seed) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            return Err(AppError::InvalidInput(format!(
                "{} seed must serialize to an object, got {}",
                T::DOMAIN,
                other
            )))
        }
        Err(e) => {
            return Err(AppError::InvalidInput(format!(
                "{} seed could not be serialized: {}",
                T::DOMAIN,
                e
            )))
        }
    };

    let mut template = serde_json::Map::new();
    template.insert("title".to_string(), Value::String("<title>".to_string()));
    for (name, value) in fields {
        let placeholder = match value {
            Value::String(s) if !s.trim().is_empty() => Value::String(s),
            _ => Value::String(format!("<{}>", name)),
        };
        template.insert(name, placeholder);
    }
    template.insert(
        "primary_genre".to_string(),
        Value::String("<primary genre>".to_string()),
    );
    template.insert(
        "reasoning".to_string(),
        Value::String("<why the user will enjoy it>".to_string()),
    );

    serde_json::to_string_pretty(&Value::Object(template))
        .map_err(|e| AppError::Internal(format!("Template serialization error: {}", e)))
}

/// Default prompt layout shared by every provider
pub fn compose_messages<T: ContentKind>(context: &PromptContext<T>) -> AppResult<Vec<Message>> {
    let noun = T::DOMAIN.noun();
    let template = output_template(&context.seed)?;

    let mut messages = vec![Message::system(format!(
        "{}\n\nRespond with only a JSON object of this shape:\n{}\n\
         The \"title\" and \"{}\" fields are required.",
        context.task_directive,
        template,
        T::SECONDARY_FIELD
    ))];

    if context.baseline.is_empty() {
        messages.push(Message::user(format!(
            "I have not saved any favorite {}s yet.",
            noun
        )));
    } else {
        messages.push(Message::user(format!(
            "These are my favorite {}s:\n{}",
            noun,
            context.baseline.render()
        )));
    }

    if !context.liked.is_empty() {
        messages.push(Message::user(format!(
            "I also liked these earlier suggestions: {}",
            context.liked.join(", ")
        )));
    }

    if !context.avoid.is_empty() {
        messages.push(Message::user(format!(
            "Do not suggest any of these again: {}",
            context.avoid.join(", ")
        )));
    }

    messages.push(Message::user(format!("Suggest one {} for me.", noun)));
    Ok(messages)
}

use std::{marker::PhantomData, sync::Arc, time::Duration};

use super::{parse, ChatBackend, MalformedResponse, SuggestionClient};
use crate::{
    error::{AppError, AppResult},
    models::{ContentKind, Message, ProviderId, Suggestion},
};

/// Suggestion client backed by a chat-completion service
///
/// Prompt composition is shared; this client only dispatches through its
/// backend with a deadline and parses the reply.
pub struct GenerativeClient<T> {
    provider: ProviderId,
    backend: Arc<dyn ChatBackend>,
    model: String,
    timeout: Duration,
    _domain: PhantomData<fn() -> T>,
}

impl<T: ContentKind> GenerativeClient<T> {
    /// Creates a client using the backend's default model
    pub fn new(provider: ProviderId, backend: Arc<dyn ChatBackend>, timeout: Duration) -> Self {
        let model = backend.default_model().to_string();
        Self {
            provider,
            backend,
            model,
            timeout,
            _domain: PhantomData,
        }
    }

    /// Overrides the model, ignoring blank names
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> AppResult<String> {
        match tokio::time::timeout(self.timeout, self.backend.complete(&self.model, messages)).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::transient(
                self.provider.as_str(),
                format!("no response within {}s", self.timeout.as_secs()),
            )),
        }
    }

    fn parse(&self, raw: String) -> AppResult<Suggestion<T>> {
        parse::parse_suggestion::<T>(&raw).map_err(|e| {
            tracing::debug!(
                provider = %self.provider,
                domain = %T::DOMAIN,
                error = %e,
                "Provider response did not parse"
            );
            AppError::MalformedSuggestion {
                domain: T::DOMAIN,
                provider: self.provider.to_string(),
                reason: e.to_string(),
                raw,
            }
        })
    }
}

#[async_trait::async_trait]
impl<T: ContentKind> SuggestionClient<T> for GenerativeClient<T> {
    async fn send_messages(&self, messages: &[Message]) -> AppResult<Suggestion<T>> {
        let raw = self.complete(messages).await?;
        self.parse(raw)
    }

    async fn error_followup(
        &self,
        malformed: &MalformedResponse,
        messages: &[Message],
    ) -> AppResult<Suggestion<T>> {
        let mut followup = messages.to_vec();
        followup.push(Message::assistant(malformed.raw.clone()));
        followup.push(Message::user(format!(
            "That response could not be used ({}). Reply again with only the JSON object, \
             including non-empty \"title\" and \"{}\" fields.",
            malformed.reason,
            T::SECONDARY_FIELD
        )));

        let raw = self.complete(&followup).await?;
        self.parse(raw)
    }

    fn provider(&self) -> &ProviderId {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookContent, MessageRole};
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it receives
    struct ScriptedBackend {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<Vec<Message>>>,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, _model: &str, messages: &[Message]) -> AppResult<String> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::transient("scripted", "no reply left"))
        }

        fn default_model(&self) -> &str {
            "scripted-1"
        }
    }

    fn client(backend: Arc<ScriptedBackend>) -> GenerativeClient<BookContent> {
        GenerativeClient::new(ProviderId::new("openai"), backend, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_send_messages_parses_reply() {
        let backend = Arc::new(ScriptedBackend::new(&[
            r#"{"title":"Dune","author":"Frank Herbert","reasoning":"Epic"}"#,
        ]));
        let suggestion = client(backend)
            .send_messages(&[Message::user("Suggest one book for me.")])
            .await
            .unwrap();

        assert_eq!(suggestion.title, "Dune");
        assert_eq!(suggestion.content.author, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_malformed_reply_carries_raw_text() {
        let backend = Arc::new(ScriptedBackend::new(&[r#"{"title":"Dune"}"#]));
        let err = client(backend)
            .send_messages(&[Message::user("Suggest one book for me.")])
            .await
            .unwrap_err();

        match err {
            AppError::MalformedSuggestion { raw, provider, .. } => {
                assert_eq!(raw, r#"{"title":"Dune"}"#);
                assert_eq!(provider, "openai");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_followup_replays_malformed_response() {
        let backend = Arc::new(ScriptedBackend::new(&[
            r#"{"title":"Dune","author":"Frank Herbert"}"#,
        ]));
        let malformed = MalformedResponse {
            reason: "missing required field \"author\"".to_string(),
            raw: r#"{"title":"Dune"}"#.to_string(),
        };
        let original = vec![Message::system("Recommend books."), Message::user("Go")];

        let suggestion = client(backend.clone())
            .error_followup(&malformed, &original)
            .await
            .unwrap();
        assert_eq!(suggestion.content.author, "Frank Herbert");

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let sent = &prompts[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].role, MessageRole::Assistant);
        assert_eq!(sent[2].content, malformed.raw);
        assert!(sent[3].content.contains("\"author\""));
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let mut backend = ScriptedBackend::new(&["{}"]);
        backend.delay = Duration::from_millis(200);
        let client = GenerativeClient::<BookContent>::new(
            ProviderId::new("slow"),
            Arc::new(backend),
            Duration::from_millis(10),
        );

        let err = client
            .send_messages(&[Message::user("Go")])
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_with_model_ignores_blank() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let client = client(backend.clone()).with_model(Some("  ".to_string()));
        assert_eq!(client.model(), "scripted-1");

        let client = GenerativeClient::<BookContent>::new(
            ProviderId::new("openai"),
            backend,
            Duration::from_secs(1),
        )
        .with_model(Some("gpt-4o".to_string()));
        assert_eq!(client.model(), "gpt-4o");
    }
}

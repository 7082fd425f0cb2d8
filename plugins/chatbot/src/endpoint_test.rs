#[cfg(test)]
mod tests {
    use crate::endpoint::{system_instruction, ChatRequest, ChatbotEndpoint, FALLBACK_NOTE};
    use crate::error::{ChatbotError, ProviderError};
    use crate::provider::{CompletionProvider, CompletionRequest};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use trellis_core::error::Result as CoreResult;
    use trellis_core::{EventBus, InMemoryEventBus, SystemEvent, SystemEventHandler};

    enum Behaviour {
        Reply(&'static str),
        Fail,
        Panic,
    }

    struct FakeProvider {
        behaviour: Behaviour,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    fn endpoint_with(provider: Arc<FakeProvider>) -> ChatbotEndpoint {
        ChatbotEndpoint::new(Some(provider as Arc<dyn CompletionProvider>))
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> std::result::Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(ProviderError::Status {
                    status: 429,
                    body: "rate limited".to_string(),
                }),
                Behaviour::Panic => panic!("provider blew up"),
            }
        }
    }

    struct FallbackRecorder {
        reasons: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SystemEventHandler for FallbackRecorder {
        async fn handle_system_event(&self, event: &SystemEvent) -> CoreResult<()> {
            if let SystemEvent::ChatFallback { reason, .. } = event {
                self.reasons.lock().unwrap().push(reason.clone());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_non_post_rejected() {
        let endpoint = ChatbotEndpoint::mock_only();
        for method in ["GET", "PUT", "DELETE"] {
            let reply = endpoint.handle(method, br#"{"message":"Hello"}"#).await;
            assert_eq!(reply.status, 405);
            assert_eq!(reply.body, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn test_missing_message_rejected() {
        let endpoint = ChatbotEndpoint::mock_only();
        let bodies: [&[u8]; 5] = [
            b"",
            b"{}",
            br#"{"message": ""}"#,
            br#"{"message": 42}"#,
            b"not json",
        ];
        for body in bodies {
            let reply = endpoint.handle("POST", body).await;
            assert_eq!(reply.status, 400);
            assert_eq!(reply.body, json!({"error": "Message is required"}));
        }
    }

    #[tokio::test]
    async fn test_no_credential_uses_mock() {
        let endpoint = ChatbotEndpoint::mock_only();
        let reply = endpoint.handle("POST", br#"{"message":"Hello"}"#).await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            json!({"response": "Hello! How can I help you today?"})
        );
    }

    #[tokio::test]
    async fn test_provider_reply_returned_verbatim() {
        let provider = FakeProvider::new(Behaviour::Reply("  We ship worldwide. "));
        let endpoint = endpoint_with(provider.clone());

        let reply = endpoint
            .handle(
                "POST",
                br#"{"message":"Do you ship?","initialPrompt":"Be concise","context":"Shop page"}"#,
            )
            .await;
        assert_eq!(reply.body, json!({"response": "  We ship worldwide. "}));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].user, "Do you ship?");
        assert_eq!(
            seen[0].system,
            "You are a helpful assistant. The current page content is: \"Shop page\" The user's initial prompt was: \"Be concise\""
        );
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let bus = Arc::new(InMemoryEventBus::new());
        let recorder = Arc::new(FallbackRecorder {
            reasons: Mutex::new(Vec::new()),
        });
        bus.subscribe_system_events(recorder.clone()).await.unwrap();

        let endpoint =
            endpoint_with(FakeProvider::new(Behaviour::Fail)).with_event_bus(bus);
        let reply = endpoint.handle("POST", br#"{"message":"bye"}"#).await;

        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body["response"],
            format!("Goodbye! Have a great day!{}", FALLBACK_NOTE)
        );
        assert_eq!(recorder.reasons.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_panic_is_internal_error() {
        let endpoint = endpoint_with(FakeProvider::new(Behaviour::Panic));
        let reply = endpoint.handle("POST", br#"{"message":"hello"}"#).await;
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_respond_rejects_empty_message() {
        let endpoint = ChatbotEndpoint::mock_only();
        let err = endpoint.respond(ChatRequest::new("")).await.unwrap_err();
        assert_eq!(err, ChatbotError::MessageRequired);
    }

    #[test]
    fn test_system_instruction_clauses() {
        assert_eq!(system_instruction(None, None), "You are a helpful assistant.");
        assert_eq!(
            system_instruction(Some(""), Some("")),
            "You are a helpful assistant."
        );
        assert_eq!(
            system_instruction(Some("Talk like a chef"), None),
            "You are a helpful assistant. The user's initial prompt was: \"Talk like a chef\""
        );
    }

    #[test]
    fn test_request_parsing_drops_mistyped_optionals() {
        let request =
            ChatRequest::from_json(br#"{"message":"hi","initialPrompt":7,"context":"About us"}"#)
                .unwrap();
        assert_eq!(request.initial_prompt, None);
        assert_eq!(request.context.as_deref(), Some("About us"));
    }
}

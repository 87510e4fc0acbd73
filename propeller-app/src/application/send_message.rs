use crate::domain::{Attachment, Chat, ChatMessage, Role};
use crate::infrastructure::openrouter::{
    prompt, ChatCompletionRequest, Message, OpenRouterClient, TEXT_MODEL, VISION_MODEL,
};
use crate::infrastructure::security::InputSanitizer;
use crate::infrastructure::store::{ChatRepository, DataStore};
use crate::infrastructure::uploads::FileStorage;
use propeller_errors::AppError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    /// Forwarded to the model as sent.
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    pub personality_prompt: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendMessageOutcome {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    pub chat: Chat,
}

pub struct SendMessage {
    chats: ChatRepository,
    files: FileStorage,
    llm: OpenRouterClient,
    store: Arc<DataStore>,
}

impl SendMessage {
    pub fn new(
        store: Arc<DataStore>,
        chats: ChatRepository,
        files: FileStorage,
        llm: OpenRouterClient,
    ) -> Self {
        Self {
            chats,
            files,
            llm,
            store,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_configured()
    }

    pub async fn execute(
        &self,
        user_id: &str,
        chat_id: &str,
        request: SendMessageRequest,
    ) -> Result<SendMessageOutcome, AppError> {
        let text = request.message.unwrap_or_default();
        let attachments = request.attachments.unwrap_or_default();

        if text.trim().is_empty() && attachments.is_empty() {
            return Err(AppError::BadRequest(
                "Message or attachment is required".to_string(),
            ));
        }

        if let Some(owner) = self.chats.owner_of(chat_id) {
            if owner != user_id {
                tracing::warn!("User {} tried to post into chat {} of another user", user_id, chat_id);
                return Err(AppError::NotFound("Chat not found".to_string()));
            }
        }

        let has_images = attachments.iter().any(Attachment::is_image);
        let image_urls = self.inline_images(&attachments).await;

        let mut messages = Vec::with_capacity(2 + request.conversation_history.as_ref().map_or(0, Vec::len));
        messages.push(Message::text(
            Role::System.as_str(),
            prompt::system_prompt(
                request.personality_prompt.as_deref(),
                request.language.as_deref(),
            ),
        ));
        messages.extend(
            request
                .conversation_history
                .unwrap_or_default()
                .into_iter()
                .map(|entry| Message::text(entry.role.as_str(), entry.content)),
        );
        messages.push(Message::new(
            Role::User.as_str(),
            prompt::user_content(Some(&text), image_urls),
        ));

        let model = if has_images { VISION_MODEL } else { TEXT_MODEL };
        tracing::debug!("Using model: {} (has_images: {})", model, has_images);

        let reply = self
            .llm
            .complete(&ChatCompletionRequest::new(model, messages))
            .await?;

        let user_message = ChatMessage::user(text.clone(), attachments);
        let assistant_message = ChatMessage::assistant(reply);

        let (mut chat, created) = self
            .chats
            .append_or_create(
                chat_id,
                user_id,
                request.personality,
                vec![user_message.clone(), assistant_message.clone()],
            )
            .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

        if created {
            if let Some(title) = self.title_for(&text).await {
                if let Some(titled) = self.chats.set_title(chat_id, title) {
                    chat = titled;
                }
            }
        }

        self.store.persist().await;

        Ok(SendMessageOutcome {
            user_message,
            assistant_message,
            chat,
        })
    }

    /// Image attachments as data URLs. Files that cannot be read are skipped.
    async fn inline_images(&self, attachments: &[Attachment]) -> Vec<String> {
        let mut urls = Vec::new();
        for attachment in attachments.iter().filter(|a| a.is_image()) {
            match self.files.read_data_url(attachment).await {
                Ok(url) => {
                    tracing::debug!("Inlined image {} ({} chars)", attachment.path, url.len());
                    urls.push(url);
                }
                Err(e) => tracing::error!("Error reading image {}: {}", attachment.path, e),
            }
        }
        urls
    }

    async fn title_for(&self, first_message: &str) -> Option<String> {
        match self.llm.generate_title(first_message).await {
            Ok(title) => Some(title),
            Err(e) => {
                tracing::warn!("Error generating title: {}", e);
                Some(InputSanitizer::fallback_title(first_message)).filter(|t| !t.is_empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::openrouter::TITLE_MODEL;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("propeller-send-{}-{}", name, uuid::Uuid::new_v4()))
    }

    fn completion(text: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] })
    }

    async fn use_case(server: &MockServer, name: &str) -> (SendMessage, ChatRepository) {
        let store = Arc::new(DataStore::empty(temp_dir(name)));
        let chats = ChatRepository::new(store.clone());
        let files = FileStorage::init(temp_dir(&format!("{}-uploads", name)))
            .await
            .unwrap();
        let llm = OpenRouterClient::new(Some("k".into()), server.uri(), "http://localhost:3000");
        (SendMessage::new(store, chats.clone(), files, llm), chats)
    }

    fn request(message: &str) -> SendMessageRequest {
        SendMessageRequest {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_chat_gets_reply_and_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": TITLE_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("'Rust Borrowing'")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": TEXT_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Borrowing is...")))
            .expect(1)
            .mount(&server)
            .await;

        let (send, chats) = use_case(&server, "new").await;
        let outcome = send
            .execute("u1", "chat-1", request("explain borrowing"))
            .await
            .unwrap();

        assert_eq!(outcome.assistant_message.content, "Borrowing is...");
        assert_eq!(outcome.user_message.role, Role::User);
        assert_eq!(outcome.chat.title, "Rust Borrowing");
        assert_eq!(outcome.chat.messages.len(), 2);
        assert_eq!(chats.list_for_user("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_title_failure_falls_back_to_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": TITLE_MODEL })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": TEXT_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let (send, _) = use_case(&server, "fallback").await;
        let long = "a question that is definitely longer than forty characters";
        let outcome = send.execute("u1", "c", request(long)).await.unwrap();
        assert_eq!(outcome.chat.title, format!("{}...", &long[..40]));
    }

    #[tokio::test]
    async fn test_existing_chat_keeps_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": TEXT_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("again")))
            .expect(1)
            .mount(&server)
            .await;

        let (send, chats) = use_case(&server, "existing").await;
        let chat = chats.create("u1", Some("Mine".into()));
        let outcome = send.execute("u1", &chat.id, request("hi")).await.unwrap();
        assert_eq!(outcome.chat.title, "Mine");
        assert_eq!(outcome.chat.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_forwarded_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let (send, chats) = use_case(&server, "history").await;
        let chat = chats.create("u1", None);
        let request: SendMessageRequest = serde_json::from_value(json!({
            "message": "and now?",
            "conversationHistory": [
                { "role": "user", "content": "first" },
                { "role": "tool", "content": "lookup result" }
            ]
        }))
        .unwrap();
        send.execute("u1", &chat.id, request).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["content"], "lookup result");
        assert_eq!(messages[3]["role"], "user");
    }

    #[tokio::test]
    async fn test_rejects_empty_message() {
        let server = MockServer::start().await;
        let (send, _) = use_case(&server, "empty").await;
        let err = send.execute("u1", "c", request("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_other_users_chat_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("nope")))
            .expect(0)
            .mount(&server)
            .await;

        let (send, chats) = use_case(&server, "foreign").await;
        let chat = chats.create("owner", None);
        let err = send.execute("intruder", &chat.id, request("hi")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(chats.find_owned(&chat.id, "owner").unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_saves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (send, chats) = use_case(&server, "down").await;
        let err = send.execute("u1", "c", request("hello")).await.unwrap_err();
        assert!(matches!(err, AppError::OpenRouterError(_)));
        assert!(chats.list_for_user("u1").is_empty());
    }

    #[tokio::test]
    async fn test_image_attachment_uses_vision_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": VISION_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("a cat")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": TITLE_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Cat Photo")))
            .mount(&server)
            .await;

        let (send, _) = use_case(&server, "vision").await;
        let stored = send.files.save("cat.png", b"not really a png").await.unwrap();
        let attachment = Attachment {
            filename: stored.clone(),
            original_name: "cat.png".into(),
            mimetype: "image/png".into(),
            size: 16,
            path: crate::infrastructure::uploads::public_path(&stored),
            url: String::new(),
        };

        let outcome = send
            .execute(
                "u1",
                "c",
                SendMessageRequest {
                    message: Some("what is this?".into()),
                    attachments: Some(vec![attachment]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.assistant_message.content, "a cat");
        assert_eq!(outcome.chat.title, "Cat Photo");
        assert_eq!(
            outcome.user_message.attachments.as_ref().map(Vec::len),
            Some(1)
        );
    }
}

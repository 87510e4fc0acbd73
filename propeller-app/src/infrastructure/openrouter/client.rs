use super::prompt::{title_request_text, TITLE_PROMPT};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, Message};
use crate::infrastructure::security::InputSanitizer;
use propeller_errors::AppError;

pub const TEXT_MODEL: &str = "deepseek/deepseek-chat";
pub const VISION_MODEL: &str = "openai/gpt-4o";
pub const TITLE_MODEL: &str = "openai/gpt-4o-mini";

const APP_TITLE: &str = "Propeller AI";
const TITLE_MAX_TOKENS: u32 = 20;
const TITLE_TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    referer: String,
}

impl OpenRouterClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            referer: referer.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one chat completion and returns the first choice's text.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("AI service is not configured".to_string())
        })?;

        tracing::debug!("Using model: {}", request.model);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", APP_TITLE)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::OpenRouterError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("OpenRouter error: {} - {}", status, body);
            return Err(AppError::OpenRouterError(format!(
                "OpenRouter API error: {}",
                status.as_u16()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::OpenRouterError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::OpenRouterError("No response from AI".to_string()))
    }

    /// Asks a small model for a 2-5 word title for a conversation.
    pub async fn generate_title(&self, first_message: &str) -> Result<String, AppError> {
        let request = ChatCompletionRequest::new(
            TITLE_MODEL,
            vec![
                Message::text("system", TITLE_PROMPT),
                Message::text("user", title_request_text(first_message)),
            ],
        )
        .with_max_tokens(TITLE_MAX_TOKENS)
        .with_temperature(TITLE_TEMPERATURE);

        let title = InputSanitizer::clean_generated_title(&self.complete(&request).await?);
        if title.is_empty() {
            return Err(AppError::OpenRouterError("Empty title from AI".to_string()));
        }
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(text: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("X-Title", "Propeller AI"))
            .and(body_partial_json(json!({ "model": TEXT_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(Some("test-key".into()), server.uri(), "http://localhost:3000");
        let request = ChatCompletionRequest::new(TEXT_MODEL, vec![Message::text("user", "hello")]);
        assert_eq!(client.complete(&request).await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "rate limited" })))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(Some("k".into()), server.uri(), "http://localhost");
        let request = ChatCompletionRequest::new(TEXT_MODEL, vec![Message::text("user", "hello")]);
        match client.complete(&request).await {
            Err(AppError::OpenRouterError(msg)) => assert!(msg.contains("429")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = OpenRouterClient::new(None, "http://127.0.0.1:9", "http://localhost");
        assert!(!client.is_configured());
        let request = ChatCompletionRequest::new(TEXT_MODEL, vec![Message::text("user", "hello")]);
        assert!(matches!(
            client.complete(&request).await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_title_strips_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": TITLE_MODEL, "max_tokens": 20 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("\"Weekend Trip Ideas\"")))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(Some("k".into()), server.uri(), "http://localhost");
        assert_eq!(
            client.generate_title("where should I go this weekend?").await.unwrap(),
            "Weekend Trip Ideas"
        );
    }
}

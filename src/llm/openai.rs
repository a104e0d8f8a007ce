//! Client for OpenAI-compatible `/chat/completions` endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::{CompletionProvider, CompletionRequest, LlmError};
use crate::config::LlmConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    /// Plain string, or an array of text/image parts for vision requests.
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    /// Creates a client from config.
    ///
    /// Returns an error if no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::NotConfigured)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body<'a>(&'a self, request: &CompletionRequest) -> ChatRequestBody<'a> {
        let user_content = match &request.image {
            Some(image) => json!([
                { "type": "text", "text": request.prompt },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]),
            None => Value::String(request.prompt.clone()),
        };

        ChatRequestBody {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Value::String(request.system.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: json!({ "type": "json_object" }),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);
        tracing::debug!(model = %self.model, image = request.image.is_some(), "Sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Completion API returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_content(&text)
    }
}

/// Pulls the first choice's message content out of a response body.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponseBody =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ImageInput;

    fn test_config() -> LlmConfig {
        LlmConfig {
            base_url: "https://llm.example.com/v1/".to_string(),
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let mut config = test_config();
        config.api_key = None;
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(LlmError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAiClient::from_config(&test_config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://llm.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_text_request_body() {
        let client = OpenAiClient::from_config(&test_config()).unwrap();
        let request = CompletionRequest::new("be brief", "hello").with_temperature(0.2);
        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_image_request_body() {
        let client = OpenAiClient::from_config(&test_config()).unwrap();
        let request = CompletionRequest::new("sys", "what is this?").with_image(ImageInput {
            mime_type: "image/png".to_string(),
            base64_data: "AAAA".to_string(),
        });
        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"ok\":true}"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn test_extract_content_empty_choices() {
        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(LlmError::EmptyResponse)
        ));
        assert!(matches!(
            extract_content("not json"),
            Err(LlmError::MalformedResponse(_))
        ));
    }
}

//! Completion API access for the AI-backed endpoints.
//!
//! The server talks to one OpenAI-compatible chat completions endpoint. Each
//! request is a single system + user message pair (optionally with an image)
//! and the model is asked to answer with a JSON object, which [`parse`]
//! turns into typed values. There is no retry, caching or streaming.

mod openai;
pub mod parse;
pub mod prompts;

pub use openai::OpenAiClient;
pub use parse::{Alternative, DetectedIngredient, GeneratedRecipe, Substitute};

use async_trait::async_trait;

/// Base64 image attached to a completion request.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub mime_type: String,
    pub base64_data: String,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub image: Option<ImageInput>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            image: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Errors from the completion API or from reading its answer.
#[derive(Debug)]
pub enum LlmError {
    /// No API key or base URL configured.
    NotConfigured,
    /// The HTTP request could not be sent or its body read.
    Request(String),
    /// The API answered with a non-success status.
    Api { status: u16, body: String },
    /// The API answered but with no message content.
    EmptyResponse,
    /// The content was not the JSON shape the prompt asked for.
    MalformedResponse(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::NotConfigured => {
                write!(f, "Completion API not configured. Set llm.api_key in config.")
            }
            LlmError::Request(e) => write!(f, "Completion request failed: {}", e),
            LlmError::Api { status, body } => {
                write!(f, "Completion API returned {}: {}", status, body)
            }
            LlmError::EmptyResponse => write!(f, "Completion API returned no content"),
            LlmError::MalformedResponse(e) => {
                write!(f, "Completion API returned malformed content: {}", e)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Something that can answer a [`CompletionRequest`] with text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractError;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ZHIPUAI_API_KEY";
/// Optional override of the chat completions base URL
pub const BASE_URL_ENV: &str = "ZHIPUAI_BASE_URL";
/// Optional override of the model name
pub const MODEL_ENV: &str = "ZHIPUAI_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_MODEL: &str = "glm-4-long";

/// Anything that can turn one chunk of narrative into a raw JSON-ish reply
#[async_trait]
pub trait DialogueExtractor: Send + Sync {
    /// Send the fixed instruction plus one chunk's text; return the raw reply
    async fn extract(&self, system: &str, chunk_text: &str) -> Result<String, ExtractError>;

    /// Model name, for logs and reports
    fn model(&self) -> &str;
}

/// Configuration for the chat completions client
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl ChatConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ExtractError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ExtractError::MissingApiKey {
            env_var: API_KEY_ENV.to_string(),
        })?;

        let mut config = Self::new(api_key, DEFAULT_MODEL.to_string());
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model = model;
        }
        Ok(config)
    }

    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            temperature: 0.7,
            top_p: 0.7,
            max_tokens: 2048,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI-compatible chat completions client
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn build_request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }

    /// Send a system + user message pair and return the first choice's text
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String, ExtractError> {
        let request = self.build_request(system, user);

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ExtractError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Request(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &response.usage {
            debug!(
                "Tokens: {} in, {} out",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractError::EmptyResponse)
    }
}

#[async_trait]
impl DialogueExtractor for ChatClient {
    async fn extract(&self, system: &str, chunk_text: &str) -> Result<String, ExtractError> {
        self.send_message(system, chunk_text).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

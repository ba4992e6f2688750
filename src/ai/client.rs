//! LLM chat client - sync HTTP via ureq, no async runtime needed

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::{AiError, AiResult};

// ============================================================================
// BACKEND
// ============================================================================

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiBackend {
    #[default]
    Anthropic,
    OpenAiCompatible,
}

impl AiBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            AiBackend::Anthropic => "ANTHROPIC_API_KEY",
            AiBackend::OpenAiCompatible => "OPENAI_API_KEY",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            AiBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            AiBackend::OpenAiCompatible => "https://api.openai.com/v1/chat/completions",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiBackend::Anthropic => "claude-sonnet-4-20250514",
            AiBackend::OpenAiCompatible => "gpt-4o-mini",
        }
    }

    /// Parse from config text ("anthropic", "openai")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Some(AiBackend::Anthropic),
            "openai" | "openai-compatible" => Some(AiBackend::OpenAiCompatible),
            _ => None,
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// CONFIG & CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: AiBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            backend: AiBackend::default(),
            model: None,
            max_tokens: 1024,
            temperature: 0.4,
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

pub struct AiClient {
    config: AiConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are handled below
        .timeout_global(Some(Duration::from_secs(120))) // LLM calls can be slow
        .build()
        .new_agent()
}

impl AiClient {
    pub fn new(config: AiConfig, api_key: impl Into<String>) -> Self {
        AiClient {
            config,
            api_key: api_key.into(),
            agent: make_agent(),
        }
    }

    /// Build a client from environment variables, honoring
    /// `FINORA_AI_MODEL` as a model override
    pub fn from_env(backend: AiBackend) -> AiResult<Self> {
        let env_key = backend.env_key();
        let api_key = env::var(env_key).map_err(|_| AiError::MissingApiKey {
            env_var: env_key.to_string(),
        })?;

        let config = AiConfig {
            backend,
            model: env::var("FINORA_AI_MODEL").ok(),
            ..Default::default()
        };
        Ok(Self::new(config, api_key))
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Generate one response for the conversation (sync)
    pub fn generate(&self, messages: &[Message], system: &str) -> AiResult<String> {
        match self.config.backend {
            AiBackend::Anthropic => self.generate_anthropic(messages, system),
            AiBackend::OpenAiCompatible => self.generate_openai(messages, system),
        }
    }

    fn generate_anthropic(&self, messages: &[Message], system: &str) -> AiResult<String> {
        let body = AnthropicRequest {
            model: self.config.model().to_string(),
            max_tokens: self.config.max_tokens,
            messages: messages.to_vec(),
            system: system.to_string(),
            temperature: self.config.temperature,
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .send_json(&body)
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::Api { status, message });
        }

        let parsed: AnthropicResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::Parse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| AiError::Parse("no text content in response".to_string()))
    }

    fn generate_openai(&self, messages: &[Message], system: &str) -> AiResult<String> {
        let mut chat: Vec<OpenAiMessage> = Vec::with_capacity(messages.len() + 1);
        chat.push(OpenAiMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
        chat.extend(messages.iter().map(|m| OpenAiMessage {
            role: match m.role {
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        }));

        let body = OpenAiRequest {
            model: self.config.model().to_string(),
            messages: chat,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::Api { status, message });
        }

        let parsed: OpenAiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("no response choices".to_string()))
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: String,
    temperature: f32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(AiBackend::parse("anthropic"), Some(AiBackend::Anthropic));
        assert_eq!(AiBackend::parse(" OpenAI "), Some(AiBackend::OpenAiCompatible));
        assert_eq!(AiBackend::parse("other"), None);
    }

    #[test]
    fn test_model_override() {
        let default = AiConfig::default();
        assert_eq!(default.model(), AiBackend::Anthropic.default_model());

        let custom = AiConfig {
            model: Some("my-model".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.model(), "my-model");
    }

    #[test]
    fn test_anthropic_request_serializes_roles_lowercase() {
        let body = AnthropicRequest {
            model: "m".to_string(),
            max_tokens: 10,
            messages: vec![Message::user("hi"), Message::assistant("hello")],
            system: "sys".to_string(),
            temperature: 0.4,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"role\":\"assistant\""));
    }

    #[test]
    fn test_anthropic_response_extracts_text_block() {
        let raw = r#"{"content":[{"type":"thinking"},{"type":"text","text":"answer"}]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text);
        assert_eq!(text.as_deref(), Some("answer"));
    }
}

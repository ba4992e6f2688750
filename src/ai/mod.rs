//! AI-generated financial summaries and follow-up chat
//!
//! Proxies a hosted LLM chat API. BYOK (bring your own key) model - API keys
//! come from environment variables, requests go out over sync HTTP, and the
//! response text is passed through to the caller verbatim. Money fields in
//! incoming payloads are parsed leniently (see `crate::money`) so the web
//! client can send whatever its inputs hold.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: required for the Anthropic backend
//! - `OPENAI_API_KEY`: required for the OpenAI-compatible backend
//! - `FINORA_AI_MODEL`: optional model override

mod client;
mod prompt;

pub use client::{AiBackend, AiClient, AiConfig, Message, Role};
pub use prompt::{
    build_followup_messages, build_summary_messages, FollowupRequest, GoalFigures,
    SnapshotPayload, SummaryRequest, SUMMARY_SYSTEM_PROMPT,
};

use thiserror::Error;

/// Errors surfaced by the AI proxy
#[derive(Error, Debug)]
pub enum AiError {
    #[error("missing API key: {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("AI API request failed: {0}")]
    Transport(String),

    #[error("AI API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse AI API response: {0}")]
    Parse(String),

    #[error("invalid request payload: {0}")]
    Payload(String),
}

pub type AiResult<T> = Result<T, AiError>;

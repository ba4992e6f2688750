// ⚙️ Configuration - everything comes from the environment
//
// Required:
//   FINORA_STORE_URL        base URL of the hosted table API project
//   FINORA_STORE_ANON_KEY   the project's anon/publishable key
//
// Optional:
//   FINORA_BIND_ADDR        server bind address   (default 0.0.0.0:3000)
//   FINORA_AI_BACKEND       "anthropic" | "openai" (default anthropic)
//   FINORA_AI_DAILY_LIMIT   AI requests per caller per UTC day (default 20)
//
// The AI provider key itself (ANTHROPIC_API_KEY / OPENAI_API_KEY) is read by
// the AI client when it is constructed.

use std::env;

use anyhow::{Context, Result};

use crate::ai::AiBackend;

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub store_anon_key: String,
    pub bind_addr: String,
    pub ai_backend: AiBackend,
    pub ai_daily_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_url = env::var("FINORA_STORE_URL")
            .context("FINORA_STORE_URL is not set (hosted table API base URL)")?;
        let store_anon_key = env::var("FINORA_STORE_ANON_KEY")
            .context("FINORA_STORE_ANON_KEY is not set (table API anon key)")?;

        let bind_addr = env::var("FINORA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let ai_backend = match env::var("FINORA_AI_BACKEND") {
            Ok(raw) => AiBackend::parse(&raw)
                .with_context(|| format!("FINORA_AI_BACKEND not recognized: {:?}", raw))?,
            Err(_) => AiBackend::default(),
        };

        let ai_daily_limit = match env::var("FINORA_AI_DAILY_LIMIT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("FINORA_AI_DAILY_LIMIT is not a number: {:?}", raw))?,
            Err(_) => 20,
        };

        Ok(Config {
            store_url,
            store_anon_key,
            bind_addr,
            ai_backend,
            ai_daily_limit,
        })
    }
}

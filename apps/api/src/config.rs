use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::interview::models::QuestionCap;
use crate::llm_client::RetryPolicy;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub port: u16,
    pub rust_log: String,
    pub interview: InterviewSettings,
    pub retry: RetryPolicy,
    /// Sessions untouched for this long are evicted.
    pub session_ttl: Duration,
}

/// Per-session interview knobs, copied into every new controller.
#[derive(Debug, Clone)]
pub struct InterviewSettings {
    pub max_questions: u32,
    pub question_cap: QuestionCap,
    /// Language the backend must use for questions, options and recommendations.
    pub language: String,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            max_questions: 5,
            question_cap: QuestionCap::Enforce,
            language: "Turkish".to_string(),
        }
    }
}

impl Config {
    /// How often idle sessions are swept: a tenth of the TTL, at most once a minute.
    pub fn session_sweep_interval(&self) -> Duration {
        (self.session_ttl / 10).clamp(Duration::from_secs(1), Duration::from_secs(60))
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = InterviewSettings::default();
        let max_questions: u32 = optional_env("MAX_QUESTIONS", defaults.max_questions)?;
        if max_questions == 0 {
            bail!("MAX_QUESTIONS must be at least 1");
        }

        let retries: u32 = optional_env("GENERATION_RETRIES", RetryPolicy::default().retries)?;
        let base_delay_ms: u64 = optional_env("GENERATION_BASE_DELAY_MS", 1000)?;
        let session_ttl_secs: u64 = optional_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs == 0 {
            bail!("SESSION_TTL_SECS must be at least 1");
        }

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_endpoint: std::env::var("GEMINI_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_GEMINI_ENDPOINT.to_string()),
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            interview: InterviewSettings {
                max_questions,
                question_cap: optional_env("QUESTION_CAP", defaults.question_cap)?,
                language: std::env::var("INTERVIEW_LANGUAGE").unwrap_or(defaults.language),
            },
            retry: RetryPolicy {
                retries,
                base_delay: Duration::from_millis(base_delay_ms),
            },
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

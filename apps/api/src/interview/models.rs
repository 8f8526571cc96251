use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::retail::RetailLink;

/// Who authored a transcript turn. Serialized with Gemini's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Model,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Model => "model",
            Role::User => "user",
        }
    }
}

/// One entry of the interview transcript. Never edited after it is appended.
///
/// Model turns keep the options that were offered with the question so the
/// step can be replayed to the backend in its original shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ConversationTurn {
    pub fn model(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            options,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            options: Vec::new(),
        }
    }
}

/// What the generation backend returns for every turn.
///
/// `question`, `options` and `isFinal` are required on the wire;
/// `recommendations` only matters when `isFinal` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStep {
    pub question: String,
    pub options: Vec<String>,
    pub is_final: bool,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl InterviewStep {
    /// Rejects steps that parse but cannot be rendered.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_final && self.question.trim().is_empty() {
            return Err("non-final step carries no question".to_string());
        }
        Ok(())
    }
}

/// Controller phases. `Results` is terminal until `reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
    Question,
    Results,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingResponse => "awaiting_response",
            Phase::Question => "question",
            Phase::Results => "results",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

/// How the controller treats the question budget.
///
/// `Enforce` marks requests past the budget as final-only and refuses further
/// questions; `Trust` leaves termination entirely to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCap {
    Enforce,
    Trust,
}

#[derive(Debug, Error)]
#[error("unknown question cap '{0}', expected 'enforce' or 'trust'")]
pub struct ParseQuestionCapError(String);

impl FromStr for QuestionCap {
    type Err = ParseQuestionCapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enforce" => Ok(QuestionCap::Enforce),
            "trust" => Ok(QuestionCap::Trust),
            other => Err(ParseQuestionCapError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    Generic,
}

/// A terminal request failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl InterviewFailure {
    pub fn from_llm(err: &LlmError) -> Self {
        if err.is_rate_limited() {
            Self::rate_limited()
        } else {
            Self::generic()
        }
    }

    pub fn rate_limited() -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: "Too many requests right now. Please wait a moment and try again."
                .to_string(),
        }
    }

    pub fn generic() -> Self {
        Self {
            kind: FailureKind::Generic,
            message: "Something went wrong while preparing the next question. Please try again."
                .to_string(),
        }
    }
}

/// Everything the backend needs to produce the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRequest {
    /// Empty for the bootstrap request.
    pub turns: Vec<ConversationTurn>,
    /// Questions received so far.
    pub question_index: u32,
    pub max_questions: u32,
    /// Set once the budget is spent under `QuestionCap::Enforce`.
    pub final_only: bool,
    pub language: String,
}

/// Read-only view of one interview, returned by the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSnapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    pub question_index: u32,
    pub max_questions: u32,
    pub question: Option<String>,
    pub options: Vec<String>,
    pub is_final: bool,
    pub recommendations: Vec<RetailLink>,
    pub error: Option<InterviewFailure>,
    pub transcript: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! The seam between the controller and the generation service.
//!
//! `SessionStore` holds an `Arc<dyn InterviewBackend>`; production wires in
//! `GeminiClient`, tests wire in scripted doubles.

use async_trait::async_trait;
use tracing::debug;

use crate::interview::models::{ConversationTurn, InterviewStep, Role, StepRequest};
use crate::interview::prompts::{build_system_instruction, response_schema, BOOTSTRAP_PROMPT};
use crate::llm_client::{GeminiClient, LlmError, Message};

#[async_trait]
pub trait InterviewBackend: Send + Sync {
    /// Produces the next interview step for the given transcript.
    async fn next_step(&self, request: &StepRequest) -> Result<InterviewStep, LlmError>;
}

#[async_trait]
impl InterviewBackend for GeminiClient {
    async fn next_step(&self, request: &StepRequest) -> Result<InterviewStep, LlmError> {
        let system = build_system_instruction(request);
        let contents = conversation_contents(request);
        let messages: Vec<Message<'_>> = contents
            .iter()
            .map(|(role, text)| Message { role, text })
            .collect();

        debug!(
            "Requesting step {} of {} ({} turns, final_only={})",
            request.question_index + 1,
            request.max_questions,
            request.turns.len(),
            request.final_only
        );

        let step: InterviewStep = self
            .call_json(&system, &messages, &response_schema())
            .await?;
        step.validate().map_err(LlmError::Schema)?;
        Ok(step)
    }
}

/// Bootstrap instruction first, then the transcript in order.
fn conversation_contents(request: &StepRequest) -> Vec<(&'static str, String)> {
    std::iter::once(("user", BOOTSTRAP_PROMPT.to_string()))
        .chain(
            request
                .turns
                .iter()
                .map(|turn| (turn.role.as_str(), render_turn(turn))),
        )
        .collect()
}

/// Model turns go back as the JSON step the model produced, so the history
/// never shows it answering outside its own format.
fn render_turn(turn: &ConversationTurn) -> String {
    match turn.role {
        Role::Model => serde_json::to_string(&InterviewStep {
            question: turn.text.clone(),
            options: turn.options.clone(),
            is_final: false,
            recommendations: Vec::new(),
        })
        .unwrap_or_else(|_| turn.text.clone()),
        Role::User => turn.text.clone(),
    }
}

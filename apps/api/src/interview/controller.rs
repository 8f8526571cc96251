//! Interview Controller — owns one session's state and drives the
//! request/response cycle against an `InterviewBackend`.
//!
//! Phases: idle → awaiting_response → (question | results | error).
//! At most one request is in flight; the state lock is never held across the
//! backend call. The call and the state update run in their own task, so a
//! caller that goes away mid-request cannot leave the session stuck in
//! `awaiting_response`. Every request carries the session generation it was
//! issued under, and `reset` bumps the generation so late responses are
//! discarded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::InterviewSettings;
use crate::interview::backend::InterviewBackend;
use crate::interview::models::{
    ConversationTurn, InterviewFailure, InterviewSnapshot, InterviewStep, Phase, QuestionCap,
    StepRequest,
};
use crate::llm_client::LlmError;
use crate::retail::links_for;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("A request is already in flight for this interview")]
    Busy,

    #[error("Cannot {operation} while the interview is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },
}

/// What happened to an operation's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The response was applied; the controller is now in this phase.
    Applied(Phase),
    /// Input was blank; nothing changed.
    Ignored,
    /// The session was reset while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone, Default)]
struct InterviewState {
    phase: Phase,
    turns: Vec<ConversationTurn>,
    question_index: u32,
    current_question: Option<String>,
    current_options: Vec<String>,
    is_final: bool,
    recommendations: Vec<String>,
    error: Option<InterviewFailure>,
    /// Request to replay on `retry_last`; cleared once a response is applied.
    pending: Option<StepRequest>,
    generation: u64,
    updated_at: Option<DateTime<Utc>>,
    /// Monotonic time of the last state change, used for idle eviction.
    touched: Option<Instant>,
}

pub struct InterviewController {
    id: Uuid,
    created_at: DateTime<Utc>,
    created: Instant,
    settings: InterviewSettings,
    backend: Arc<dyn InterviewBackend>,
    state: Arc<Mutex<InterviewState>>,
}

impl InterviewController {
    pub fn new(backend: Arc<dyn InterviewBackend>, settings: InterviewSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            created: Instant::now(),
            settings,
            backend,
            state: Arc::new(Mutex::new(InterviewState::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Issues the bootstrap request. Only valid from `idle`.
    pub async fn start(&self) -> Result<Transition, ControllerError> {
        let (generation, request) = {
            let mut state = self.state.lock().await;
            ensure_phase(&state, "start", Phase::Idle)?;
            state.turns.clear();
            state.question_index = 0;
            let request = self.next_request(&state);
            (generation_for(&mut state, &request), request)
        };

        info!("Interview {} started", self.id);
        Ok(self.dispatch(generation, request).await)
    }

    /// Records the answer to the current question and asks for the next step.
    /// Blank answers are ignored.
    pub async fn submit_answer(&self, answer: &str) -> Result<Transition, ControllerError> {
        let answer = answer.trim();
        if answer.is_empty() {
            debug!("Interview {}: ignoring blank answer", self.id);
            return Ok(Transition::Ignored);
        }

        let (generation, request) = {
            let mut state = self.state.lock().await;
            ensure_phase(&state, "submit an answer", Phase::Question)?;

            let question = state.current_question.clone().unwrap_or_default();
            let options = state.current_options.clone();
            state.turns.push(ConversationTurn::model(question, options));
            state.turns.push(ConversationTurn::user(answer));

            let request = self.next_request(&state);
            (generation_for(&mut state, &request), request)
        };

        Ok(self.dispatch(generation, request).await)
    }

    /// Replays the request that failed, leaving the transcript untouched.
    pub async fn retry_last(&self) -> Result<Transition, ControllerError> {
        let (generation, request) = {
            let mut state = self.state.lock().await;
            ensure_phase(&state, "retry", Phase::Error)?;
            let request = match state.pending.clone() {
                Some(request) => request,
                None => {
                    return Err(ControllerError::InvalidPhase {
                        operation: "retry",
                        phase: state.phase,
                    })
                }
            };
            (generation_for(&mut state, &request), request)
        };

        info!("Interview {}: retrying last request", self.id);
        Ok(self.dispatch(generation, request).await)
    }

    /// Drops all state. Any response still in flight will be discarded.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = InterviewState {
            generation,
            ..InterviewState::default()
        };
        touch(&mut state);
        info!("Interview {} reset (generation {})", self.id, generation);
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Time since the last state change (or creation).
    pub async fn idle_for(&self) -> Duration {
        let state = self.state.lock().await;
        state.touched.unwrap_or(self.created).elapsed()
    }

    pub async fn snapshot(&self) -> InterviewSnapshot {
        let state = self.state.lock().await;
        InterviewSnapshot {
            session_id: self.id,
            phase: state.phase,
            question_index: state.question_index,
            max_questions: self.settings.max_questions,
            question: state.current_question.clone(),
            options: state.current_options.clone(),
            is_final: state.is_final,
            recommendations: links_for(&state.recommendations),
            error: state.error.clone(),
            transcript: state.turns.clone(),
            created_at: self.created_at,
            updated_at: state.updated_at.unwrap_or(self.created_at),
        }
    }

    fn next_request(&self, state: &InterviewState) -> StepRequest {
        let final_only = self.settings.question_cap == QuestionCap::Enforce
            && state.question_index >= self.settings.max_questions;
        StepRequest {
            turns: state.turns.clone(),
            question_index: state.question_index,
            max_questions: self.settings.max_questions,
            final_only,
            language: self.settings.language.clone(),
        }
    }

    async fn dispatch(&self, generation: u64, request: StepRequest) -> Transition {
        let id = self.id;
        let max_questions = self.settings.max_questions;
        let backend = self.backend.clone();
        let shared = self.state.clone();

        let task = tokio::spawn(async move {
            let result = backend.next_step(&request).await;

            let mut state = shared.lock().await;
            if state.generation != generation {
                debug!(
                    "Interview {}: discarding response for generation {} (now {})",
                    id, generation, state.generation
                );
                return Transition::Discarded;
            }

            apply(&mut state, id, max_questions, &request, result);
            Transition::Applied(state.phase)
        });

        match task.await {
            Ok(transition) => transition,
            Err(e) => {
                warn!("Interview {}: request task failed: {}", id, e);
                let mut state = self.state.lock().await;
                if state.generation != generation || state.phase != Phase::AwaitingResponse {
                    return Transition::Discarded;
                }
                fail(&mut state, InterviewFailure::generic());
                Transition::Applied(state.phase)
            }
        }
    }
}

fn apply(
    state: &mut InterviewState,
    id: Uuid,
    max_questions: u32,
    request: &StepRequest,
    result: Result<InterviewStep, LlmError>,
) {
    touch(state);

    let step = match result {
        Ok(step) => step,
        Err(e) => {
            warn!("Interview {}: request failed: {}", id, e);
            fail(state, InterviewFailure::from_llm(&e));
            return;
        }
    };

    if step.is_final {
        if step.recommendations.is_empty() {
            warn!("Interview {}: final step arrived without recommendations", id);
        }
        state.phase = Phase::Results;
        state.is_final = true;
        state.current_question = None;
        state.current_options.clear();
        state.recommendations = step.recommendations;
        state.error = None;
        state.pending = None;
        info!(
            "Interview {} finished after {} questions with {} recommendations",
            id,
            state.question_index,
            state.recommendations.len()
        );
        return;
    }

    if request.final_only {
        warn!(
            "Interview {}: backend asked question {} past the budget of {}",
            id,
            state.question_index + 1,
            max_questions
        );
        fail(state, InterviewFailure::generic());
        return;
    }

    state.question_index += 1;
    if state.question_index > max_questions {
        warn!(
            "Interview {}: question {} exceeds the budget of {}",
            id, state.question_index, max_questions
        );
    }
    state.phase = Phase::Question;
    state.is_final = false;
    state.current_question = Some(step.question);
    state.current_options = step.options;
    state.error = None;
    state.pending = None;
}

fn ensure_phase(
    state: &InterviewState,
    operation: &'static str,
    expected: Phase,
) -> Result<(), ControllerError> {
    match state.phase {
        Phase::AwaitingResponse => Err(ControllerError::Busy),
        phase if phase == expected => Ok(()),
        phase => Err(ControllerError::InvalidPhase { operation, phase }),
    }
}

/// Marks the state as waiting on `request` and returns the generation tag.
fn generation_for(state: &mut InterviewState, request: &StepRequest) -> u64 {
    state.phase = Phase::AwaitingResponse;
    state.error = None;
    state.pending = Some(request.clone());
    touch(state);
    state.generation
}

fn touch(state: &mut InterviewState) {
    state.updated_at = Some(Utc::now());
    state.touched = Some(Instant::now());
}

fn fail(state: &mut InterviewState, failure: InterviewFailure) {
    state.phase = Phase::Error;
    state.error = Some(failure);
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/interviews", post(handlers::handle_create_interview))
        .route(
            "/api/v1/interviews/:id",
            get(handlers::handle_get_interview).delete(handlers::handle_delete_interview),
        )
        .route("/api/v1/interviews/:id/start", post(handlers::handle_start))
        .route(
            "/api/v1/interviews/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route("/api/v1/interviews/:id/retry", post(handlers::handle_retry))
        .route("/api/v1/interviews/:id/reset", post(handlers::handle_reset))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{Config, InterviewSettings};
    use crate::interview::backend::InterviewBackend;
    use crate::interview::models::{InterviewStep, StepRequest};
    use crate::interview::sessions::SessionStore;
    use crate::llm_client::{LlmError, RetryPolicy};

    struct ScriptedBackend(Mutex<VecDeque<Result<InterviewStep, LlmError>>>);

    #[async_trait]
    impl InterviewBackend for ScriptedBackend {
        async fn next_step(&self, _request: &StepRequest) -> Result<InterviewStep, LlmError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn app(replies: Vec<Result<InterviewStep, LlmError>>) -> Router {
        let settings = InterviewSettings {
            language: "English".to_string(),
            ..InterviewSettings::default()
        };
        let config = Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-test".to_string(),
            gemini_endpoint: "http://localhost".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            interview: settings.clone(),
            retry: RetryPolicy::default(),
            session_ttl: Duration::from_secs(1800),
        };
        let backend = Arc::new(ScriptedBackend(Mutex::new(replies.into())));
        build_router(AppState {
            sessions: SessionStore::new(backend, settings, config.session_ttl),
            config,
        })
    }

    fn first_question() -> Result<InterviewStep, LlmError> {
        Ok(InterviewStep {
            question: "Who are you buying this gift for?".to_string(),
            options: vec!["Friend".to_string(), "Parent".to_string()],
            is_final: false,
            recommendations: vec![],
        })
    }

    fn final_step() -> Result<InterviewStep, LlmError> {
        Ok(InterviewStep {
            question: String::new(),
            options: vec![],
            is_final: true,
            recommendations: vec!["Kablosuz Kulaklık".to_string()],
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_full_interview_over_http() {
        let app = app(vec![first_question(), final_step()]);

        let (status, created) = send(&app, Method::POST, "/api/v1/interviews", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["phase"], "question");
        assert_eq!(created["question_index"], 1);
        assert_eq!(created["options"], json!(["Friend", "Parent"]));
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, blank) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({"answer": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(blank["phase"], "question");
        assert_eq!(blank["transcript"], json!([]));

        let (status, done) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({"answer": "Friend"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["phase"], "results");
        assert_eq!(done["options"], json!([]));
        assert_eq!(done["transcript"].as_array().unwrap().len(), 2);
        assert_eq!(done["recommendations"][0]["name"], "Kablosuz Kulaklık");
        assert_eq!(done["recommendations"][0]["retailer"], "amazon_tr");

        let (status, conflict) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({"answer": "again"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(conflict["error"]["code"], "INVALID_PHASE");

        let (status, reset) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/reset"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reset["phase"], "idle");
        assert_eq!(reset["transcript"], json!([]));

        let uri = format!("/api/v1/interviews/{id}");
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, missing) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_failed_start_is_retryable_over_http() {
        let app = app(vec![Err(LlmError::RateLimited { retries: 3 }), first_question()]);

        let (status, created) = send(&app, Method::POST, "/api/v1/interviews", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["phase"], "error");
        assert_eq!(created["error"]["kind"], "rate_limited");
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, retried) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/retry"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(retried["phase"], "question");
        assert_eq!(retried["error"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app(vec![]);
        let uri = format!("/api/v1/interviews/{}/answers", Uuid::new_v4());
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({"answer": "Friend"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_answer_is_rejected() {
        let app = app(vec![first_question()]);
        let (_, created) = send(&app, Method::POST, "/api/v1/interviews", None).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/interviews/{id}/answers"),
            Some(json!({"answer": "x".repeat(501)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let app = app(vec![]);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "gemini-test");
        assert_eq!(body["live_sessions"], 0);
    }
}

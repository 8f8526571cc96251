// Gift interview: a bounded question/answer loop driven by the generation
// backend. All LLM calls go through llm_client via the InterviewBackend seam.

pub mod backend;
pub mod controller;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod sessions;

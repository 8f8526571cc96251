// Prompt constants for the gift interview.
// Reuses the JSON-only fragment from llm_client::prompts.

use serde_json::{json, Value};

use crate::interview::models::StepRequest;
use crate::llm_client::prompts::with_json_rules;

/// First user message of every conversation. Follow-up requests append the
/// transcript after it.
pub const BOOTSTRAP_PROMPT: &str =
    "Start the gift interview now. Ask your first question to learn who the gift is for.";

/// System prompt template. Replace `{max_questions}`, `{asked}`,
/// `{next_question}` and `{language}` before sending.
pub const INTERVIEW_SYSTEM_TEMPLATE: &str = r#"You are a warm, efficient gift advisor.
Interview the user with short multiple-choice questions to find the right gift.

Rules:
- Ask at most {max_questions} questions in total. Questions asked so far: {asked}. The next one would be number {next_question}.
- Ask exactly ONE question per turn and offer 2 to 5 short answer options.
- Never repeat a question that already appears in the conversation.
- Set "isFinal" to true as soon as you have enough information, or once {max_questions} questions have been asked.
- When "isFinal" is true: set "question" to an empty string, return "options" as an empty array,
  and return 3 to 6 concrete, searchable product names in "recommendations".
- When "isFinal" is false: "recommendations" must be an empty array.
- Write every question, option and recommendation in {language}.

Return a JSON object with this EXACT schema:
{"question": "...", "options": ["..."], "isFinal": false, "recommendations": []}"#;

/// Appended once the question budget is spent under an enforced cap.
pub const FINAL_ONLY_INSTRUCTION: &str = "The question budget is exhausted. \
    Do NOT ask another question. You MUST set \"isFinal\" to true now \
    and return your recommendations.";

/// Builds the system instruction for one request.
pub fn build_system_instruction(request: &StepRequest) -> String {
    let mut system = INTERVIEW_SYSTEM_TEMPLATE
        .replace("{max_questions}", &request.max_questions.to_string())
        .replace("{asked}", &request.question_index.to_string())
        .replace("{next_question}", &(request.question_index + 1).to_string())
        .replace("{language}", &request.language);

    if request.final_only {
        system.push_str("\n\n");
        system.push_str(FINAL_ONLY_INSTRUCTION);
    }

    with_json_rules(&system)
}

/// Gemini `responseSchema` mirroring `InterviewStep`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": {"type": "STRING"},
            "options": {"type": "ARRAY", "items": {"type": "STRING"}},
            "isFinal": {"type": "BOOLEAN"},
            "recommendations": {"type": "ARRAY", "items": {"type": "STRING"}}
        },
        "required": ["question", "options", "isFinal"],
        "propertyOrdering": ["question", "options", "isFinal", "recommendations"]
    })
}

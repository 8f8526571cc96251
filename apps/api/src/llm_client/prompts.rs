// Shared prompt fragments. Each feature keeps its own prompts.rs alongside it;
// this file only carries what every structured-output call needs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appends the JSON-only rules to a feature-specific system prompt.
pub fn with_json_rules(system: &str) -> String {
    format!("{}\n\n{}", system.trim_end(), JSON_ONLY_SYSTEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_json_rules_appends_fragment() {
        let system = with_json_rules("You are a gift advisor.\n");
        assert!(system.starts_with("You are a gift advisor."));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}

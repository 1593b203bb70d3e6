// Marketing plan prompts.
// MARKETING_PLAN_SYSTEM is prepended to llm_client::prompts::JSON_ONLY_INSTRUCTION
// at call time, so the persona text stays readable here.

pub const MARKETING_PLAN_SYSTEM: &str = "\
You are a financial marketing expert. Generate marketing plans based on user profiles \
and product information.

Return a JSON object with exactly these keys:
- \"bestProducts\": array of product names to recommend, best fit first
- \"marketingTechnique\": one paragraph describing the persuasion technique to use
- \"conversationStarter\": a single opening line addressed to the user
- \"conversationSequence\": array of follow-up talking points, in order";

/// Marketing prompt text a user starts with.
pub const DEFAULT_MARKETING_PROMPT: &str = "\
Generate a marketing plan for a financial product that would appeal to the user based on \
their profile. Include the best products to recommend, marketing technique to use, a \
conversation starter, and a sequence of talking points.";

pub fn marketing_plan_system_prompt() -> String {
    format!(
        "{MARKETING_PLAN_SYSTEM}\n\n{}",
        crate::llm_client::prompts::JSON_ONLY_INSTRUCTION
    )
}

/// User message: the operator's prompt text followed by the grounding context.
pub fn marketing_plan_user_prompt(prompt_text: &str, context: &str) -> String {
    format!("{prompt_text}\n\n{context}")
}

// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains the pieces more than one service stitches in.

/// Appended to system prompts whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Heading placed above the formatted user profile.
pub const PROFILE_HEADING: &str = "User Profile:";

/// Heading placed above the formatted knowledge base.
pub const KNOWLEDGE_BASE_HEADING: &str = "Knowledge Base Context:";

/// Joins the profile and knowledge base blocks under their headings.
pub fn context_block(profile_block: &str, knowledge_block: &str) -> String {
    format!("{PROFILE_HEADING}\n{profile_block}\n\n{KNOWLEDGE_BASE_HEADING}\n{knowledge_block}")
}

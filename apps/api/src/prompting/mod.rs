pub mod final_prompt;
pub mod formatter;
pub mod handlers;
pub mod prompts;

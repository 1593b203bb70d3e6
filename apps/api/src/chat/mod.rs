pub mod handlers;
pub mod orchestrator;

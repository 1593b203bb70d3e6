use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::llm_client::prompts::context_block;
use crate::llm_client::{CompletionRequest, LlmError, Message};
use crate::models::chat::{ChatMessage, ChatRole};
use crate::models::knowledge::KnowledgeBase;
use crate::models::profile::UserProfile;
use crate::prompting::formatter::{format_knowledge_base, format_profile};

pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 800;

/// In-memory chat log for one operator. Messages are append-only until cleared.
#[derive(Debug, Default)]
pub struct ChatOrchestrator {
    messages: Vec<ChatMessage>,
    in_flight: Arc<AtomicUsize>,
    /// Bumped by `clear_messages` so replies to earlier turns are not logged.
    generation: u64,
}

/// A turn whose user message is logged and whose completion is outstanding.
///
/// Counts as in flight until dropped, so a cancelled turn never leaves the
/// session busy.
pub struct PendingTurn {
    pub request: CompletionRequest,
    generation: u64,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChatOrchestrator {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Advisory only: true while any turn awaits its completion.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.generation += 1;
    }

    /// Logs the user message and builds the completion request. The caller
    /// awaits the completion without holding the orchestrator, then hands the
    /// outcome to `finish_turn`.
    pub fn begin_turn(
        &mut self,
        final_prompt: &str,
        profile: &UserProfile,
        knowledge_base: &KnowledgeBase,
        text: &str,
    ) -> PendingTurn {
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        PendingTurn {
            request: CompletionRequest {
                messages: vec![
                    Message::system(final_prompt),
                    Message::system(context_block(
                        &format_profile(profile),
                        &format_knowledge_base(knowledge_base),
                    )),
                    Message::user(text),
                ],
                temperature: CHAT_TEMPERATURE,
                max_tokens: CHAT_MAX_TOKENS,
            },
            generation: self.generation,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Appends the reply, or the fixed apology on failure, and returns it.
    /// A reply to a turn from before the last clear is returned but not logged.
    pub fn finish_turn(
        &mut self,
        turn: PendingTurn,
        outcome: Result<String, LlmError>,
    ) -> ChatMessage {
        let reply = match outcome {
            Ok(reply) => {
                debug!("Chat reply received ({} chars)", reply.len());
                reply
            }
            Err(e) => {
                error!("Chat completion failed: {e}");
                APOLOGY.to_string()
            }
        };

        let message = ChatMessage::new(ChatRole::Assistant, reply);
        if turn.generation == self.generation {
            self.messages.push(message.clone());
        } else {
            info!("Dropping reply to a turn sent before the chat was cleared");
        }
        message
    }

    /// Runs one turn end to end while holding the orchestrator. The HTTP
    /// handler drives `begin_turn` and `finish_turn` itself so it can unlock
    /// the session during the call.
    #[cfg(test)]
    pub async fn send_message(
        &mut self,
        completion: &dyn crate::llm_client::CompletionService,
        final_prompt: &str,
        profile: &UserProfile,
        knowledge_base: &KnowledgeBase,
        text: &str,
    ) -> ChatMessage {
        let turn = self.begin_turn(final_prompt, profile, knowledge_base, text);
        let outcome = completion.complete(&turn.request).await;
        self.finish_turn(turn, outcome)
    }
}

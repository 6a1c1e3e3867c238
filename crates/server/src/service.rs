//! Chat service: glues the turn orchestrator to the rolling history log.
//!
//! Each request runs as one isolated turn. Cross-request memory is limited
//! to the capped history log, folded into the turn as a plain-text context
//! block. History failures degrade to a context-free turn; they never fail
//! the request.

use std::sync::Arc;

use swapdesk_agent::runtime::TurnOrchestrator;
use swapdesk_core::chat::HistoryEntry;
use swapdesk_store::history::HistoryLog;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct ChatReply {
    pub reply: String,
    pub tool_iterations: u32,
    pub turn_retries: u32,
}

pub struct ChatService {
    orchestrator: TurnOrchestrator,
    history: Arc<dyn HistoryLog>,
    context_window: usize,
}

impl ChatService {
    pub fn new(
        orchestrator: TurnOrchestrator,
        history: Arc<dyn HistoryLog>,
        context_window: usize,
    ) -> Self {
        Self { orchestrator, history, context_window }
    }

    /// Runs one turn for `message` and records the exchange.
    pub async fn handle(&self, message: &str) -> ChatReply {
        let context = self.conversational_context().await;
        let outcome = self.orchestrator.run_turn(message, context).await;

        if let Err(error) = self.history.append(HistoryEntry::now(message, &outcome.reply)).await {
            warn!(
                event_name = "chat.history.append_failed",
                error = %error,
                "exchange was not recorded"
            );
        }

        ChatReply {
            reply: outcome.reply,
            tool_iterations: outcome.tool_iterations,
            turn_retries: outcome.turn_retries,
        }
    }

    async fn conversational_context(&self) -> Option<String> {
        let entries = match self.history.recent(self.context_window).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    event_name = "chat.history.read_failed",
                    error = %error,
                    "running the turn without conversational context"
                );
                return None;
            }
        };

        if entries.is_empty() {
            return None;
        }

        let lines: Vec<String> = entries
            .iter()
            .map(|entry| format!("User: {}\nAssistant: {}", entry.user, entry.bot))
            .collect();
        Some(lines.join("\n"))
    }
}

//! The turn orchestrator: a bounded state machine sequencing validation,
//! generation, tool execution, adequacy checking, and retries for one user
//! turn.
//!
//! Exactly one of {validation rejection, tool-cap exhaustion, adequacy
//! satisfaction, retry-cap exhaustion} terminates a turn, and the reply is
//! never empty: output assembly falls back from the last assistant entry to
//! a framed tool result to a generic apology.

use std::sync::Arc;

use swapdesk_core::chat::{ChatEntry, TurnState};
use swapdesk_core::config::AgentConfig;
use tracing::{info, warn};

use crate::auditor::ResponseAuditor;
use crate::oracle::{CompletionOracle, OracleRequest};
use crate::prompts::{
    self, EMPTY_ANSWER_REPLY, INVALID_QUERY_REPLY, MAX_RETRIES_REPLY, ORACLE_FAILURE_REPLY,
    TOOL_RESULT_FRAMING,
};
use crate::tools::ToolRegistry;
use crate::validator::{is_reply_safe, QueryValidator};

/// Most characters of a raw tool result promoted into a final reply.
const FRAMED_RESULT_LIMIT: usize = 400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    Judge,
    Process,
    Tools,
    CheckAnswer,
    Retry,
    Invalid,
    MaxRetries,
    End,
}

/// Final reply plus the audit trail a caller needs to see which tools fired
/// and how the turn terminated.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub reply: String,
    pub conversation: Vec<ChatEntry>,
    pub phases: Vec<TurnPhase>,
    pub tool_iterations: u32,
    pub turn_retries: u32,
}

pub struct TurnOrchestrator {
    oracle: Arc<dyn CompletionOracle>,
    registry: ToolRegistry,
    validator: QueryValidator,
    auditor: ResponseAuditor,
    config: AgentConfig,
}

impl TurnOrchestrator {
    pub fn new(
        oracle: Arc<dyn CompletionOracle>,
        registry: ToolRegistry,
        config: AgentConfig,
    ) -> Self {
        let validator = QueryValidator::new(Arc::clone(&oracle), config.validator_failure_policy);
        let auditor = ResponseAuditor::new(Arc::clone(&oracle), config.min_answer_len);
        Self { oracle, registry, validator, auditor, config }
    }

    /// Runs one user turn to completion within the configured budgets.
    pub async fn run_turn(&self, query: &str, context: Option<String>) -> TurnOutcome {
        let mut state = TurnState::new(query, context);
        let mut phase = TurnPhase::Judge;
        let mut phases = Vec::new();

        info!(event_name = "turn.start", query_len = query.len(), "turn started");

        loop {
            phases.push(phase);

            match phase {
                TurnPhase::Judge => {
                    let accepted = self
                        .validator
                        .validate(&state.original_query, state.conversational_context.as_deref())
                        .await;
                    state = state.with_validity(accepted);
                    info!(event_name = "turn.judge.decided", accepted, "query validated");
                    phase = if accepted { TurnPhase::Process } else { TurnPhase::Invalid };
                }
                TurnPhase::Process => {
                    state = self.process(state).await;
                    phase = route_after_process(&state, self.config.tool_iteration_cap);
                }
                TurnPhase::Tools => {
                    state = self.run_tools(state).await;
                    phase = TurnPhase::Process;
                }
                TurnPhase::CheckAnswer => {
                    let answer = state.last_answer().unwrap_or_default().to_string();
                    let outcome = self
                        .auditor
                        .audit(&state.original_query, &answer, state.has_tool_results())
                        .await;
                    state = state.with_verdict(outcome.accepted);

                    // Exhausted retries end the turn regardless of the verdict.
                    phase = if state.turn_retries >= self.config.turn_retry_cap {
                        TurnPhase::MaxRetries
                    } else if outcome.accepted {
                        TurnPhase::End
                    } else {
                        TurnPhase::Retry
                    };
                }
                TurnPhase::Retry => {
                    state = state.with_retry();
                    info!(
                        event_name = "turn.retry",
                        retries = state.turn_retries,
                        "answer rejected, retrying the whole turn"
                    );
                    phase = TurnPhase::Process;
                }
                TurnPhase::Invalid => {
                    state = state.with_entry(ChatEntry::assistant(INVALID_QUERY_REPLY));
                    phase = TurnPhase::End;
                }
                TurnPhase::MaxRetries => {
                    state = state.with_entry(ChatEntry::assistant(MAX_RETRIES_REPLY));
                    phase = TurnPhase::End;
                }
                TurnPhase::End => break,
            }
        }

        let (reply, state) = assemble_reply(state);
        info!(
            event_name = "turn.end",
            retries = state.turn_retries,
            tool_iterations = state.tool_iterations,
            reply_len = reply.len(),
            "turn finished"
        );

        TurnOutcome {
            reply,
            conversation: state.conversation,
            phases,
            tool_iterations: state.tool_iterations,
            turn_retries: state.turn_retries,
        }
    }

    /// Generate step: one oracle call over the full conversation with the
    /// tool catalog declared. Oracle failure is absorbed locally as a fixed
    /// safe reply; the iteration counter advances either way.
    async fn process(&self, state: TurnState) -> TurnState {
        let request = OracleRequest {
            system: Some(prompts::system_instruction(
                &self.registry.specs(),
                state.conversational_context.as_deref(),
            )),
            turns: state.conversation.clone(),
            tools: self.registry.specs(),
        };

        let entry = match self.oracle.complete(request).await {
            Ok(completion) => {
                let content = completion.content.map(|text| sanitize_reply(&text));
                let content = match content {
                    Some(text) if !text.is_empty() && !is_reply_safe(&text) => {
                        ORACLE_FAILURE_REPLY.to_string()
                    }
                    Some(text) => text,
                    None => String::new(),
                };
                ChatEntry::assistant_with_calls(content, completion.tool_calls)
            }
            Err(error) => {
                warn!(
                    event_name = "turn.process.oracle_failed",
                    error = %error,
                    "generate call failed, substituting fixed reply"
                );
                ChatEntry::assistant(ORACLE_FAILURE_REPLY)
            }
        };

        state.with_entry(entry).with_tool_iteration()
    }

    /// Dispatches every pending invocation on the latest assistant entry,
    /// appending one correlated tool result per call.
    async fn run_tools(&self, state: TurnState) -> TurnState {
        let pending = state
            .conversation
            .last()
            .map(|entry| entry.pending_tool_calls().to_vec())
            .unwrap_or_default();

        info!(event_name = "turn.tools.dispatching", count = pending.len(), "dispatching tools");

        let mut results = Vec::with_capacity(pending.len());
        for call in pending {
            let output = self.registry.invoke(&call.name, &call.arguments).await;
            results.push(ChatEntry::tool_result(call.id, call.name, output));
        }

        state.with_entries(results)
    }
}

fn route_after_process(state: &TurnState, tool_iteration_cap: u32) -> TurnPhase {
    // Past the cap the loop is forced into the adequacy check even with
    // pending invocations.
    if state.tool_iterations > tool_iteration_cap {
        return TurnPhase::CheckAnswer;
    }

    let has_pending =
        state.conversation.last().is_some_and(|entry| !entry.pending_tool_calls().is_empty());
    if has_pending {
        TurnPhase::Tools
    } else {
        TurnPhase::CheckAnswer
    }
}

/// Strips chain-of-thought scaffolding markers the oracle sometimes leaks
/// and collapses the remainder onto one line.
fn sanitize_reply(content: &str) -> String {
    let mut cleaned = content.to_string();
    for marker in ["Thought:", "Action:", "Observation:", "Final Answer:"] {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Output assembly: last assistant entry's text, else the most recent tool
/// result framed as a reply, else a generic apology. The transcript always
/// ends on a content-bearing assistant entry.
fn assemble_reply(state: TurnState) -> (String, TurnState) {
    if let Some(answer) = state.last_assistant().and_then(ChatEntry::assistant_content) {
        return (answer.to_string(), state);
    }

    let reply = match state.last_tool_result() {
        Some(result) => {
            format!("{TOOL_RESULT_FRAMING}\n\n{}", truncate_chars(result, FRAMED_RESULT_LIMIT))
        }
        None => EMPTY_ANSWER_REPLY.to_string(),
    };

    let state = state.with_entry(ChatEntry::assistant(reply.clone()));
    (reply, state)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{truncated}...")
}

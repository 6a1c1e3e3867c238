//! Conversation model shared by the agent runtime and its collaborators.
//!
//! A turn's conversation is an ordered sequence of [`ChatEntry`] values.
//! Every consumption site matches exhaustively on the tag; there is no
//! run-time type inspection anywhere downstream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tool invocation requested by the completion oracle.
///
/// Created by the oracle's tool-call decision, dispatched exactly once, and
/// resolved into exactly one [`ChatEntry::ToolResult`] carrying the same
/// `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), arguments: BTreeMap::new() }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// One entry in a turn's conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatEntry {
    User { content: String },
    Assistant { content: String, tool_calls: Vec<ToolCall> },
    ToolResult { call_id: String, tool: String, content: String },
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant { content: content.into(), tool_calls }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult { call_id: call_id.into(), tool: tool.into(), content: content.into() }
    }

    /// Pending tool invocations carried by an assistant entry.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            Self::User { .. } | Self::ToolResult { .. } => &[],
        }
    }

    /// Non-empty assistant text, if this entry carries one.
    pub fn assistant_content(&self) -> Option<&str> {
        match self {
            Self::Assistant { content, .. } if !content.trim().is_empty() => Some(content),
            Self::Assistant { .. } | Self::User { .. } | Self::ToolResult { .. } => None,
        }
    }
}

/// The single record threaded through the orchestration loop for one user
/// request.
///
/// The state is immutable by convention: every transition consumes the old
/// value and returns an updated copy, so a turn's progression is a pure
/// function of (state, event).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnState {
    pub conversation: Vec<ChatEntry>,
    pub original_query: String,
    pub conversational_context: Option<String>,
    pub is_valid: Option<bool>,
    pub tool_iterations: u32,
    pub turn_retries: u32,
    pub answer_accepted: bool,
}

impl TurnState {
    pub fn new(query: impl Into<String>, context: Option<String>) -> Self {
        let original_query = query.into();
        Self {
            conversation: vec![ChatEntry::user(original_query.clone())],
            original_query,
            conversational_context: context,
            is_valid: None,
            tool_iterations: 0,
            turn_retries: 0,
            answer_accepted: false,
        }
    }

    pub fn with_validity(self, is_valid: bool) -> Self {
        Self { is_valid: Some(is_valid), ..self }
    }

    pub fn with_entry(mut self, entry: ChatEntry) -> Self {
        self.conversation.push(entry);
        self
    }

    pub fn with_entries(mut self, entries: Vec<ChatEntry>) -> Self {
        self.conversation.extend(entries);
        self
    }

    pub fn with_tool_iteration(self) -> Self {
        Self { tool_iterations: self.tool_iterations + 1, ..self }
    }

    pub fn with_verdict(self, answer_accepted: bool) -> Self {
        Self { answer_accepted, ..self }
    }

    /// Discards the most recent assistant entry and resets the tool-iteration
    /// counter for a whole-turn retry. The retry counter only ever grows.
    pub fn with_retry(mut self) -> Self {
        if matches!(self.conversation.last(), Some(ChatEntry::Assistant { .. })) {
            self.conversation.pop();
        }
        Self { tool_iterations: 0, turn_retries: self.turn_retries + 1, ..self }
    }

    /// The latest assistant entry, regardless of content.
    pub fn last_assistant(&self) -> Option<&ChatEntry> {
        self.conversation.iter().rev().find(|entry| matches!(entry, ChatEntry::Assistant { .. }))
    }

    /// The latest non-empty assistant text.
    pub fn last_answer(&self) -> Option<&str> {
        self.conversation.iter().rev().find_map(ChatEntry::assistant_content)
    }

    /// The latest tool-result content.
    pub fn last_tool_result(&self) -> Option<&str> {
        self.conversation.iter().rev().find_map(|entry| match entry {
            ChatEntry::ToolResult { content, .. } => Some(content.as_str()),
            ChatEntry::User { .. } | ChatEntry::Assistant { .. } => None,
        })
    }

    pub fn has_tool_results(&self) -> bool {
        self.conversation.iter().any(|entry| matches!(entry, ChatEntry::ToolResult { .. }))
    }
}

/// One persisted line of the rolling chat history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub bot: String,
}

impl HistoryEntry {
    pub fn now(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self { timestamp: Utc::now(), user: user.into(), bot: bot.into() }
    }
}

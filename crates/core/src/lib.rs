pub mod chat;
pub mod config;

pub use chat::{ChatEntry, HistoryEntry, ToolCall, TurnState};
pub use config::{AppConfig, ConfigError, ConfigOverrides, FailurePolicy, LoadOptions};

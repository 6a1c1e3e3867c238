//! Test doubles shared by the HTTP-layer tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use swapdesk_agent::oracle::{Completion, CompletionOracle, OracleError, OracleRequest};

/// Oracle that replays a fixed list of completions in order.
pub struct ReplayOracle {
    replies: Mutex<VecDeque<Completion>>,
}

impl ReplayOracle {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self { replies: Mutex::new(replies.into()) }
    }
}

#[async_trait]
impl CompletionOracle for ReplayOracle {
    async fn complete(&self, _request: OracleRequest) -> Result<Completion, OracleError> {
        self.replies
            .lock()
            .expect("reply lock")
            .pop_front()
            .ok_or_else(|| OracleError::Decode("no scripted reply left".to_string()))
    }
}

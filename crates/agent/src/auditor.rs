//! Answer-adequacy auditing.
//!
//! Heuristic-first, oracle-fallback: the common case terminates without an
//! oracle round trip, and the cascade is biased toward accepting so turns
//! end rather than loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::oracle::{CompletionOracle, OracleRequest};
use crate::prompts::AUDIT_PROMPT;

/// Tokens that mark an answer as on-domain for the fast accept path.
const DOMAIN_KEYWORDS: &[&str] = &[
    "order", "tracking", "delivery", "purchase", "product", "phone", "laptop", "credit",
    "gift card", "swapdesk",
];

/// Tokens that mark a query as order-related for the fast reject path.
const ORDER_KEYWORDS: &[&str] = &["order", "tracking", "delivery", "shipped", "shipping"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditOutcome {
    pub accepted: bool,
    pub reason: &'static str,
}

impl AuditOutcome {
    fn accept(reason: &'static str) -> Self {
        Self { accepted: true, reason }
    }

    fn reject(reason: &'static str) -> Self {
        Self { accepted: false, reason }
    }
}

pub struct ResponseAuditor {
    oracle: Arc<dyn CompletionOracle>,
    min_answer_len: usize,
}

impl ResponseAuditor {
    pub fn new(oracle: Arc<dyn CompletionOracle>, min_answer_len: usize) -> Self {
        Self { oracle, min_answer_len }
    }

    /// Decides whether `answer` adequately addresses `query`.
    ///
    /// At most one oracle call, and only when no heuristic fires; oracle
    /// failure defaults to accept.
    pub async fn audit(&self, query: &str, answer: &str, has_tool_results: bool) -> AuditOutcome {
        let outcome = match self.heuristic(query, answer, has_tool_results) {
            Some(outcome) => outcome,
            None => self.oracle_verdict(query, answer).await,
        };

        debug!(
            event_name = "turn.audit.decided",
            accepted = outcome.accepted,
            reason = outcome.reason,
            "answer adequacy decided"
        );
        outcome
    }

    fn heuristic(&self, query: &str, answer: &str, has_tool_results: bool) -> Option<AuditOutcome> {
        let answer_lowered = answer.to_ascii_lowercase();
        let query_lowered = query.to_ascii_lowercase();

        if has_tool_results
            && answer.len() >= self.min_answer_len
            && DOMAIN_KEYWORDS.iter().any(|keyword| answer_lowered.contains(keyword))
        {
            return Some(AuditOutcome::accept("tool_backed_substantial_answer"));
        }

        // A successful tool call is sufficient signal even for a terse answer.
        if has_tool_results {
            return Some(AuditOutcome::accept("tool_results_present"));
        }

        let order_related = ORDER_KEYWORDS.iter().any(|keyword| query_lowered.contains(keyword));
        if order_related && answer.len() < self.min_answer_len {
            return Some(AuditOutcome::reject("order_query_without_data"));
        }

        None
    }

    async fn oracle_verdict(&self, query: &str, answer: &str) -> AuditOutcome {
        let user = format!("Question: {query}\nAnswer: {answer}");

        match self.oracle.complete(OracleRequest::classification(AUDIT_PROMPT, user)).await {
            Ok(completion) => {
                let verdict = completion.content.unwrap_or_default().to_ascii_uppercase();
                if verdict.contains("UNSATISFIED") {
                    AuditOutcome::reject("oracle_unsatisfied")
                } else if verdict.contains("SATISFIED") {
                    AuditOutcome::accept("oracle_satisfied")
                } else {
                    AuditOutcome::accept("oracle_verdict_ambiguous")
                }
            }
            Err(error) => {
                warn!(
                    event_name = "turn.audit.oracle_failed",
                    error = %error,
                    "adequacy call failed"
                );
                AuditOutcome::accept("oracle_unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::oracle::script::{ScriptedOracle, Step};
    use crate::oracle::Completion;

    use super::ResponseAuditor;

    fn auditor(oracle: Arc<ScriptedOracle>) -> ResponseAuditor {
        ResponseAuditor::new(oracle, 20)
    }

    #[tokio::test]
    async fn substantial_tool_backed_answer_accepts_without_the_oracle() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let auditor = auditor(Arc::clone(&oracle));

        let outcome = auditor
            .audit(
                "what's my order status?",
                "Your order SWP-20931 is out for delivery and arrives tomorrow.",
                true,
            )
            .await;

        assert!(outcome.accepted);
        assert_eq!(outcome.reason, "tool_backed_substantial_answer");
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn terse_answer_with_tool_results_still_accepts() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let auditor = auditor(Arc::clone(&oracle));

        let outcome = auditor.audit("what's my order status?", "Shipped.", true).await;

        assert!(outcome.accepted);
        assert_eq!(outcome.reason, "tool_results_present");
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn short_answer_to_an_order_query_without_data_rejects() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let auditor = auditor(Arc::clone(&oracle));

        let outcome = auditor.audit("where is my order?", "Not sure.", false).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.reason, "order_query_without_data");
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn non_order_query_falls_back_to_the_oracle_verdict() {
        let oracle =
            Arc::new(ScriptedOracle::new(vec![Step::Reply(Completion::text("UNSATISFIED"))]));
        let auditor = auditor(Arc::clone(&oracle));

        let outcome = auditor.audit("tell me about swapdesk", "We sell things.", false).await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.reason, "oracle_unsatisfied");
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn oracle_failure_defaults_to_accept() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Step::Fail]));
        let auditor = auditor(oracle);

        let outcome = auditor
            .audit("tell me about swapdesk", "Swapdesk buys and sells refurbished devices.", false)
            .await;

        assert!(outcome.accepted);
        assert_eq!(outcome.reason, "oracle_unavailable");
    }
}

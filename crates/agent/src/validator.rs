//! Query validation: denylist fast path plus one oracle classification.

use std::sync::Arc;

use swapdesk_core::config::FailurePolicy;
use tracing::{debug, warn};

use crate::oracle::{CompletionOracle, OracleRequest};
use crate::prompts::VALIDATION_PROMPT;

/// Unsafe-topic keywords rejected without an oracle round trip.
const DENYLIST: &[&str] = &[
    "hack", "exploit", "illegal", "violence", "bomb", "weapon", "emergency", "crisis", "suicide",
    "police", "911", "password",
];

/// Terms that must never appear in a reply shown to the user.
const UNSAFE_REPLY_TERMS: &[&str] = &["emergency", "911", "crisis", "suicide", "police"];

pub struct QueryValidator {
    oracle: Arc<dyn CompletionOracle>,
    failure_policy: FailurePolicy,
}

impl QueryValidator {
    pub fn new(oracle: Arc<dyn CompletionOracle>, failure_policy: FailurePolicy) -> Self {
        Self { oracle, failure_policy }
    }

    /// Classifies a raw user query as in-scope or out-of-scope.
    ///
    /// Exactly one oracle call at most; a denylist hit short-circuits it.
    /// Oracle failure and ambiguous verdicts resolve via the configured
    /// [`FailurePolicy`].
    pub async fn validate(&self, query: &str, context: Option<&str>) -> bool {
        let lowered = query.to_ascii_lowercase();
        if let Some(keyword) = DENYLIST.iter().find(|keyword| lowered.contains(*keyword)) {
            debug!(event_name = "turn.judge.denylist_hit", keyword, "query rejected by denylist");
            return false;
        }

        let mut user = format!("Query: {query}");
        if let Some(context) = context.filter(|context| !context.trim().is_empty()) {
            user.push_str("\nRecent conversation context: ");
            user.push_str(context);
        }

        match self.oracle.complete(OracleRequest::classification(VALIDATION_PROMPT, user)).await {
            Ok(completion) => {
                let verdict = completion.content.unwrap_or_default().to_ascii_uppercase();
                if verdict.contains("INVALID") {
                    false
                } else if verdict.contains("VALID") {
                    true
                } else {
                    debug!(
                        event_name = "turn.judge.ambiguous_verdict",
                        verdict = %verdict,
                        "verdict was neither VALID nor INVALID"
                    );
                    self.failure_default()
                }
            }
            Err(error) => {
                warn!(
                    event_name = "turn.judge.oracle_failed",
                    error = %error,
                    "classification call failed"
                );
                self.failure_default()
            }
        }
    }

    fn failure_default(&self) -> bool {
        match self.failure_policy {
            FailurePolicy::Reject => false,
            FailurePolicy::Accept => true,
        }
    }
}

/// Reply-side safety net: a generated answer mentioning unsafe topics is
/// replaced with the fixed fallback before it ever reaches the auditor.
pub fn is_reply_safe(content: &str) -> bool {
    let lowered = content.to_ascii_lowercase();
    !UNSAFE_REPLY_TERMS.iter().any(|term| lowered.contains(term))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swapdesk_core::config::FailurePolicy;

    use crate::oracle::script::{ScriptedOracle, Step};
    use crate::oracle::Completion;

    use super::{is_reply_safe, QueryValidator};

    fn validator(oracle: Arc<ScriptedOracle>, policy: FailurePolicy) -> QueryValidator {
        QueryValidator::new(oracle, policy)
    }

    #[tokio::test]
    async fn denylist_match_rejects_without_an_oracle_call() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let validator = validator(Arc::clone(&oracle), FailurePolicy::Reject);

        assert!(!validator.validate("how do I HACK an account", None).await);
        assert!(!validator.validate("tell me about suicide", None).await);
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn oracle_verdicts_are_parsed_case_insensitively() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Step::Reply(Completion::text("valid")),
            Step::Reply(Completion::text("INVALID")),
        ]));
        let validator = validator(Arc::clone(&oracle), FailurePolicy::Reject);

        assert!(validator.validate("where is my order?", None).await);
        assert!(!validator.validate("write me a poem about the moon", None).await);
        assert_eq!(oracle.call_count(), 2);
    }

    #[tokio::test]
    async fn oracle_failure_defaults_to_reject_under_the_strict_policy() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Step::Fail]));
        let validator = validator(oracle, FailurePolicy::Reject);

        assert!(!validator.validate("where is my order?", None).await);
    }

    #[tokio::test]
    async fn oracle_failure_defaults_to_accept_under_the_lenient_policy() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Step::Fail]));
        let validator = validator(oracle, FailurePolicy::Accept);

        assert!(validator.validate("where is my order?", None).await);
    }

    #[tokio::test]
    async fn ambiguous_verdict_follows_the_failure_policy() {
        let oracle =
            Arc::new(ScriptedOracle::new(vec![Step::Reply(Completion::text("maybe, unclear"))]));
        let validator = validator(oracle, FailurePolicy::Reject);

        assert!(!validator.validate("where is my order?", None).await);
    }

    #[test]
    fn reply_safety_flags_unsafe_terms() {
        assert!(is_reply_safe("Your order SWP-20931 is out for delivery."));
        assert!(!is_reply_safe("Please call 911 immediately."));
    }
}

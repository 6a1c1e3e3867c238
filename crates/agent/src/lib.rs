//! Agent runtime: the turn orchestrator and its collaborators.
//!
//! This crate is the "brain" of the Swapdesk assistant:
//!
//! 1. **Query validation** (`validator`): denylist fast path plus a
//!    one-shot oracle classification of the incoming question.
//! 2. **Generation** (`oracle`): a pluggable completion oracle with
//!    tool-calling, and its OpenAI-compatible HTTP implementation.
//! 3. **Tool execution** (`tools`): a registry of named, side-effect-free
//!    data lookups whose `invoke` never fails.
//! 4. **Adequacy auditing** (`auditor`): heuristic-first answer check
//!    with an oracle fallback.
//! 5. **Orchestration** (`runtime`): the bounded state machine that
//!    sequences the above for one user turn.
//!
//! # Safety principle
//!
//! The oracle is strictly a text generator. Scope enforcement, iteration
//! budgets, and termination are deterministic decisions made here; no
//! oracle failure ever surfaces past the runtime as an error.

pub mod auditor;
pub mod oracle;
pub mod prompts;
pub mod runtime;
pub mod tools;
pub mod validator;

pub use auditor::ResponseAuditor;
pub use oracle::{Completion, CompletionOracle, HttpOracle, OracleError, OracleRequest, ToolSpec};
pub use runtime::{TurnOrchestrator, TurnOutcome};
pub use tools::{Tool, ToolError, ToolRegistry};
pub use validator::QueryValidator;

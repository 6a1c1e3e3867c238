//! Tool registry: named, single-purpose data lookups the oracle may invoke.
//!
//! `invoke` is total. Unknown names, missing files, and parse failures all
//! come back as human-readable strings so the orchestrator can append them
//! as tool results instead of propagating errors.

pub mod lookups;
pub mod search;

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use swapdesk_store::records::DataError;
use thiserror::Error;
use tracing::warn;

use crate::oracle::ToolSpec;

pub use lookups::{
    AboutTool, OrderTrackingTool, ProfileTool, PurchasesTool, TrendingProductsTool,
};
pub use search::{DuckDuckGoProvider, SearchError, SearchProvider, WebSearchTool};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn run(&self, arguments: &BTreeMap<String, String>) -> Result<String, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.spec().name;
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, Box::new(tool));
    }

    /// Declared signatures, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Dispatches one invocation. Never fails: failures become descriptive
    /// text for the conversation.
    pub async fn invoke(&self, name: &str, arguments: &BTreeMap<String, String>) -> String {
        let Some(tool) = self.tools.get(name) else {
            warn!(event_name = "turn.tools.unknown", tool = name, "unknown tool requested");
            return format!("Tool `{name}` is not available.");
        };

        match tool.run(arguments).await {
            Ok(output) => output,
            Err(error) => {
                warn!(
                    event_name = "turn.tools.failed",
                    tool = name,
                    error = %error,
                    "tool execution failed"
                );
                format!("{name} is currently unavailable: {error}")
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use crate::oracle::ToolSpec;

    use super::{Tool, ToolError, ToolRegistry};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("echo", "echoes its input").with_parameter("text", "text to echo")
        }

        async fn run(&self, arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
            Ok(arguments.get("text").cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn invoke_dispatches_to_the_named_tool() {
        let mut registry = ToolRegistry::default();
        registry.register(EchoTool);

        let mut arguments = BTreeMap::new();
        arguments.insert("text".to_string(), "hello".to_string());

        assert_eq!(registry.invoke("echo", &arguments).await, "hello");
    }

    #[tokio::test]
    async fn invoke_is_total_for_unknown_tools() {
        let registry = ToolRegistry::default();
        let reply = registry.invoke("does_not_exist", &BTreeMap::new()).await;
        assert!(reply.contains("does_not_exist"));
        assert!(reply.contains("not available"));
    }

    #[test]
    fn specs_preserve_registration_order() {
        let mut registry = ToolRegistry::default();
        registry.register(EchoTool);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.specs()[0].name, "echo");
    }
}

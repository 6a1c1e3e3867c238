//! Application assembly: config to a wired [`ChatService`].

use std::sync::Arc;
use std::time::Duration;

use swapdesk_agent::oracle::{CompletionOracle, HttpOracle, OracleError};
use swapdesk_agent::runtime::TurnOrchestrator;
use swapdesk_agent::tools::{
    AboutTool, DuckDuckGoProvider, OrderTrackingTool, ProfileTool, PurchasesTool, SearchError,
    ToolRegistry, TrendingProductsTool, WebSearchTool,
};
use swapdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use swapdesk_store::history::FileHistoryLog;
use thiserror::Error;
use tracing::info;

use crate::service::ChatService;

pub struct Application {
    pub config: AppConfig,
    pub service: Arc<ChatService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("oracle client construction failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("search client construction failed: {0}")]
    Search(#[from] SearchError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let oracle: Arc<dyn CompletionOracle> = Arc::new(HttpOracle::from_config(&config.llm)?);
    let registry = tool_registry(&oracle, &config)?;

    info!(
        event_name = "system.bootstrap.tools_registered",
        tool_count = registry.len(),
        "tool registry assembled"
    );

    let orchestrator = TurnOrchestrator::new(oracle, registry, config.agent.clone());
    let history = Arc::new(FileHistoryLog::new(config.history.path.clone(), config.history.cap));
    let service = Arc::new(ChatService::new(orchestrator, history, config.history.cap));

    info!(event_name = "system.bootstrap.complete", "application bootstrap complete");
    Ok(Application { config, service })
}

/// The five file-backed lookups plus web search, in the order the oracle
/// sees them declared.
fn tool_registry(
    oracle: &Arc<dyn CompletionOracle>,
    config: &AppConfig,
) -> Result<ToolRegistry, BootstrapError> {
    let mut registry = ToolRegistry::default();
    registry.register(OrderTrackingTool::new(config.data.clone()));
    registry.register(ProfileTool::new(config.data.clone()));
    registry.register(PurchasesTool::new(config.data.clone()));
    registry.register(TrendingProductsTool::new(config.data.clone()));
    registry.register(AboutTool::new(config.data.clone()));

    let provider = Arc::new(DuckDuckGoProvider::new(Duration::from_secs(config.llm.timeout_secs))?);
    registry.register(WebSearchTool::new(Arc::clone(oracle), provider));

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swapdesk_agent::oracle::{CompletionOracle, HttpOracle};
    use swapdesk_core::config::{AppConfig, FailurePolicy};

    use super::{bootstrap_with_config, tool_registry};

    #[test]
    fn the_registry_declares_all_six_tools() {
        let config = AppConfig::default();
        let oracle: Arc<dyn CompletionOracle> =
            Arc::new(HttpOracle::from_config(&config.llm).expect("oracle should build"));

        let registry = tool_registry(&oracle, &config).expect("registry should build");
        assert_eq!(registry.len(), 6);

        let names: Vec<String> =
            registry.specs().into_iter().map(|spec| spec.name).collect();
        assert_eq!(
            names,
            vec![
                "get_order_tracking",
                "get_personal_profile",
                "get_last_purchases",
                "get_trending_products",
                "about_swapdesk",
                "web_search",
            ]
        );
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_defaults() {
        let app = bootstrap_with_config(AppConfig::default())
            .await
            .expect("bootstrap should succeed with defaults");

        assert_eq!(app.config.agent.tool_iteration_cap, 3);
        assert_eq!(app.config.agent.turn_retry_cap, 2);
        assert_eq!(app.config.agent.validator_failure_policy, FailurePolicy::Reject);
    }
}

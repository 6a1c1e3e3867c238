mod bootstrap;
mod routes;
mod service;
#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use secrecy::ExposeSecret;
use swapdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "swapdesk-server",
    about = "Customer service assistant for the Swapdesk marketplace"
)]
struct Args {
    /// Path to a swapdesk.toml config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to bind, e.g. 0.0.0.0.
    #[arg(long)]
    bind: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Directory holding the demo account data files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Log level: trace|debug|info|warn|error.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn load_options(self) -> LoadOptions {
        LoadOptions {
            // An explicitly named config file must exist; only the default
            // lookup is allowed to fall through to built-in defaults.
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                bind_address: self.bind,
                port: self.port,
                data_dir: self.data_dir,
                log_level: self.log_level,
                ..ConfigOverrides::default()
            },
        }
    }
}

fn init_logging(config: &AppConfig) {
    use swapdesk_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let args = Args::parse();
    let config = AppConfig::load(args.load_options())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let state = routes::AppState {
        service: app.service,
        api_key: app.config.server.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        data_dir: app.config.data.dir.clone(),
    };

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        api_key_required = state.api_key.is_some(),
        "swapdesk-server listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(wait_for_shutdown(app.config.server.graceful_shutdown_secs))
        .await?;

    tracing::info!(event_name = "system.server.stopped", "swapdesk-server stopped");
    Ok(())
}

async fn wait_for_shutdown(grace_secs: u64) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::info!(
        event_name = "system.server.stopping",
        grace_secs,
        "shutdown signal received, draining in-flight requests"
    );
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use swapdesk_core::config::{AppConfig, ConfigError};

    use super::Args;

    #[test]
    fn an_explicit_config_path_is_required_to_exist() {
        let args =
            Args::parse_from(["swapdesk-server", "--config", "/does/not/exist/swapdesk.toml"]);
        let options = args.load_options();
        assert!(options.require_file);

        let result = AppConfig::load(options);
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn the_default_config_lookup_stays_optional() {
        let args = Args::parse_from(["swapdesk-server", "--port", "9090"]);
        let options = args.load_options();
        assert!(!options.require_file);
        assert_eq!(options.overrides.port, Some(9090));
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub data: DataConfig,
    pub history: HistoryConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Generate/tool-call round trips allowed within one turn attempt.
    pub tool_iteration_cap: u32,
    /// Whole-turn retries allowed before the fallback apology.
    pub turn_retry_cap: u32,
    /// Minimum answer length the auditor treats as substantial.
    pub min_answer_len: usize,
    /// What the validator does when its oracle call fails or is ambiguous.
    pub validator_failure_policy: FailurePolicy,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub order_tracking_file: String,
    pub profile_file: String,
    pub purchases_file: String,
    pub trending_file: String,
    pub about_file: String,
}

impl DataConfig {
    pub fn order_tracking_path(&self) -> PathBuf {
        self.dir.join(&self.order_tracking_file)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.dir.join(&self.profile_file)
    }

    pub fn purchases_path(&self) -> PathBuf {
        self.dir.join(&self.purchases_file)
    }

    pub fn trending_path(&self) -> PathBuf {
        self.dir.join(&self.trending_file)
    }

    pub fn about_path(&self) -> PathBuf {
        self.dir.join(&self.about_file)
    }
}

#[derive(Clone, Debug)]
pub struct HistoryConfig {
    pub path: PathBuf,
    /// Most recent entries retained; older ones are truncated first.
    pub cap: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// When set, `/chat` requires a matching `x-api-key` header.
    pub api_key: Option<SecretString>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Validator behavior when the classification oracle fails or returns an
/// ambiguous verdict. Earlier revisions of the system shipped `Accept`;
/// `Reject` is the domain-lockdown default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Reject,
    Accept,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "http://localhost:11434/v1".to_string(),
                api_key: None,
                model: "llama3.1".to_string(),
                temperature: 0.1,
                max_tokens: 1024,
                timeout_secs: 30,
            },
            agent: AgentConfig {
                tool_iteration_cap: 3,
                turn_retry_cap: 2,
                min_answer_len: 20,
                validator_failure_policy: FailurePolicy::Reject,
            },
            data: DataConfig {
                dir: PathBuf::from("data"),
                order_tracking_file: "order_tracking.json".to_string(),
                profile_file: "profile.json".to_string(),
                purchases_file: "purchases.json".to_string(),
                trending_file: "trending_products.json".to_string(),
                about_file: "about.txt".to_string(),
            },
            history: HistoryConfig { path: PathBuf::from("chat_history.json"), cap: 5 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                api_key: None,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "accept" => Ok(Self::Accept),
            other => Err(ConfigError::Validation(format!(
                "unsupported validator failure policy `{other}` (expected reject|accept)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("swapdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(tool_iteration_cap) = agent.tool_iteration_cap {
                self.agent.tool_iteration_cap = tool_iteration_cap;
            }
            if let Some(turn_retry_cap) = agent.turn_retry_cap {
                self.agent.turn_retry_cap = turn_retry_cap;
            }
            if let Some(min_answer_len) = agent.min_answer_len {
                self.agent.min_answer_len = min_answer_len;
            }
            if let Some(validator_failure_policy) = agent.validator_failure_policy {
                self.agent.validator_failure_policy = validator_failure_policy;
            }
        }

        if let Some(data) = patch.data {
            if let Some(dir) = data.dir {
                self.data.dir = dir;
            }
            if let Some(order_tracking_file) = data.order_tracking_file {
                self.data.order_tracking_file = order_tracking_file;
            }
            if let Some(profile_file) = data.profile_file {
                self.data.profile_file = profile_file;
            }
            if let Some(purchases_file) = data.purchases_file {
                self.data.purchases_file = purchases_file;
            }
            if let Some(trending_file) = data.trending_file {
                self.data.trending_file = trending_file;
            }
            if let Some(about_file) = data.about_file {
                self.data.about_file = about_file;
            }
        }

        if let Some(history) = patch.history {
            if let Some(path) = history.path {
                self.history.path = path;
            }
            if let Some(cap) = history.cap {
                self.history.cap = cap;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(server_api_key_value) = server.api_key {
                self.server.api_key = Some(secret_value(server_api_key_value));
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SWAPDESK_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("SWAPDESK_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SWAPDESK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SWAPDESK_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("SWAPDESK_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("SWAPDESK_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("SWAPDESK_LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("SWAPDESK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SWAPDESK_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SWAPDESK_AGENT_TOOL_ITERATION_CAP") {
            self.agent.tool_iteration_cap = parse_u32("SWAPDESK_AGENT_TOOL_ITERATION_CAP", &value)?;
        }
        if let Some(value) = read_env("SWAPDESK_AGENT_TURN_RETRY_CAP") {
            self.agent.turn_retry_cap = parse_u32("SWAPDESK_AGENT_TURN_RETRY_CAP", &value)?;
        }
        if let Some(value) = read_env("SWAPDESK_AGENT_VALIDATOR_FAILURE_POLICY") {
            self.agent.validator_failure_policy = value.parse()?;
        }

        if let Some(value) = read_env("SWAPDESK_DATA_DIR") {
            self.data.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SWAPDESK_HISTORY_PATH") {
            self.history.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("SWAPDESK_HISTORY_CAP") {
            self.history.cap = parse_usize("SWAPDESK_HISTORY_CAP", &value)?;
        }

        if let Some(value) = read_env("SWAPDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SWAPDESK_SERVER_PORT") {
            self.server.port = parse_u16("SWAPDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SWAPDESK_SERVER_API_KEY") {
            self.server.api_key = Some(secret_value(value));
        }

        let log_level = read_env("SWAPDESK_LOGGING_LEVEL").or_else(|| read_env("SWAPDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SWAPDESK_LOGGING_FORMAT").or_else(|| read_env("SWAPDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.data.dir = data_dir;
        }
        if let Some(history_path) = overrides.history_path {
            self.history.path = history_path;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_agent(&self.agent)?;
        validate_history(&self.history)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("swapdesk.toml"), PathBuf::from("config/swapdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    if agent.tool_iteration_cap == 0 {
        return Err(ConfigError::Validation(
            "agent.tool_iteration_cap must be greater than zero".to_string(),
        ));
    }

    if agent.min_answer_len == 0 {
        return Err(ConfigError::Validation(
            "agent.min_answer_len must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_history(history: &HistoryConfig) -> Result<(), ConfigError> {
    if history.cap == 0 || history.cap > 100 {
        return Err(ConfigError::Validation("history.cap must be in range 1..=100".to_string()));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(api_key) = &server.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.api_key must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    agent: Option<AgentPatch>,
    data: Option<DataPatch>,
    history: Option<HistoryPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    tool_iteration_cap: Option<u32>,
    turn_retry_cap: Option<u32>,
    min_answer_len: Option<usize>,
    validator_failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    dir: Option<PathBuf>,
    order_tracking_file: Option<String>,
    profile_file: Option<String>,
    purchases_file: Option<String>,
    trending_file: Option<String>,
    about_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryPatch {
    path: Option<PathBuf>,
    cap: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, FailurePolicy, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_documented_caps() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.agent.tool_iteration_cap == 3, "tool cap should default to 3")?;
        ensure(config.agent.turn_retry_cap == 2, "retry cap should default to 2")?;
        ensure(config.history.cap == 5, "history cap should default to 5")?;
        ensure(
            config.agent.validator_failure_policy == FailurePolicy::Reject,
            "validator should default to strict reject",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SWAPDESK_LLM_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("swapdesk.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_SWAPDESK_LLM_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config.llm.api_key.ok_or("api key should be set")?;
            ensure(
                api_key.expose_secret() == "sk-from-env",
                "api key should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_SWAPDESK_LLM_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SWAPDESK_LLM_MODEL", "model-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("swapdesk.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "model-from-file"

[logging]
level = "warn"

[agent]
validator_failure_policy = "accept"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "model-from-env", "env model should win over file")?;
            ensure(config.logging.level == "debug", "overridden log level should win over file")?;
            ensure(
                config.agent.validator_failure_policy == FailurePolicy::Accept,
                "file should be able to flip the validator failure policy",
            )
        })();

        clear_vars(&["SWAPDESK_LLM_MODEL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SWAPDESK_LLM_BASE_URL", "not-a-url");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.base_url")
            );
            ensure(has_message, "validation failure should mention llm.base_url")
        })();

        clear_vars(&["SWAPDESK_LLM_BASE_URL"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SWAPDESK_LLM_API_KEY", "sk-secret-value");
        env::set_var("SWAPDESK_SERVER_API_KEY", "inbound-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain llm key")?;
            ensure(
                !debug.contains("inbound-secret-value"),
                "debug output should not contain server key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&["SWAPDESK_LLM_API_KEY", "SWAPDESK_SERVER_API_KEY"]);
        result
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the remote agent platform.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub endpoint: String,
    pub connection_string: SecretString,
    pub model: String,
    pub poll_interval_secs: u64,
    pub run_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub subsidies_spec_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
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

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub connection_string: Option<String>,
    pub model: Option<String>,
    pub subsidies_spec_path: Option<PathBuf>,
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
            agent: AgentConfig {
                endpoint: String::new(),
                connection_string: String::new().into(),
                model: "gpt-4o".to_string(),
                poll_interval_secs: 1,
                run_timeout_secs: 120,
                request_timeout_secs: 30,
                subsidies_spec_path: PathBuf::from("specs/subsidies.json"),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("hojokin.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(agent) = patch.agent {
            if let Some(endpoint) = agent.endpoint {
                self.agent.endpoint = endpoint;
            }
            if let Some(connection_string_value) = agent.connection_string {
                self.agent.connection_string = secret_value(connection_string_value);
            }
            if let Some(model) = agent.model {
                self.agent.model = model;
            }
            if let Some(poll_interval_secs) = agent.poll_interval_secs {
                self.agent.poll_interval_secs = poll_interval_secs;
            }
            if let Some(run_timeout_secs) = agent.run_timeout_secs {
                self.agent.run_timeout_secs = run_timeout_secs;
            }
            if let Some(request_timeout_secs) = agent.request_timeout_secs {
                self.agent.request_timeout_secs = request_timeout_secs;
            }
            if let Some(subsidies_spec_path) = agent.subsidies_spec_path {
                self.agent.subsidies_spec_path = subsidies_spec_path;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
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
        if let Some(value) = read_env("HOJOKIN_AGENT_ENDPOINT") {
            self.agent.endpoint = value;
        }
        let connection_string = read_env("HOJOKIN_AGENT_CONNECTION_STRING")
            .or_else(|| read_env("PROJECT_CONNECTION_STRING"));
        if let Some(value) = connection_string {
            self.agent.connection_string = secret_value(value);
        }
        if let Some(value) = read_env("HOJOKIN_AGENT_MODEL") {
            self.agent.model = value;
        }
        if let Some(value) = read_env("HOJOKIN_AGENT_POLL_INTERVAL_SECS") {
            self.agent.poll_interval_secs = parse_u64("HOJOKIN_AGENT_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("HOJOKIN_AGENT_RUN_TIMEOUT_SECS") {
            self.agent.run_timeout_secs = parse_u64("HOJOKIN_AGENT_RUN_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HOJOKIN_AGENT_REQUEST_TIMEOUT_SECS") {
            self.agent.request_timeout_secs =
                parse_u64("HOJOKIN_AGENT_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("HOJOKIN_AGENT_SUBSIDIES_SPEC_PATH") {
            self.agent.subsidies_spec_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("HOJOKIN_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HOJOKIN_SERVER_PORT") {
            self.server.port = parse_u16("HOJOKIN_SERVER_PORT", &value)?;
        }

        let log_level = read_env("HOJOKIN_LOGGING_LEVEL").or_else(|| read_env("HOJOKIN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HOJOKIN_LOGGING_FORMAT").or_else(|| read_env("HOJOKIN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.agent.endpoint = endpoint;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.agent.connection_string = secret_value(connection_string);
        }
        if let Some(model) = overrides.model {
            self.agent.model = model;
        }
        if let Some(subsidies_spec_path) = overrides.subsidies_spec_path {
            self.agent.subsidies_spec_path = subsidies_spec_path;
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
        validate_agent(&self.agent)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("hojokin.toml"), PathBuf::from("config/hojokin.toml")]
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

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    let endpoint = agent.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::Validation(
            "agent.endpoint is required (the base URL of the remote agent platform)".to_string(),
        ));
    }
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "agent.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if agent.connection_string.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "agent.connection_string is required (set HOJOKIN_AGENT_CONNECTION_STRING or PROJECT_CONNECTION_STRING)".to_string(),
        ));
    }

    if agent.model.trim().is_empty() {
        return Err(ConfigError::Validation("agent.model must not be empty".to_string()));
    }

    if agent.poll_interval_secs == 0 || agent.poll_interval_secs > 60 {
        return Err(ConfigError::Validation(
            "agent.poll_interval_secs must be in range 1..=60".to_string(),
        ));
    }

    if agent.run_timeout_secs == 0 || agent.run_timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "agent.run_timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    if agent.run_timeout_secs < agent.poll_interval_secs {
        return Err(ConfigError::Validation(
            "agent.run_timeout_secs must be at least agent.poll_interval_secs".to_string(),
        ));
    }

    if agent.request_timeout_secs == 0 || agent.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "agent.request_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
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

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    agent: Option<AgentPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    endpoint: Option<String>,
    connection_string: Option<String>,
    model: Option<String>,
    poll_interval_secs: Option<u64>,
    run_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    subsidies_spec_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

use std::sync::Arc;
use std::time::Duration;

use hojokin_agent::{
    AgentError, AgentRuntime, ApplicationFormGenerator, HttpAgentPlatform, RuntimeOptions,
};
use hojokin_core::config::{AppConfig, ConfigError};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

/// Process-wide context: built once at startup, immutable afterwards, and
/// handed to every request handler.
pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
    pub generator: Arc<ApplicationFormGenerator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent platform client construction failed: {0}")]
    Platform(#[source] AgentError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let platform = HttpAgentPlatform::new(
        &config.agent.endpoint,
        config.agent.connection_string.expose_secret().to_string(),
        Duration::from_secs(config.agent.request_timeout_secs),
    )
    .map_err(BootstrapError::Platform)?;

    let runtime = Arc::new(AgentRuntime::new(
        Arc::new(platform),
        RuntimeOptions {
            model: config.agent.model.clone(),
            poll_interval: Duration::from_secs(config.agent.poll_interval_secs),
            run_timeout: Duration::from_secs(config.agent.run_timeout_secs),
        },
    ));

    let generator = Arc::new(ApplicationFormGenerator::new(
        runtime.clone(),
        config.agent.subsidies_spec_path.clone(),
    ));

    info!(
        event_name = "system.bootstrap.platform_ready",
        correlation_id = "bootstrap",
        endpoint = %config.agent.endpoint,
        "agent platform client constructed"
    );

    Ok(Application { config, runtime, generator })
}

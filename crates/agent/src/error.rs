use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("remote run failed: {message}")]
    RunFailed { message: String },
    #[error("remote run did not reach a terminal state within {waited_secs}s")]
    RunTimeout { waited_secs: u64 },
    #[error("tool specification file not found: `{path}`")]
    SpecNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tool specification file `{path}` is not valid JSON: {source}")]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("agent platform returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("agent platform request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Narrative-content generation failure.
///
/// Always recoverable: document generation catches this and falls back to
/// the base template, so it never surfaces to the end caller.
#[derive(Debug, Error)]
#[error("AIコンテンツ生成エラー: {message}")]
pub struct AiContentError {
    pub message: String,
}

impl AiContentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<AgentError> for AiContentError {
    fn from(error: AgentError) -> Self {
        Self::new(error.to_string())
    }
}

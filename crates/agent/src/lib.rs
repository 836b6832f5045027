//! Agent Runtime adapter for the subsidy application assistant.
//!
//! This crate owns everything that talks to the remote agent platform:
//!
//! - `platform` — the narrow protocol trait and its HTTP implementation
//! - `runtime` — the create-agent/thread/run/poll conversation loop
//! - `tools` — local executors for requires-action tool calls
//! - `spec` — the subsidy-search OpenAPI tool definition
//! - `content` — prompt construction and reply parsing for narrative prose
//! - `application` — document generation composed from core rendering and
//!   AI enrichment, with a guaranteed base-template fallback
//!
//! The pure extraction/formatting/templating logic lives in
//! `hojokin-core`; this crate never renders documents itself.

pub mod application;
pub mod content;
pub mod error;
pub mod platform;
pub mod runtime;
pub mod spec;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use application::{ApplicationFormGenerator, EnhancedDocument};
pub use error::{AgentError, AiContentError};
pub use platform::{AgentPlatform, HttpAgentPlatform};
pub use runtime::{AgentReply, AgentRuntime, RuntimeOptions, ToolDescriptor};

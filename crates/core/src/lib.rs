//! Core domain logic for the subsidy application assistant.
//!
//! Everything in this crate is pure and synchronous: formatting yen
//! amounts and calendar dates, extracting structured subsidy records from
//! free text, rendering application documents, and loading configuration.
//! The remote agent protocol lives in `hojokin-agent`; the HTTP surface in
//! `hojokin-server`.

pub mod config;
pub mod currency;
pub mod dates;
pub mod document;
pub mod extract;
pub mod subsidy;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use currency::format_currency;
pub use dates::{format_date_ja, INVALID_DATE, NO_INFO};
pub use document::{render, render_enhanced, AI_UNAVAILABLE_NOTICE};
pub use extract::extract;
pub use subsidy::{AiContent, SubsidyInfo, NARRATIVE_SECTION_KEYS};

//! Core types, configuration, and error handling for the PatchPilot bot.
//!
//! This crate provides the shared foundation used by the other PatchPilot crates:
//! - [`PilotError`] — unified error type using `thiserror`
//! - [`BotConfig`] — immutable configuration captured once from the environment
//! - Shared types: [`ChangedFile`], [`FileStatus`], [`SelectionRules`], [`ReviewVerdict`]

mod config;
mod error;
mod types;

pub use config::{AzureConfig, BotConfig, LlmConfig};
pub use error::PilotError;
pub use types::{ChangedFile, FileStatus, ReviewVerdict, SelectionRules};

/// A convenience `Result` type for PatchPilot operations.
pub type Result<T> = std::result::Result<T, PilotError>;

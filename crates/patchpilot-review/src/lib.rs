//! Review orchestration for the PatchPilot bot.
//!
//! Provides the LLM chat backend (OpenAI-compatible, with an Azure-flavored
//! variant), prompt construction and verdict parsing, the review client, the
//! GitHub API glue, and the pull-request event handler.

pub mod client;
pub mod github;
pub mod handler;
pub mod llm;
pub mod prompt;

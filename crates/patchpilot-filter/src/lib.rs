//! File selection and patch assembly for pull-request review.
//!
//! Decides which changed files are worth sending to the LLM (include/ignore
//! rules with glob-first, regex-fallback matching) and concatenates their
//! diffs into a single reviewable patch bounded by a per-file length cutoff.

pub mod assembler;
pub mod matcher;
pub mod selector;

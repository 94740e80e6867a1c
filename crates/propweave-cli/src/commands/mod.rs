//! CLI command implementations.

pub mod config;
pub mod inputs;
pub mod weave;

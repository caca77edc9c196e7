//! CLI subcommand implementations.

pub mod call;
pub mod operations;

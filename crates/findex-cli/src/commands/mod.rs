//! Subcommand implementations.

pub mod config;
pub mod index;
pub mod interactive;
pub mod query;

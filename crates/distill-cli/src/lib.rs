//! Log distillation CLI library.
//!
//! This crate provides the CLI interface for distill.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, InputArgs};
pub use config::{Config, SchemaConfig};

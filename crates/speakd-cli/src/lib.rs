#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::build_deps;
pub use commands::{Commands, MergeVoicesArgs, ServeArgs};
pub use error::CliError;
pub use parser::Cli;

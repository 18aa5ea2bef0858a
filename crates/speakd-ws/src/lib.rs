#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by the integration tests
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use hound as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tokio_tungstenite as _;

pub mod bootstrap;
pub mod connection;
pub mod error;
pub mod handler;
pub mod routes;
pub mod shutdown;
pub mod state;

// Re-export primary types
pub use bootstrap::{ServerDeps, build_state, serve, serve_on};
pub use error::ServerError;
pub use handler::{HandlerPhase, ProtocolHandler};
pub use routes::create_router;
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
pub use state::{AppState, ServiceContext};

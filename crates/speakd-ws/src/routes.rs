//! Router.

use axum::Router;
use axum::routing::get;

use crate::connection::protocol_ws;
use crate::state::AppState;

/// Every path accepts the protocol upgrade.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(protocol_ws))
        .fallback(protocol_ws)
        .with_state(state)
}

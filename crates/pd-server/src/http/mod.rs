//! HTTP surface of the host

pub mod auth;

use std::sync::Arc;

use axum::Router;

use crate::gateway::transport;
use crate::state::ServerState;

/// Full HTTP router: unlock API plus the realtime endpoint
pub fn router(state: Arc<ServerState>) -> Router {
    let realtime = Arc::clone(&state.realtime);
    Router::new()
        .nest("/api/auth", auth::routes(state))
        .merge(transport::routes(realtime))
}

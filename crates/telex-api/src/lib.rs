pub mod channels;
pub mod error;
pub mod messages;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use telex_rtm::{ChannelRepository, RtmError};
use tracing::error;

use crate::error::ApiError;
use crate::middleware::require_credential;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub repo: ChannelRepository,
}

/// Channel reads are public; joining, leaving and posting need a bearer
/// credential.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/channels/{name}", get(channels::get_channel))
        .route("/channels/{name}/messages", get(messages::get_messages));

    let protected_routes = Router::new()
        .route("/channels/{name}/join", post(channels::join_channel))
        .route("/channels/{name}/leave", post(channels::leave_channel))
        .route("/channels/{name}/messages", post(messages::post_message))
        .layer(axum::middleware::from_fn(require_credential));

    public_routes.merge(protected_routes).with_state(state)
}

/// Runs a repository call off the async runtime; the stores block on SQLite.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&ChannelRepository) -> Result<T, RtmError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.repo))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

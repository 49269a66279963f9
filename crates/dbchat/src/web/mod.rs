//! The HTTP surface: a single-page chat UI and the JSON/SSE API behind it.

mod error;
mod handlers;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use error::ApiError;
pub use handlers::{MessageRequest, MessageResponse, SessionView};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/reset", post(handlers::reset_session))
        .route("/api/sessions/{id}/messages", post(handlers::post_message))
        .route(
            "/api/sessions/{id}/messages/stream",
            post(handlers::stream_message),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Library crate for the basic-auth session service
// This file exposes the public API for integration tests

pub mod config;
pub mod session;
pub mod shared;
pub mod user;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConfigError};
pub use session::{AuthenticatedUser, SessionClaims, TokenCodec, TokenError};
pub use shared::{AppError, AppState};

/// Builds the HTTP router; only `/protected` sits behind the session middleware
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/protected", any(session::protected_resource))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_auth,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/create", post(user::create_user))
        .route("/auth", post(session::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

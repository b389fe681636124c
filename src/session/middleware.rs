use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use super::{
    cookie::{session_cookie, session_token},
    types::AuthenticatedUser,
};
use crate::shared::{AppError, AppState};

/// Session cookie middleware - validates the `AuthToken` cookie, adds AuthenticatedUser to
/// the request and refreshes the cookie on the way out.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::session_auth))
/// Handlers can then extract Extension(user): Extension<AuthenticatedUser>.
#[instrument(skip(state, req, next))]
pub async fn session_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    info!(
        "Session authentication middleware triggered for request {}",
        req.uri()
    );

    let token = session_token(req.headers()).map_err(|e| {
        warn!("Rejecting request without a usable session cookie: {}", e);
        e
    })?;

    let claims = state.token_codec.validate(&token).map_err(|e| {
        warn!("Session token rejected: {}", e);
        AppError::Token(e)
    })?;

    // A failed refresh never blocks a request that has already been authenticated.
    let refreshed = match state.token_codec.issue(claims.user_id) {
        Ok(issued) => match session_cookie(&issued) {
            Ok(cookie) => Some(cookie),
            Err(e) => {
                warn!(user_id = claims.user_id, error = %e, "Refreshed token is not a valid cookie value");
                None
            }
        },
        Err(e) => {
            warn!(user_id = claims.user_id, error = %e, "Failed to refresh session token");
            None
        }
    };

    info!(
        user_id = claims.user_id,
        refreshed = refreshed.is_some(),
        "Authentication successful, adding user to request"
    );

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.user_id,
    });

    let mut response = next.run(req).await;
    if let Some(cookie) = refreshed {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

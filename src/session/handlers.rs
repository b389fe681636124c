use axum::{
    extract::{rejection::FormRejection, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Extension, Form,
};
use tracing::{error, info, instrument};

use super::{
    cookie::session_cookie,
    types::{AuthenticatedUser, CredentialsForm},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for logging in
///
/// POST /auth (form: username, password)
/// Sets the session cookie on success
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = CredentialsForm::or_empty(form);
    let user = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?;

    let issued = state.token_codec.issue(user.id).map_err(|e| {
        error!(error = %e, user_id = user.id, "Failed to issue session token");
        AppError::Token(e)
    })?;
    let cookie = session_cookie(&issued).map_err(|e| {
        error!(error = %e, "Session token is not a valid cookie value");
        AppError::Internal
    })?;

    info!(
        user_id = user.id,
        expires_at = %issued.expires_at,
        "Session created successfully"
    );

    Ok(([(SET_COOKIE, cookie)], "Successfully logged in").into_response())
}

/// The resource guarded by the session middleware
pub async fn protected_resource(Extension(user): Extension<AuthenticatedUser>) -> &'static str {
    info!(user_id = user.user_id, "Protected resource accessed");
    "Successfully accessed protected resource"
}

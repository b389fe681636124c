use axum::{extract::rejection::FormRejection, Form};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the cookie that carries the session token
pub const AUTH_COOKIE_NAME: &str = "AuthToken";

/// JWT claims structure carried inside every session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub exp: i64, // Expiration timestamp (standard JWT claim)
    #[serde(default)]
    pub iat: i64, // Issued at timestamp, optional on the wire
    pub iss: String,
}

/// Identity of the caller, inserted into request extensions by the session middleware.
/// Handlers behind the middleware extract it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

/// Form body shared by the registration and login endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    /// An unreadable body (wrong content type, bad encoding) counts as empty fields
    pub fn or_empty(form: Result<Form<CredentialsForm>, FormRejection>) -> Self {
        match form {
            Ok(Form(form)) => form,
            Err(rejection) => {
                debug!(error = %rejection, "Treating unreadable credentials form as empty");
                Self::default()
            }
        }
    }
}

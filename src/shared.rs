use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

use crate::session::TokenCodec;
use crate::session::TokenError;
use crate::user::{CredentialService, PasswordHasher, UserRepository};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub token_codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_codec: TokenCodec,
    ) -> Self {
        Self {
            credentials: Arc::new(CredentialService::new(user_repository, password_hasher)),
            token_codec: Arc::new(token_codec),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing session cookie")]
    MissingCredential,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Token(TokenError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            AppError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UserExists => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::PasswordHash(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            // A bare 401 tells the client to log in; there is nothing else to say.
            AppError::MissingCredential => String::new(),
            // Internal details stay in the logs.
            AppError::DatabaseError(_) | AppError::PasswordHash(_) => {
                AppError::Internal.to_string()
            }
            AppError::Token(TokenError::Signing(_)) => "Error generating token".to_string(),
            other => other.to_string(),
        };

        (status, body).into_response()
    }
}

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{NewUser, UserModel},
    password::PasswordHasher,
    repository::UserRepository,
};
use crate::shared::AppError;

/// Service for registering users and checking their credentials
pub struct CredentialService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CredentialService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self { repository, hasher }
    }

    /// Hashes the password and stores a new user record
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<UserModel, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password are required".to_string(),
            ));
        }

        if self.repository.find_by_username(username).await?.is_some() {
            warn!("Registration rejected, username taken");
            return Err(AppError::UserExists);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .repository
            .insert(&NewUser::new(username.to_string(), password_hash))
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Looks the user up and verifies the password against the stored digest.
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserModel, AppError> {
        let Some(user) = self.repository.find_by_username(username).await? else {
            info!("Login failed, unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(&user.password_hash, password).await? {
            info!(user_id = user.id, "Login failed, wrong password");
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = user.id, "Credentials verified");
        Ok(user)
    }
}

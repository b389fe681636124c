use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::shared::AppError;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Trait for one-way password hashing
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError>;
    async fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, AppError>;
}

/// bcrypt-backed password hasher.
/// The work runs on the blocking pool since a single hash takes tens of milliseconds.
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    #[instrument(skip(self, plaintext), fields(cost = self.cost))]
    async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AppError::PasswordHash(e.to_string()))?
            .map_err(|e| {
                warn!(error = %e, "Failed to hash password");
                AppError::PasswordHash(e.to_string())
            })
    }

    #[instrument(skip_all)]
    async fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, AppError> {
        let digest = digest.to_owned();
        let plaintext = plaintext.to_owned();

        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
            .await
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;

        // An unparseable stored digest can never match.
        Ok(outcome.unwrap_or_else(|e| {
            warn!(error = %e, "Stored password digest could not be checked");
            false
        }))
    }
}

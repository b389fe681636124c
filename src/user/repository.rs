use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, UserModel};
use crate::shared::AppError;

/// Trait for user record storage, keyed by username
#[async_trait]
pub trait UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    /// Stores a new user; fails with `AppError::UserExists` when the username is taken
    async fn insert(&self, user: &NewUser) -> Result<UserModel, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and will be lost when the application restarts.
pub struct InMemoryUserRepository {
    state: RwLock<InMemoryUsers>,
}

struct InMemoryUsers {
    next_id: i64,
    by_username: HashMap<String, UserModel>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InMemoryUsers {
                next_id: 1,
                by_username: HashMap::new(),
            }),
        }
    }

    /// Returns the current number of stored users
    pub async fn user_count(&self) -> usize {
        self.state.read().await.by_username.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let user = self.state.read().await.by_username.get(username).cloned();

        match &user {
            Some(u) => debug!(user_id = u.id, "User found in memory"),
            None => debug!("User not found in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: &NewUser) -> Result<UserModel, AppError> {
        let mut state = self.state.write().await;
        if state.by_username.contains_key(&user.username) {
            warn!("User already exists in memory");
            return Err(AppError::UserExists);
        }

        let model = UserModel {
            id: state.next_id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
            created_at: Utc::now(),
        };
        state.next_id += 1;
        state
            .by_username
            .insert(model.username.clone(), model.clone());

        debug!(user_id = model.id, "User created successfully in memory");
        Ok(model)
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the users table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create users table");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!("Users table is ready");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        debug!("Fetching user from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!("Creating user in database");

        let model = sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES ($1, $2, $3, $4)
             RETURNING id, username, password_hash, role, created_at",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                warn!("User already exists in database");
                AppError::UserExists
            }
            e => {
                warn!(error = %e, "Failed to create user in database");
                AppError::DatabaseError(e.to_string())
            }
        })?;

        debug!(user_id = model.id, "User created successfully in database");
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser::new(username.to_string(), "$2b$04$not-a-real-hash".to_string())
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let repo = InMemoryUserRepository::new();

        let stored = repo.insert(&new_user("alice")).await.unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(repo.user_count().await, 1);

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert_eq!(found.password_hash, stored.password_hash);
    }

    #[tokio::test]
    async fn test_find_unknown_user() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let repo = InMemoryUserRepository::new();

        let first = repo.insert(&new_user("alice")).await.unwrap();
        let second = repo.insert(&new_user("bob")).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&new_user("alice")).await.unwrap();

        let result = repo.insert(&new_user("alice")).await;
        assert!(matches!(result, Err(AppError::UserExists)));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&new_user("alice")).await.unwrap();

        assert!(repo.insert(&new_user("Alice")).await.is_ok());
        assert!(repo.find_by_username("ALICE").await.unwrap().is_none());
    }
}

// Public API - what other modules can use
pub use handlers::create_user;
pub use models::{NewUser, UserModel};
pub use password::{BcryptPasswordHasher, PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
pub use service::CredentialService;

// Internal modules
mod handlers;
pub mod models;
mod password;
pub mod repository;
pub mod service;

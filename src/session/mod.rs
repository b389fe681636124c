// Public API - what other modules can use
pub use handlers::{login, protected_resource};
pub use middleware::session_auth;
pub use token::{IssuedToken, TokenCodec, TokenError};
pub use types::{AuthenticatedUser, CredentialsForm, SessionClaims, AUTH_COOKIE_NAME};

// Internal modules
mod cookie;
mod handlers;
mod middleware;
mod token;
mod types;

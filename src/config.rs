use std::{fmt, net::SocketAddr, str::FromStr};
use thiserror::Error;

use crate::session::TokenCodec;
use crate::user::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};

pub const DEFAULT_ISSUER: &str = "basic-auth";
pub const DEFAULT_TOKEN_LIFETIME_HOURS: u32 = 24;
/// One hundred years
pub const MAX_TOKEN_LIFETIME_HOURS: u32 = 100 * 365 * 24;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Process-wide settings, read once at startup
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub token_lifetime_hours: u32,
    pub bcrypt_cost: u32,
    pub bind_addr: SocketAddr,
    /// Users are kept in memory when unset
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let token_lifetime_hours = parse_or(
            &lookup,
            "TOKEN_LIFETIME_HOURS",
            DEFAULT_TOKEN_LIFETIME_HOURS,
        )?;
        if !(1..=MAX_TOKEN_LIFETIME_HOURS).contains(&token_lifetime_hours) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_LIFETIME_HOURS",
                reason: format!("must be between 1 and {} hours", MAX_TOKEN_LIFETIME_HOURS),
            });
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("must be between {} and {}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            });
        }

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => parse_value("BIND_ADDR", &raw)?,
            None => parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        Ok(Self {
            jwt_secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            token_lifetime_hours,
            bcrypt_cost,
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        })
    }

    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(
            self.jwt_secret.as_bytes(),
            self.issuer.clone(),
            self.token_lifetime_hours,
        )
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_lifetime_hours", &self.token_lifetime_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .finish()
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use thiserror::Error;
use tracing::{debug, instrument};

use super::types::SessionClaims;

/// Failures produced while issuing or validating a session token
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("signature is invalid")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// A freshly signed token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 session tokens with a single static secret.
///
/// The codec is immutable after construction and is shared between requests
/// behind an `Arc` without any locking.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>, lifetime_hours: u32) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand against the caller's clock, with no leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.into(),
            lifetime: Duration::hours(i64::from(lifetime_hours)),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Signs a new token for an already authenticated user
    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    #[instrument(skip(self, now))]
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now.checked_add_signed(self.lifetime).ok_or_else(|| {
            TokenError::Signing("expiry is outside the representable time range".to_string())
        })?;

        debug!(
            lifetime_hours = self.lifetime.num_hours(),
            exp_timestamp = expires_at.timestamp(),
            "Creating session token"
        );

        let claims = SessionClaims {
            user_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                debug!(error = %e, "Failed to encode session token");
                TokenError::Signing(e.to_string())
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies the signature and expiry of a token and returns its claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    #[instrument(skip(self, token, now))]
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        // Structural problems are reported before the signature is looked at.
        decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode session token header");
            TokenError::Malformed(e.to_string())
        })?;
        check_segments(token)?;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Failed to decode session token");
                classify(e)
            })?;

        // Strictly before now; a token is still good during its final second.
        if claims.exp < now.timestamp() {
            debug!(
                user_id = claims.user_id,
                exp = claims.exp,
                now = now.timestamp(),
                "Session token has expired"
            );
            return Err(TokenError::Expired);
        }

        debug!(
            user_id = claims.user_id,
            exp = claims.exp,
            iss = %claims.iss,
            "Session token validated"
        );
        Ok(claims)
    }
}

/// Every segment must be valid base64url before the HMAC is checked
fn check_segments(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    for (name, segment) in [("claims", segments[1]), ("signature", segments[2])] {
        URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
            debug!(error = %e, segment = name, "Session token segment is not base64url");
            TokenError::Malformed(format!("{} segment: {}", name, e))
        })?;
    }
    Ok(())
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => TokenError::MalformedClaims(err.to_string()),
        _ => TokenError::Malformed(err.to_string()),
    }
}

//! Bearer tokens.
//!
//! Access and refresh tokens are HS256 [JWT]s signed with the configured
//! secret. Both carry the same claims; `kind` keeps one from being accepted
//! where the other is expected.
//!
//! [JWT]: https://www.rfc-editor.org/rfc/rfc7519.html

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use store_ratings_core::{Role, UserId};

/// Errors from minting or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The signing secret cannot key an HMAC.
    #[error("invalid signing key: {0}")]
    Key(#[from] hmac::digest::InvalidLength),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Sign(#[source] jwt::Error),

    /// Malformed token or bad signature.
    #[error("token verification failed: {0}")]
    Invalid(#[source] jwt::Error),

    /// The token's expiry has passed.
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    /// Issue time plus the configured lifetime is not a representable instant.
    #[error("token expiry overflows")]
    ExpiryOverflow,

    /// A refresh token was presented as an access token or vice versa.
    #[error("expected {expected:?} token, got {actual:?}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
}

/// Which of the two tokens this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserId,
    /// The role at issue time. Informational only: the role used for
    /// authorization is always re-read from the user row.
    pub role: Role,
    pub kind: TokenKind,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
    pub jti: Uuid,
}

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and verifies tokens with one HMAC key.
#[derive(Clone)]
pub struct TokenService {
    key: Hmac<Sha256>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("key", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the secret cannot key an HMAC.
    pub fn new(
        secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let key = Hmac::new_from_slice(secret.expose_secret().as_bytes())?;
        Ok(Self {
            key,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Issue an access token and a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if signing fails.
    pub fn issue_pair(&self, user: UserId, role: Role) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user, role, TokenKind::Access)?,
            refresh_token: self.issue(user, role, TokenKind::Refresh)?,
        })
    }

    /// Issue a single token of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if signing fails and
    /// `TokenError::ExpiryOverflow` if the lifetime runs past the calendar.
    pub fn issue(&self, user: UserId, role: Role, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::ExpiryOverflow)?;
        let claims = Claims {
            sub: user,
            role,
            kind,
            iat: now,
            exp,
            jti: Uuid::new_v4(),
        };
        claims.sign_with_key(&self.key).map_err(TokenError::Sign)
    }

    /// Verify a token's signature, expiry and kind.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature or malformed token,
    /// `TokenError::Expired` once `exp` has passed and `TokenError::WrongKind`
    /// when the token is not of kind `expected`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims: Claims = token
            .verify_with_key(&self.key)
            .map_err(TokenError::Invalid)?;

        if claims.exp <= Utc::now() {
            return Err(TokenError::Expired(claims.exp));
        }
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }
}

//! Session token minting and verification.
//!
//! # Purpose
//! OTP delivery and anonymous sign-in happen in an external auth service. That
//! service hands clients an HS256 session JWT; this module checks it and turns
//! its claims into a [`SessionIdentity`] for the identity resolver.
//!
//! # Key invariants
//! - Only HS256 tokens with the configured `iss` are accepted.
//! - `exp` is enforced with a configurable clock-skew leeway.
//! - Nothing derived from the token is cached; callers verify per request.
//!
//! # Security model
//! - The shared secret never leaves [`SessionVerifier`] and is never logged.
//! - Session tokens themselves must not appear in logs either.
//!
//! # Examples
//! ```rust
//! use enforcer::auth::session::{SessionClaims, SessionVerifier};
//! use std::time::Duration;
//!
//! let verifier = SessionVerifier::new(b"0123456789abcdef0123", "emilock-auth", 5);
//! let token = verifier
//!     .mint_session(SessionClaims::phone("+918077550043"), Duration::from_secs(60))
//!     .expect("mint");
//! let identity = verifier.verify_session(&token).expect("verify");
//! assert_eq!(identity.phone.as_deref(), Some("+918077550043"));
//! ```
use crate::config::SessionConfig;
use axum::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(default)]
    pub iss: String,
    pub sub: String,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionClaims {
    /// Claims for a phone-number (OTP) session.
    pub fn phone(phone: &str) -> Self {
        Self {
            sub: format!("phone:{phone}"),
            phone_number: Some(phone.to_string()),
            ..Self::blank()
        }
    }

    /// Claims for an email session.
    pub fn email(email: &str) -> Self {
        Self {
            sub: format!("email:{email}"),
            email: Some(email.to_string()),
            ..Self::blank()
        }
    }

    /// Claims for an anonymous session.
    pub fn anonymous(subject: &str) -> Self {
        Self {
            sub: subject.to_string(),
            anonymous: true,
            ..Self::blank()
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    fn blank() -> Self {
        Self {
            iss: String::new(),
            sub: String::new(),
            exp: 0,
            iat: 0,
            phone_number: None,
            email: None,
            anonymous: false,
            role: None,
        }
    }
}

/// Verified session attributes handed to the identity resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub subject: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub anonymous: bool,
    pub role_claim: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Verifies (and, for tooling, mints) session tokens.
///
/// Constructed once at startup and shared through application state.
#[derive(Clone)]
pub struct SessionVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    leeway: u64,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl SessionVerifier {
    pub fn new(secret: &[u8], issuer: &str, leeway: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            leeway,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.secret.as_bytes(), &config.issuer, config.leeway_secs)
    }

    /// Sign `claims` with this verifier's issuer and a fresh `iat`/`exp`.
    pub fn mint_session(
        &self,
        mut claims: SessionClaims,
        ttl: Duration,
    ) -> Result<String, SessionError> {
        let now = now_epoch_seconds();
        claims.iss = self.issuer.clone();
        claims.iat = now;
        claims.exp = now + ttl.as_secs() as i64;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionIdentity, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = self.leeway;
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)?;
        let claims = data.claims;
        Ok(SessionIdentity {
            subject: claims.sub,
            phone: claims.phone_number.filter(|p| !p.trim().is_empty()),
            email: claims.email.filter(|e| !e.trim().is_empty()),
            anonymous: claims.anonymous,
            role_claim: claims.role,
        })
    }

    /// Verify the `Authorization: Bearer` session carried by a request.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<SessionIdentity, SessionError> {
        let token = extract_bearer(headers).ok_or(SessionError::Missing)?;
        self.verify_session(token)
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}

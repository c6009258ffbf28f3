//! Credential state and bearer-token inspection.
//!
//! Three usable credential states exist: username/password only, token only,
//! or both with the token preferred. Token payloads are decoded without
//! signature verification; the issuing endpoint is trusted.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Months, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Credential set read from the configuration store.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Account username for Basic auth.
    pub username: Option<String>,
    /// Account password for Basic auth; erased once a token is issued.
    pub password: Option<SecretString>,
    /// Bearer token, preferred over Basic auth when present.
    pub token: Option<String>,
}

impl Credentials {
    /// Username/password credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
            token: None,
        }
    }

    /// Token-only credentials.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            token: Some(token.into()),
        }
    }

    /// True when a complete username/password pair is present.
    #[must_use]
    pub fn has_basic(&self) -> bool {
        matches!((&self.username, &self.password), (Some(u), Some(_)) if !u.is_empty())
    }

    /// Builds the `Authorization` header value: `Bearer <token>` when a
    /// token is set, else `Basic base64(username:password)`.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigurationRequired`] when neither credential form is
    /// usable; the caller should direct the operator to configuration
    /// instead of attempting a request.
    pub fn auth_header(&self) -> Result<String> {
        if let Some(token) = &self.token {
            if !token.is_empty() {
                return Ok(format!("Bearer {token}"));
            }
        }
        if self.has_basic() {
            let username = self.username.as_deref().unwrap_or_default();
            let password = self.password.as_ref().map(ExposeSecret::expose_secret);
            let pair = format!("{username}:{}", password.unwrap_or_default());
            return Ok(format!("Basic {}", STANDARD.encode(pair)));
        }
        Err(Error::ConfigurationRequired)
    }
}

/// Extracts the `exp` timestamp from a JWT without verifying its signature.
///
/// Only the payload segment is inspected.
///
/// # Errors
///
/// [`Error::MalformedResponse`] when the token is not a decodable JWT or
/// carries no `exp` claim.
pub fn token_expiry(token: &str) -> Result<DateTime<Utc>> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::MalformedResponse("token has no payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD.decode(payload))
        .map_err(|e| Error::MalformedResponse(format!("token payload is not base64: {e}")))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedResponse(format!("token payload is not JSON: {e}")))?;
    let exp = claims
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| Error::MalformedResponse("token payload has no exp claim".to_string()))?;
    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| Error::MalformedResponse(format!("token exp {exp} is out of range")))
}

/// True when the token expires within the next `months` months.
///
/// # Errors
///
/// Propagates [`token_expiry`] failures.
pub fn expires_within(token: &str, months: u32) -> Result<bool> {
    let expiry = token_expiry(token)?;
    let horizon = Utc::now()
        .checked_add_months(Months::new(months))
        .ok_or_else(|| Error::Config(format!("lookahead of {months} months overflows")))?;
    Ok(expiry < horizon)
}

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::{RisError, Result};

/// Seconds shaved off `expires_in` to allow for latency.
pub const LATENCY_BUFFER_SECS: i64 = 120;

/// A bearer token from the gateway's auth endpoint.
///
/// The usable-until instant is fixed when the token is built.
#[derive(Clone)]
pub struct BearerToken {
    access_token: Zeroizing<String>,
    token_type: String,
    scope: String,
    created_at: DateTime<Utc>,
    usable_until: DateTime<Utc>,
}

impl BearerToken {
    /// Build a token issued at `created_at` and valid for `expires_in_secs`.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in_secs: i64,
        scope: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let lifetime = expires_in_secs.clamp(0, i64::from(u32::MAX)) - LATENCY_BUFFER_SECS;
        Self {
            access_token: Zeroizing::new(access_token.into()),
            token_type: token_type.into(),
            scope: scope.into(),
            created_at,
            usable_until: created_at + Duration::seconds(lifetime),
        }
    }

    /// Decode an auth endpoint JSON response received at `created_at`.
    pub fn from_json(body: &str, created_at: DateTime<Utc>) -> Result<Self> {
        let response: TokenResponse = serde_json::from_str(body)?;
        let expires_in = response.expires_in.seconds()?;
        Ok(Self::new(
            response.access_token,
            response.token_type,
            expires_in,
            response.scope,
            created_at,
        ))
    }

    /// Token type, usually `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Granted scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// When the token was received.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last instant the token may be used.
    pub fn usable_until(&self) -> DateTime<Utc> {
        self.usable_until
    }

    /// Whether the token stays usable beyond `now + margin`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.usable_until > now + margin
    }

    /// Whether the token is still usable at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.usable_until > now
    }

    /// `Authorization` header value: `<type> <token>`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.as_str())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .field("usable_until", &self.usable_until)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: ExpiresIn,
    #[serde(default)]
    scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// `expires_in` arrives either as a number or as a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Number(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<i64> {
        match self {
            Self::Number(secs) => Ok(*secs),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| RisError::Decode(format!("expires_in is not a number: {:?}", text))),
        }
    }
}

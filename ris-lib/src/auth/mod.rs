//! Bearer token acquisition and caching for the gateway mode.
//!
//! [`BearerTokenCache`] is shared by every client talking to the gateway.
//! Readers take a read lock and never block each other. A stale token is
//! refreshed by exactly one caller at a time; the rest wait on the refresh
//! lock and pick up the new token on the re-check.

mod token;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

pub use token::{BearerToken, LATENCY_BUFFER_SECS};

use crate::transport::ConnectionPool;
use crate::{RisError, Result};

/// OAuth2 scope requested from the auth endpoint.
pub const AUTH_SCOPE: &str = "k1_integration_api";

/// Default margin a cached token must stay usable beyond now.
pub const DEFAULT_FRESHNESS_MARGIN_SECS: i64 = 60;

/// Source of fresh bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a new token. Failures are returned as is and never retried.
    async fn fetch_token(&self) -> Result<BearerToken>;
}

/// Client-credentials grant against the gateway's auth endpoint.
pub struct ClientCredentialsSource {
    pool: ConnectionPool,
    auth_endpoint: String,
    api_key: Zeroizing<String>,
}

impl ClientCredentialsSource {
    /// Create a source posting to `auth_endpoint` with the gateway API key.
    pub fn new(pool: ConnectionPool, auth_endpoint: impl Into<String>, api_key: &str) -> Self {
        Self {
            pool,
            auth_endpoint: auth_endpoint.into(),
            api_key: Zeroizing::new(api_key.to_string()),
        }
    }
}

impl std::fmt::Debug for ClientCredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsSource")
            .field("auth_endpoint", &self.auth_endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsSource {
    async fn fetch_token(&self) -> Result<BearerToken> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("scope", AUTH_SCOPE)
            .finish();
        let headers = [("Authorization", format!("Basic {}", self.api_key.as_str()))];

        let reply = self
            .pool
            .post_form(
                &self.auth_endpoint,
                &headers,
                "application/x-www-form-urlencoded",
                body,
            )
            .await?;

        if reply.status >= 400 {
            return Err(RisError::HttpStatus {
                target: self.auth_endpoint.clone(),
                status: reply.status,
                body: reply.body,
            });
        }
        BearerToken::from_json(&reply.body, Utc::now())
    }
}

/// Observable cache state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// A token usable beyond the margin is cached.
    Fresh,
    /// No token, or the cached one is within the margin of expiry.
    Stale,
}

/// Shared bearer token cache with single-flight refresh.
pub struct BearerTokenCache {
    source: Arc<dyn TokenSource>,
    slot: RwLock<Option<Arc<BearerToken>>>,
    refresh: Mutex<()>,
}

impl BearerTokenCache {
    /// Create an empty cache over a token source.
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Default freshness margin.
    pub fn default_margin() -> Duration {
        Duration::seconds(DEFAULT_FRESHNESS_MARGIN_SECS)
    }

    async fn fresh(&self, margin: Duration) -> Option<Arc<BearerToken>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|token| token.is_fresh_at(Utc::now(), margin))
            .cloned()
    }

    /// Current state for the given margin.
    pub async fn state(&self, margin: Duration) -> CacheState {
        if self.fresh(margin).await.is_some() {
            CacheState::Fresh
        } else {
            CacheState::Stale
        }
    }

    /// The cached token, fresh or not.
    pub async fn current(&self) -> Option<Arc<BearerToken>> {
        self.slot.read().await.clone()
    }

    /// Install a token unless the cached one stays usable at least as long.
    ///
    /// Returns whether the token was installed.
    pub async fn install(&self, token: BearerToken) -> bool {
        let mut slot = self.slot.write().await;
        match slot.as_ref() {
            Some(cached) if cached.usable_until() >= token.usable_until() => {
                warn!(
                    cached_until = %cached.usable_until(),
                    received_until = %token.usable_until(),
                    "New auth token expires before the cached one, keeping the cached token"
                );
                false
            }
            _ => {
                debug!(usable_until = %token.usable_until(), "Installed auth token");
                *slot = Some(Arc::new(token));
                true
            }
        }
    }

    /// Return a token usable beyond `now + margin`, refreshing if needed.
    ///
    /// At most one refresh runs at a time. A failed refresh leaves the cache
    /// untouched and the error goes to the caller that ran it.
    #[instrument(skip(self, margin), fields(margin_secs = margin.num_seconds()))]
    pub async fn get_valid_token(&self, margin: Duration) -> Result<Arc<BearerToken>> {
        if let Some(token) = self.fresh(margin).await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(token) = self.fresh(margin).await {
            debug!("Token refreshed by a concurrent caller");
            return Ok(token);
        }

        let token = self.source.fetch_token().await.map_err(|e| {
            warn!(error = %e, "Auth token refresh failed");
            e
        })?;
        info!(usable_until = %token.usable_until(), "Fetched new auth token");
        self.install(token).await;

        match self.current().await {
            Some(token) if token.is_usable_at(Utc::now()) => Ok(token),
            _ => Err(RisError::Transport(
                "auth endpoint returned a token that is already expired".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for BearerTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        expires_in: i64,
        fail: bool,
    }

    impl CountingSource {
        fn new(expires_in: i64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                expires_in,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                expires_in: 0,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<BearerToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail {
                return Err(RisError::HttpStatus {
                    target: "auth".to_string(),
                    status: 401,
                    body: String::new(),
                });
            }
            Ok(BearerToken::new(
                format!("token-{}", n),
                "Bearer",
                self.expires_in,
                AUTH_SCOPE,
                Utc::now(),
            ))
        }
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let source = CountingSource::new(1200);
        let cache = BearerTokenCache::new(source.clone());
        let margin = BearerTokenCache::default_margin();

        assert_eq!(cache.state(margin).await, CacheState::Stale);
        let first = cache.get_valid_token(margin).await.unwrap();
        let second = cache.get_valid_token(margin).await.unwrap();
        assert_eq!(first.authorization(), second.authorization());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(margin).await, CacheState::Fresh);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_refresh() {
        let source = CountingSource::new(1200);
        let cache = Arc::new(BearerTokenCache::new(source.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .get_valid_token(BearerTokenCache::default_margin())
                        .await
                        .map(|t| t.authorization())
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "Bearer token-0");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_older_token_never_replaces_newer() {
        let cache = BearerTokenCache::new(CountingSource::new(1200));
        let now = Utc::now();
        assert!(cache.install(BearerToken::new("late", "Bearer", 3600, "", now)).await);
        assert!(!cache.install(BearerToken::new("early", "Bearer", 1200, "", now)).await);
        assert!(!cache.install(BearerToken::new("same", "Bearer", 3600, "", now)).await);
        assert_eq!(cache.current().await.unwrap().authorization(), "Bearer late");
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_unchanged() {
        let cache = BearerTokenCache::new(CountingSource::failing());
        let now = Utc::now();
        // Usable for 30 more seconds, inside the 60 second margin.
        cache
            .install(BearerToken::new("old", "Bearer", 150, "", now))
            .await;

        let err = cache
            .get_valid_token(BearerTokenCache::default_margin())
            .await
            .unwrap_err();
        assert!(matches!(err, RisError::HttpStatus { status: 401, .. }));
        assert_eq!(cache.current().await.unwrap().authorization(), "Bearer old");
    }

    #[tokio::test]
    async fn test_already_expired_token_is_an_error() {
        let cache = BearerTokenCache::new(CountingSource::new(60));
        let err = cache
            .get_valid_token(BearerTokenCache::default_margin())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_cancelled_refresh_releases_lock() {
        let source = CountingSource::new(1200);
        let cache = Arc::new(BearerTokenCache::new(source.clone()));
        let margin = BearerTokenCache::default_margin();

        let pending = cache.get_valid_token(margin);
        let _ = tokio::time::timeout(std::time::Duration::from_millis(1), pending).await;

        let token = cache.get_valid_token(margin).await.unwrap();
        assert!(token.is_fresh_at(Utc::now(), margin));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}

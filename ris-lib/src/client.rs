//! RIS protocol client.
//!
//! [`RisClient::exchange`] posts a field map and decodes the reply. Two
//! authentication modes exist:
//!
//! - [`Mode::DirectApiKey`]: `X-Kount-Api-Key` against the RIS endpoint.
//! - [`Mode::GatewayBearer`]: a cached bearer token against the gateway, with
//!   `MERC` replaced by the gateway client id.
//!
//! Clients are cheap to clone. Clones share the obfuscator, the connection
//! pool and the token cache.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::auth::{BearerTokenCache, ClientCredentialsSource};
use crate::codec::{encode_fields, parse_response, Charset, FieldMap, Response, MERC};
use crate::config::RisConfig;
use crate::khash::Khash;
use crate::request::Request;
use crate::transport::ConnectionPool;
use crate::{RisError, Result};

/// Header carrying the API key in direct mode.
pub const API_KEY_HEADER: &str = "X-Kount-Api-Key";
/// Header carrying the merchant id.
pub const MERCHANT_ID_HEADER: &str = "X-Kount-Merc-Id";

/// How requests are authenticated and where they go.
#[derive(Clone)]
pub enum Mode {
    /// API key header against the RIS endpoint.
    DirectApiKey {
        /// RIS endpoint.
        url: String,
        /// API key.
        api_key: Arc<Zeroizing<String>>,
    },
    /// Bearer token against the gateway endpoint.
    GatewayBearer {
        /// Gateway RIS endpoint.
        url: String,
        /// Client id sent as `MERC` and `X-Kount-Merc-Id`.
        client_id: String,
        /// Shared token cache.
        cache: Arc<BearerTokenCache>,
        /// Freshness margin for cached tokens.
        margin: Duration,
    },
}

impl Mode {
    /// Endpoint requests are posted to.
    pub fn url(&self) -> &str {
        match self {
            Self::DirectApiKey { url, .. } | Self::GatewayBearer { url, .. } => url,
        }
    }

    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectApiKey { .. } => "direct",
            Self::GatewayBearer { .. } => "gateway",
        }
    }
}

impl std::fmt::Debug for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectApiKey { url, .. } => f
                .debug_struct("DirectApiKey")
                .field("url", url)
                .finish_non_exhaustive(),
            Self::GatewayBearer {
                url,
                client_id,
                margin,
                ..
            } => f
                .debug_struct("GatewayBearer")
                .field("url", url)
                .field("client_id", client_id)
                .field("margin", margin)
                .finish_non_exhaustive(),
        }
    }
}

/// Client for the RIS service.
#[derive(Clone, Debug)]
pub struct RisClient {
    mode: Mode,
    khash: Arc<Khash>,
    pool: ConnectionPool,
    charset: Charset,
}

/// Builder for [`RisClient`] with injectable shared handles.
#[derive(Debug)]
pub struct RisClientBuilder {
    config: RisConfig,
    khash: Option<Arc<Khash>>,
    pool: Option<ConnectionPool>,
    token_cache: Option<Arc<BearerTokenCache>>,
}

impl RisClientBuilder {
    /// Use an existing obfuscator instead of decoding the configured key.
    pub fn khash(mut self, khash: Arc<Khash>) -> Self {
        self.khash = Some(khash);
        self
    }

    /// Use an existing connection pool.
    pub fn pool(mut self, pool: ConnectionPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Use an existing token cache in migration mode.
    pub fn token_cache(mut self, cache: Arc<BearerTokenCache>) -> Self {
        self.token_cache = Some(cache);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<RisClient> {
        let config = self.config;
        config.validate()?;

        let khash = match self.khash {
            Some(khash) => khash,
            None => Arc::new(config.khash()?),
        };
        let pool = match self.pool {
            Some(pool) => pool,
            None => ConnectionPool::new(config.pool.clone())?,
        };

        let mode = if config.migration_mode_enabled {
            let gateway = &config.gateway;
            let cache = self.token_cache.unwrap_or_else(|| {
                Arc::new(BearerTokenCache::new(Arc::new(ClientCredentialsSource::new(
                    pool.clone(),
                    gateway.auth_endpoint.clone(),
                    &gateway.api_key,
                ))))
            });
            Mode::GatewayBearer {
                url: gateway.api_endpoint.clone(),
                client_id: gateway.client_id.clone(),
                cache,
                margin: Duration::seconds(gateway.freshness_margin_secs),
            }
        } else {
            Mode::DirectApiKey {
                url: config.ris_url.clone(),
                api_key: Arc::new(Zeroizing::new(config.api_key.clone())),
            }
        };

        debug!(mode = mode.name(), url = mode.url(), "Built RIS client");
        Ok(RisClient {
            mode,
            khash,
            pool,
            charset: Charset::from_force_utf8(config.force_utf8),
        })
    }
}

impl RisClient {
    /// Build a client from configuration with fresh shared handles.
    pub fn new(config: RisConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start a builder to inject shared handles.
    pub fn builder(config: RisConfig) -> RisClientBuilder {
        RisClientBuilder {
            config,
            khash: None,
            pool: None,
            token_cache: None,
        }
    }

    /// Authentication mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Obfuscator used for payment tokens.
    pub fn khash(&self) -> &Arc<Khash> {
        &self.khash
    }

    /// Body charset.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Obfuscate the request's payment and send it.
    pub async fn process(&self, request: &Request) -> Result<Response> {
        let fields = request.to_fields(&self.khash)?;
        self.exchange(&fields).await
    }

    /// Send fields to RIS and decode the response.
    ///
    /// Works on a copy of `fields`; the caller's map is never modified.
    #[instrument(skip_all, fields(mode = self.mode.name()))]
    pub async fn exchange(&self, fields: &FieldMap) -> Result<Response> {
        let mut fields = fields.clone();

        let headers = match &self.mode {
            Mode::DirectApiKey { api_key, .. } => {
                let merchant_id = fields.get(MERC).unwrap_or_default().to_string();
                vec![
                    (API_KEY_HEADER, api_key.as_str().to_string()),
                    (MERCHANT_ID_HEADER, merchant_id),
                ]
            }
            Mode::GatewayBearer {
                client_id,
                cache,
                margin,
                ..
            } => {
                let token = cache.get_valid_token(*margin).await?;
                fields.set(MERC, client_id.as_str());
                vec![
                    ("Authorization", token.authorization()),
                    (MERCHANT_ID_HEADER, client_id.clone()),
                ]
            }
        };

        let url = self.mode.url();
        let body = encode_fields(fields, self.charset);
        debug!(url, bytes = body.len(), "Sending RIS request");

        let reply = self
            .pool
            .post_form(url, &headers, self.charset.content_type(), body)
            .await?;
        if !reply.is_success() {
            return Err(RisError::HttpStatus {
                target: url.to_string(),
                status: reply.status,
                body: reply.body,
            });
        }

        parse_response(reply.body.as_bytes())
    }
}

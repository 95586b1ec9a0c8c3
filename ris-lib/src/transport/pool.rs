use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use url::Url;

use super::PoolConfig;
use crate::{RisError, Result};

/// Status and body of an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpReply {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared, bounded HTTP connection pool.
///
/// Cloning is cheap; clones share connections and limits.
#[derive(Clone, Debug)]
pub struct ConnectionPool {
    client: reqwest::Client,
    config: PoolConfig,
    total: Arc<Semaphore>,
    routes: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl ConnectionPool {
    /// Build a pool from its settings.
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.max_connections == 0 || config.max_connections_per_route == 0 {
            return Err(RisError::configuration(
                "connection limits must be greater than zero",
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .pool_max_idle_per_host(config.max_connections_per_route)
            .pool_idle_timeout(Duration::from_millis(config.idle_timeout_ms))
            .build()
            .map_err(|e| RisError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            total: Arc::new(Semaphore::new(config.max_connections)),
            routes: Arc::new(Mutex::new(HashMap::new())),
            config,
        })
    }

    /// Pool settings.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    async fn route_permit(&self, route: String) -> Result<OwnedSemaphorePermit> {
        let semaphore = {
            let mut routes = self.routes.lock().await;
            routes
                .entry(route)
                .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_connections_per_route)))
                .clone()
        };
        semaphore
            .acquire_owned()
            .await
            .map_err(|e| RisError::Transport(format!("connection pool closed: {}", e)))
    }

    /// POST a form body and return the status and text body.
    ///
    /// Any status is returned as a reply. Only transport failures are errors.
    pub async fn post_form(
        &self,
        url: &str,
        headers: &[(&str, String)],
        content_type: &str,
        body: String,
    ) -> Result<HttpReply> {
        let route = route_key(url)?;

        // Route first, so a saturated route never holds a global slot.
        let _route = self.route_permit(route).await?;
        let _total = self
            .total
            .acquire()
            .await
            .map_err(|e| RisError::Transport(format!("connection pool closed: {}", e)))?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RisError::from_reqwest(e, url, self.config.read_timeout_ms))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RisError::from_reqwest(e, url, self.config.read_timeout_ms))?;

        debug!(url, status, bytes = body.len(), "POST completed");
        Ok(HttpReply { status, body })
    }
}

/// `scheme://host:port` of a URL, with the scheme's default port filled in.
fn route_key(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| RisError::configuration(format!("invalid endpoint URL {}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| RisError::configuration(format!("endpoint URL {} has no host", url)))?;
    let port = parsed.port_or_known_default().unwrap_or_default();
    Ok(format!("{}://{}:{}", parsed.scheme(), host, port))
}

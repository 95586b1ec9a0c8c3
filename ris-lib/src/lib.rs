//! RIS client library.
//!
//! Sends fraud-scoring inquiries and updates to the Kount RIS service and
//! decodes its responses.
//!
//! # Features
//!
//! - **Token obfuscation**: KHASH and MASK encodings of payment tokens, keyed by
//!   a fingerprint-verified configuration key
//! - **Wire codec**: form-urlencoded requests, `KEY=VALUE` responses with typed
//!   accessors for the indexed groups
//! - **Gateway auth**: a shared bearer token cache with single-flight refresh
//! - **Transport**: a bounded, shared HTTP connection pool
//!
//! # Example
//!
//! ```ignore
//! use ris_lib::prelude::*;
//!
//! let client = RisClient::new(RisConfig::from_env()?)?;
//!
//! let mut inquiry = Request::inquiry();
//! inquiry
//!     .set_merchant_id("999666")
//!     .set_session_id("8a5d2cfa0b3b4a0e")
//!     .set_total("5000")
//!     .set_payment(PaymentToken::card("4111111111111111"));
//!
//! let response = client.process(&inquiry).await?;
//! println!("{:?} scored {:?}", response.auto(), response.score());
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod khash;
pub mod payment;
pub mod prelude;
pub mod request;
pub mod transport;

pub use auth::{BearerToken, BearerTokenCache, CacheState, ClientCredentialsSource, TokenSource};
pub use client::{Mode, RisClient, RisClientBuilder};
pub use codec::{Charset, FieldMap, Response};
pub use config::{GatewayConfig, RisConfig};
pub use errors::{RisError, RisErrorCode};
pub use khash::{ConfigKey, Khash};
pub use payment::{PaymentToken, PaymentType};
pub use request::{CartItem, Request};
pub use transport::{ConnectionPool, HttpReply, PoolConfig};

/// Common result alias for RIS operations.
pub type Result<T> = std::result::Result<T, RisError>;

//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use ris_lib::prelude::*;
//! ```

// Client and configuration
pub use crate::client::{Mode, RisClient};
pub use crate::config::{GatewayConfig, RisConfig};
pub use crate::transport::PoolConfig;

// Requests and responses
pub use crate::codec::{FieldMap, KcEvent, Response, RuleTriggered};
pub use crate::payment::{PaymentToken, PaymentType};
pub use crate::request::{CartItem, Request};

// Error handling
pub use crate::errors::{RisError, RisErrorCode};
pub use crate::Result;

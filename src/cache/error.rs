//! Error types for cache construction and response production.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::coalesce::Abandoned;
use crate::handler::HandlerError;

/// Error type returned by a failing [`Store`](crate::cache::Store).
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Rejected cache configuration. Fatal at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cache ttl must be positive")]
    ZeroTtl,

    #[error("cache capacity must be positive")]
    ZeroCapacity,

    #[error("invalid cache configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure while producing a fresh snapshot for one key.
///
/// `Clone` so that a single failure reaches every caller coalesced on the key.
#[derive(Debug, Clone, Error)]
pub enum ProduceError {
    #[error("{0}")]
    Handler(Arc<dyn std::error::Error + Send + Sync + 'static>),

    #[error("storing response: {0}")]
    Store(Arc<dyn std::error::Error + Send + Sync + 'static>),

    #[error("{0}")]
    Abandoned(#[from] Abandoned),
}

impl ProduceError {
    pub(crate) fn handler(err: HandlerError) -> Self {
        Self::Handler(Arc::from(err))
    }

    pub(crate) fn store(err: StoreError) -> Self {
        Self::Store(Arc::from(err))
    }
}

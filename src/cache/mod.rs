//! Response caching: time-windowed keys, bounded storage, and coalesced
//! execution of the wrapped handler.
//!
//! ## Pieces
//!
//! - [`CacheProxy`]: the decorator; see its docs for the request flow.
//! - [`CacheKey`]: method + URL + TTL window index.
//! - [`Recorder`] / [`Snapshot`]: capture and replay of complete responses.
//! - [`Store`] / [`LruStore`]: bounded key → snapshot storage.
//! - [`Coalescer`]: at most one in-flight execution per key.
//! - [`Clock`]: wall-clock source; [`ManualClock`] for deterministic tests.

pub mod clock;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod key;
pub mod proxy;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coalesce::{Abandoned, Coalescer};
pub use config::CacheConfig;
pub use error::{ConfigError, ProduceError, StoreError};
pub use key::CacheKey;
pub use proxy::CacheProxy;
pub use snapshot::{Recorder, Snapshot, X_CACHE_DATE};
pub use store::{LruStore, Store};

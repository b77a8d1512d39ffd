//! The caching decorator placed in front of a [`Handler`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    CacheConfig, CacheKey, Clock, Coalescer, ConfigError, LruStore, ProduceError, Recorder,
    Snapshot, Store, SystemClock,
};
use crate::handler::{Handler, HandlerError, HandlerFuture};
use crate::http::{Request, Response, ResponseWriter, StatusCode};

/// Serves repeated requests from a time-windowed cache and collapses
/// concurrent misses for the same key into one call to the wrapped handler.
///
/// For every request:
///
/// 1. The [`CacheKey`] is derived from method, full URL, and the current TTL window.
/// 2. A stored [`Snapshot`] for that key is replayed as-is.
/// 3. Otherwise the wrapped handler runs once per key into a [`Recorder`].
///    `200 OK` answers to GET, HEAD, or OPTIONS get the cache headers
///    (`Cache-Control`, `Expires`, `X-Cache-Date`, no `Date`) and are stored.
/// 4. Every caller coalesced on the key replays the same snapshot.
///
/// A failing handler yields `500 Internal Server Error` with the failure's
/// description for every coalesced caller, and nothing is stored.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use cacheproxy::cache::{CacheConfig, CacheProxy};
/// use cacheproxy::handler::handler_fn;
/// use cacheproxy::http::{Response, StatusCode};
/// use cacheproxy::server::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let upstream = handler_fn(|_req| async {
///         Response::new(StatusCode::Ok).body("expensive")
///     });
///     let proxy = CacheProxy::new(CacheConfig::new(Duration::from_secs(30), 1024)?, upstream)?;
///
///     Server::bind("127.0.0.1:8080").await?.run(proxy).await?;
///     Ok(())
/// }
/// ```
pub struct CacheProxy<H> {
    config: CacheConfig,
    next: H,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    inflight: Coalescer<CacheKey, Arc<Snapshot>, ProduceError>,
}

impl<H: Handler> CacheProxy<H> {
    /// Wraps `next` with an in-memory LRU store sized by `config` and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` has a zero TTL or capacity.
    pub fn new(config: CacheConfig, next: H) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(config.capacity()).ok_or(ConfigError::ZeroCapacity)?;
        Self::with_parts(
            config,
            next,
            Arc::new(LruStore::new(capacity)),
            Arc::new(SystemClock),
        )
    }

    /// Wraps `next` with a caller-supplied store and clock.
    pub fn with_parts(
        config: CacheConfig,
        next: H,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            next,
            store,
            clock,
            inflight: Coalescer::new(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Handles one request, writing the (possibly cached) response into `w`.
    pub async fn handle(&self, req: &Request, w: &mut dyn ResponseWriter) {
        let key = CacheKey::for_request(req, self.clock.now(), self.config.ttl());

        if let Some(snapshot) = self.store.get(&key) {
            debug!(key = %key, "cache hit");
            snapshot.replay(w);
            return;
        }

        debug!(key = %key, "cache miss");
        let (result, shared) = self
            .inflight
            .run(key.clone(), || self.produce(req, key.clone()))
            .await;

        match result {
            Ok(snapshot) => {
                if shared {
                    debug!(key = %key, "served coalesced response");
                }
                snapshot.replay(w);
            }
            Err(err) => {
                warn!(key = %key, shared, error = %err, "upstream handler failed");
                write_error(w, &err);
            }
        }
    }

    /// Convenience form of [`handle`](Self::handle) that returns an owned [`Response`].
    pub async fn respond(&self, req: &Request) -> Response {
        let mut response = Response::default();
        self.handle(req, &mut response).await;
        response
    }

    async fn produce(&self, req: &Request, key: CacheKey) -> Result<Arc<Snapshot>, ProduceError> {
        let mut recorder = Recorder::new();
        self.next
            .serve(req, &mut recorder)
            .await
            .map_err(ProduceError::handler)?;
        let snapshot = recorder.finish();

        if snapshot.status() != StatusCode::Ok || !req.method().is_cache_safe() {
            return Ok(Arc::new(snapshot));
        }

        let snapshot = Arc::new(snapshot.into_cacheable(&self.config, self.clock.now()));
        self.store
            .put(key.clone(), Arc::clone(&snapshot))
            .map_err(ProduceError::store)?;
        debug!(key = %key, "response cached");
        Ok(snapshot)
    }
}

impl<H: Handler> Handler for CacheProxy<H> {
    fn serve<'a>(&'a self, req: &'a Request, w: &'a mut dyn ResponseWriter) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.handle(req, w).await;
            Ok::<(), HandlerError>(())
        })
    }
}

// Plain-text 500 carrying the failure description.
fn write_error(w: &mut dyn ResponseWriter, err: &ProduceError) {
    let headers = w.headers_mut();
    headers.set("Content-Type", "text/plain; charset=utf-8");
    headers.set("X-Content-Type-Options", "nosniff");
    w.write_header(StatusCode::InternalServerError);
    w.write(format!("{err}\n").as_bytes());
}

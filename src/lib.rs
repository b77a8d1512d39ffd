//! # cacheproxy
//!
//! A response cache placed in front of an async HTTP handler. Identical
//! requests in the same TTL window are answered from memory, and concurrent
//! misses for one key collapse into a single upstream call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cacheproxy::cache::{CacheConfig, CacheProxy};
//! use cacheproxy::handler::handler_fn;
//! use cacheproxy::server::Server;
//! use cacheproxy::http::{Request, Response, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upstream = handler_fn(|req: Request| async move {
//!         Response::new(StatusCode::Ok).body(format!("rendered {}", req.uri()))
//!     });
//!     let config = CacheConfig::new(Duration::from_secs(60), 10_000)?;
//!     let proxy = CacheProxy::new(config, upstream)?;
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://127.0.0.1:8080");
//!     server.run(proxy).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod handler;
pub mod http;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheConfig, CacheProxy};
pub use handler::{Handler, handler_fn};
pub use http::{Headers, Method, Request, Response, ResponseWriter, StatusCode};
pub use server::{Server, ServerError};

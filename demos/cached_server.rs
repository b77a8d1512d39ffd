//! Serves a deliberately slow handler behind a 10-second response cache.
//!
//! ```text
//! RUST_LOG=cacheproxy=debug cargo run --example cached_server
//! curl -i http://127.0.0.1:8080/time
//! ```

use std::time::{Duration, SystemTime};

use cacheproxy::cache::{CacheConfig, CacheProxy};
use cacheproxy::handler::handler_fn;
use cacheproxy::http::{Request, Response, StatusCode};
use cacheproxy::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let upstream = handler_fn(|req: Request| async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if req.path() != "/time" {
            return Response::new(StatusCode::NotFound).body("try /time");
        }
        Response::new(StatusCode::Ok)
            .header("Date", httpdate_now())
            .body(format!("{:?}\n", SystemTime::now()))
    });

    let config = CacheConfig::from_json(r#"{ "ttl": "10s", "capacity": 256 }"#)?;
    let proxy = CacheProxy::new(config, upstream)?;

    let server = Server::bind("127.0.0.1:8080").await?;
    println!("Listening on http://{}", server.local_addr());
    server.run(proxy).await?;
    Ok(())
}

fn httpdate_now() -> String {
    httpdate::fmt_http_date(SystemTime::now())
}

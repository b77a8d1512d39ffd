//! The handler seam: anything that can answer a [`Request`] by writing into a
//! [`ResponseWriter`].
//!
//! [`CacheProxy`](crate::cache::CacheProxy) both wraps a `Handler` and is one,
//! so proxies can be served directly by [`Server`](crate::server::Server) or
//! placed in front of each other.

use std::future::Future;
use std::pin::Pin;

use crate::http::{Request, Response, ResponseWriter};

/// Error type returned by a failing [`Handler`].
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed future returned by [`Handler::serve`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>>;

/// An async request handler that writes its response into a sink.
///
/// The handler cannot tell whether `w` is the real connection sink or a
/// buffering recorder; it must only use the [`ResponseWriter`] contract.
///
/// # Examples
///
/// ```rust
/// use cacheproxy::handler::{Handler, HandlerError, HandlerFuture};
/// use cacheproxy::http::{Request, ResponseWriter, StatusCode};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn serve<'a>(&'a self, _req: &'a Request, w: &'a mut dyn ResponseWriter) -> HandlerFuture<'a> {
///         Box::pin(async move {
///             w.headers_mut().insert("Content-Type", "text/plain");
///             w.write_header(StatusCode::Ok);
///             w.write(b"hello");
///             Ok::<(), HandlerError>(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Handle `req`, writing status, headers, and body into `w`.
    ///
    /// Returning `Err` signals that no usable response was produced.
    fn serve<'a>(&'a self, req: &'a Request, w: &'a mut dyn ResponseWriter) -> HandlerFuture<'a>;
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn serve<'a>(&'a self, req: &'a Request, w: &'a mut dyn ResponseWriter) -> HandlerFuture<'a> {
        (**self).serve(req, w)
    }
}

/// Adapter returned by [`handler_fn`].
pub struct FnHandler<T> {
    f: T,
}

/// Wraps a builder-style async function `Fn(Request) -> impl Future<Output = Response>`
/// into a [`Handler`].
///
/// The function receives its own copy of the request; the [`Response`] it
/// returns is copied into the sink header-by-header, then status, then body.
///
/// # Examples
///
/// ```rust
/// use cacheproxy::handler::handler_fn;
/// use cacheproxy::http::{Response, StatusCode};
///
/// let handler = handler_fn(|req| async move {
///     Response::new(StatusCode::Ok).body(format!("you asked for {}", req.path()))
/// });
/// ```
pub fn handler_fn<T, F>(f: T) -> FnHandler<T>
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    FnHandler { f }
}

impl<T, F> Handler for FnHandler<T>
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn serve<'a>(&'a self, req: &'a Request, w: &'a mut dyn ResponseWriter) -> HandlerFuture<'a> {
        let fut = (self.f)(req.clone());
        Box::pin(async move {
            fut.await.write_to(w);
            Ok::<(), HandlerError>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn fn_handler_writes_into_sink() {
        let handler = handler_fn(|req: Request| async move {
            Response::new(StatusCode::Accepted)
                .header("X-Path", req.path())
                .body("queued")
        });

        let req = Request::new(Method::Post, "/jobs?x=1");
        let mut sink = Response::default();
        handler.serve(&req, &mut sink).await.unwrap();

        assert_eq!(sink.status(), StatusCode::Accepted);
        assert_eq!(sink.headers().get("x-path"), Some("/jobs"));
        assert_eq!(sink.content(), b"queued");
    }

    #[tokio::test]
    async fn arc_forwards_to_inner() {
        let handler: Arc<dyn Handler> =
            Arc::new(handler_fn(|_req| async { Response::new(StatusCode::NoContent) }));
        let mut sink = Response::default();
        handler
            .serve(&Request::new(Method::Get, "/"), &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.status(), StatusCode::NoContent);
    }
}

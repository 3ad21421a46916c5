pub mod router;
mod sink;

use std::io;

use crate::http::request::HttpRequest;

pub use self::router::{RouteMiss, RouteTable};
pub use self::sink::ResponseSink;

/// Application code bound to a `(method, path)` pair.
///
/// The server never looks at what a handler writes. A handler that returns an
/// error has its partial output discarded and the connection is dropped.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: HttpRequest, out: &mut ResponseSink) -> io::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(HttpRequest, &mut ResponseSink) -> io::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, request: HttpRequest, out: &mut ResponseSink) -> io::Result<()> {
        (self)(request, out)
    }
}

//! A small concurrent HTTP/1.1 server.
//!
//! Each connection carries exactly one `GET` or `POST` request. The request is
//! parsed from a fixed-size buffer, routed by exact `(method, path)` and handed
//! to a registered [`Handler`]. Malformed requests get a `400`, unrouted ones a
//! `404`, and the connection is closed either way.

pub mod config;
pub mod handler;
pub mod http;
pub mod net;

pub use config::{ConfigError, ServerConfig};
pub use handler::{Handler, ResponseSink, RouteMiss, RouteTable};
pub use http::HttpMethod;
pub use http::request::HttpRequest;
pub use net::server::Server;

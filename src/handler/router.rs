//! Route table shared by every worker.
//!
//! Routes are keyed by exact method and exact path: no patterns, no
//! trailing-slash normalisation. Both levels are [`DashMap`]s, so lookups from
//! workers and late registrations need no external lock.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::handler::Handler;
use crate::http::HttpMethod;

/// Why a lookup failed. Both cases are answered with the same `404`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RouteMiss {
    #[error("no route registered for method")]
    Method,

    #[error("no route registered for path")]
    Path,
}

#[derive(Default)]
pub struct RouteTable {
    routes: DashMap<HttpMethod, DashMap<String, Arc<dyn Handler>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `(method, path)`, replacing any previous one.
    pub fn register<H>(&self, method: HttpMethod, path: impl Into<String>, handler: H)
    where
        H: Handler,
    {
        let path = path.into();
        let handler: Arc<dyn Handler> = Arc::new(handler);

        let paths = self.routes.entry(method).or_default();
        if paths.insert(path.clone(), handler).is_some() {
            tracing::debug!(%method, %path, "replaced existing handler");
        }
    }

    /// Finds the handler for `(method, path)`.
    pub fn lookup(&self, method: HttpMethod, path: &str) -> Result<Arc<dyn Handler>, RouteMiss> {
        let paths = self.routes.get(&method).ok_or(RouteMiss::Method)?;
        paths
            .get(path)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RouteMiss::Path)
    }

    /// Number of registered `(method, path)` pairs.
    pub fn len(&self) -> usize {
        self.routes.iter().map(|paths| paths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.len())
            .finish()
    }
}

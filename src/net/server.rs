//! Connection dispatcher.
//!
//! The server accepts TCP connections and hands each one to a fixed-size
//! [`WorkerPool`]. A worker runs the whole connection as one unit:
//!
//! 1. Read and parse the request
//!    (delegated to [`http::parser::read_request`](crate::http::parser::read_request)).
//!    A malformed request gets the fixed `400` answer.
//! 2. Look up `(method, path)` in the shared [`RouteTable`].
//!    A miss at either level gets the fixed `404` answer.
//! 3. Run the handler against a [`ResponseSink`] and write out what it produced.
//!
//! The connection is closed after whichever step finished it; there is no
//! keep-alive. I/O errors are logged and only ever affect their own connection.

use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;

use async_std::io::WriteExt;
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;

use crate::config::ServerConfig;
use crate::handler::{Handler, ResponseSink, RouteTable};
use crate::http::HttpMethod;
use crate::http::parser::{ReadError, read_request};
use crate::http::response::write_status;
use crate::http::status::HttpStatus;
use crate::net::pool::{QueuePolicy, WorkerPool};

pub struct Server {
    config: ServerConfig,
    routes: Arc<RouteTable>,
}

impl Server {
    pub fn new(config: ServerConfig, routes: Arc<RouteTable>) -> Self {
        Self { config, routes }
    }

    /// Registers `handler` for `(method, path)` on the shared route table.
    pub fn add_handler<H>(&self, method: HttpMethod, path: &str, handler: H)
    where
        H: Handler,
    {
        self.routes.register(method, path, handler);
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until the listener fails.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind((self.config.address, self.config.port)).await?;
        self.serve(listener).await
    }

    /// Accepts connections from `listener` and dispatches them to the pool.
    ///
    /// Accept errors are logged and skipped. The loop only ends if the pool
    /// stops taking work.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let local = listener.local_addr()?;
        let routes = Arc::clone(&self.routes);
        let budget = self.config.read_budget;

        let pool = WorkerPool::new(
            self.config.pool_size,
            QueuePolicy::from(self.config.queue_capacity),
            move |stream: TcpStream| Self::handle_client(stream, Arc::clone(&routes), budget),
        );

        tracing::info!(
            address = %local,
            workers = pool.size(),
            read_budget = budget,
            "listening for connections"
        );

        let mut incoming = listener.incoming();
        while let Some(stream) = incoming.next().await {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    continue;
                }
            };

            if pool.submit(stream).await.is_err() {
                tracing::error!("worker pool closed, no longer accepting");
                break;
            }
        }

        pool.shutdown().await;
        Ok(())
    }

    /// Runs one connection from first byte to close.
    async fn handle_client(mut stream: TcpStream, routes: Arc<RouteTable>, budget: usize) {
        let peer = stream.peer_addr().ok();

        if let Err(err) = Self::dispatch(&mut stream, &routes, budget, peer).await {
            tracing::warn!(peer = ?peer, error = %err, "connection abandoned");
        }

        // Errors here only mean the peer is already gone.
        let _ = stream.shutdown(Shutdown::Both);
    }

    async fn dispatch(
        stream: &mut TcpStream,
        routes: &RouteTable,
        budget: usize,
        peer: Option<SocketAddr>,
    ) -> std::io::Result<()> {
        let request = match read_request(stream, budget).await {
            Ok(request) => request,
            Err(ReadError::Io(err)) => return Err(err),
            Err(ReadError::Parser(err)) => {
                tracing::debug!(peer = ?peer, reason = %err, "rejecting malformed request");
                return write_status(stream, err.into_http_status()).await;
            }
        };

        let method = request.method();
        let handler = match routes.lookup(method, request.path()) {
            Ok(handler) => handler,
            Err(miss) => {
                tracing::debug!(
                    peer = ?peer,
                    %method,
                    path = request.path(),
                    reason = %miss,
                    "no route"
                );
                return write_status(stream, HttpStatus::NotFound).await;
            }
        };

        tracing::debug!(peer = ?peer, %method, path = request.path(), "dispatching");

        let mut sink = ResponseSink::new();
        handler.handle(request, &mut sink)?;

        stream.write_all(sink.as_bytes()).await?;
        stream.flush().await
    }
}

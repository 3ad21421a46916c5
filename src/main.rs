use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tinyroute::{HttpMethod, HttpRequest, ResponseSink, RouteTable, Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Minimal routed HTTP/1.1 server")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    address: Option<IpAddr>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Worker count
    #[arg(short, long)]
    workers: Option<usize>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "falling back to default config");
                ServerConfig::default()
            }),
            None => ServerConfig::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(workers) = self.workers {
            config.pool_size = workers;
        }
        config
    }
}

fn text(out: &mut ResponseSink, body: &str) -> std::io::Result<()> {
    write!(
        out,
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

fn register_routes(server: &Server) {
    server.add_handler(HttpMethod::Get, "/", |_req: HttpRequest, out: &mut ResponseSink| {
        text(out, "Hello from tinyroute!\n")
    });

    server.add_handler(HttpMethod::Get, "/health", |_req: HttpRequest, out: &mut ResponseSink| {
        text(out, "ok\n")
    });

    server.add_handler(HttpMethod::Post, "/echo", |req: HttpRequest, out: &mut ResponseSink| {
        text(out, req.body())
    });
}

#[async_std::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinyroute=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Cli::parse().into_config();
    tracing::info!(?config, "configuration loaded");

    let server = Server::new(config, Arc::new(RouteTable::new()));
    register_routes(&server);

    server.run().await?;
    Ok(())
}

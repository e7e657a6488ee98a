//! Muzhvay HTTP server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::listener ──▶ http::server (blocking worker)
//!                                     │
//!                                     ├─▶ http::request   (parse head)
//!                                     ├─▶ session::store  (cookie → session)
//!                                     ├─▶ routing::router (longest prefix)
//!                                     │      └─▶ handler  (may read body)
//!                                     └─▶ http::response  (serialize, close)
//!
//!     session::reaper ── ticks ──▶ session::store (expire, notify)
//!     lifecycle::signals ──▶ lifecycle::shutdown ──▶ server + reaper
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use muzhvay::config::{self, ServerConfig};
use muzhvay::http::{HttpError, HttpServer, Request, Response};
use muzhvay::lifecycle::{signals, Shutdown};
use muzhvay::observability::{logging, metrics};
use muzhvay::session::Session;

#[derive(Parser)]
#[command(name = "muzhvay")]
#[command(about = "Small HTTP/1.x server with cookie sessions", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("muzhvay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        session_ttl_secs = config.session.ttl_secs,
        read_timeout_secs = config.timeouts.read_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut server = HttpServer::new(config);
    server.set_session_kill_listener(|session| {
        tracing::info!(session_id = %session.id(), "Session ended");
    });
    server.set_request_processor("/upload", upload);

    let sessions = server.sessions().clone();
    server.set_request_processor(
        "/logout",
        move |_: &Request, session: &Arc<Session>, _: &mut dyn BufRead| {
            sessions.kill(session.id());
            Ok(Response::text(200, "Session closed"))
        },
    );

    let listener = server.bind().await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Lists the parts of a `multipart/form-data` upload.
fn upload(
    request: &Request,
    session: &Arc<Session>,
    body: &mut dyn BufRead,
) -> Result<Response, HttpError> {
    let entities = request.read_multipart_body(body)?;
    let mut listing = String::new();
    for entity in &entities {
        listing.push_str(&format!(
            "{} {} {} {}\n",
            entity.name.as_deref().unwrap_or("-"),
            entity.filename.as_deref().unwrap_or("-"),
            entity.content_type,
            entity.data.len()
        ));
    }
    Ok(Response::text(200, listing).with_session(Arc::clone(session)))
}

//! Scoreboard server - JSON API and change stream over the durable scoreboard.

mod error;
mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use scoreboard::Scoreboard;
use scoreboard::io::config::{DEFAULT_CONFIG_FILE, load_config};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "scoreboard-server")]
#[command(about = "HTTP API for the claim-based leaderboard")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override `storage.data_dir`
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Override `server.port`
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static UI files to serve for unmatched paths
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scoreboard_server=info".parse()?)
                .add_directive("scoreboard=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    info!(data_dir = %config.storage.data_dir.display(), "opening scoreboard");
    let scoreboard = Scoreboard::open(&config.storage).with_context(|| {
        format!("open scoreboard at {}", config.storage.data_dir.display())
    })?;
    let state = AppState::new(scoreboard);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(routes::root))
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("parse listen address")?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_optional_overrides() {
        let args = Args::parse_from(["scoreboard-server"]);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(args.port.is_none());

        let args = Args::parse_from(["scoreboard-server", "--port", "8080", "--bind", "0.0.0.0"]);
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0"));
    }
}

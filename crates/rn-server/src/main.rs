//! rn-server: road network routing over HTTP.
//!
//! ```text
//! rn-server --segments roads.geojson [--config routing.toml] [--bind 0.0.0.0:5000]
//!           [--export ./export [--export-format csv|sqlite]]
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info,tower_http=debug`).

mod app;


use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rn_core::RoutingConfig;
use rn_graph::{RoadGraph, load_segments};
use rn_route::RouteService;
use rn_store::{CsvGraphWriter, GraphWriter};

use app::{AppState, build_router};

#[derive(Debug, Parser)]
#[command(name = "rn-server", version, about = "Fastest-route queries over a road network")]
struct Cli {
    /// Routing configuration (TOML).  Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Street segments, GeoJSON or CSV (chosen by extension).
    #[arg(long)]
    segments: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Persist the built graph to this directory.
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    export_format: ExportFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Sqlite,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RoutingConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RoutingConfig::default(),
    };
    let service = RouteService::new(config).context("invalid routing config")?;

    match &cli.segments {
        Some(path) => {
            let t0 = Instant::now();
            let segments = load_segments(path)
                .with_context(|| format!("loading segments {}", path.display()))?;
            let rebuilt = service.rebuild(segments)?;
            info!(
                generation = rebuilt.generation,
                accepted = rebuilt.report.accepted,
                dropped = rebuilt.report.dropped.len(),
                elapsed = ?t0.elapsed(),
                "initial graph built"
            );

            if let Some(dir) = &cli.export {
                export(&service.snapshot().graph, dir, cli.export_format)?;
            }
        }
        None => warn!("no --segments given; every route query will be unroutable"),
    }

    let state = Arc::new(AppState { service, segments: cli.segments.clone() });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    info!("listening on http://{}", cli.bind);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

fn export(graph: &RoadGraph, dir: &Path, format: ExportFormat) -> Result<()> {
    let mut writer: Box<dyn GraphWriter> = match format {
        ExportFormat::Csv => Box::new(CsvGraphWriter::new(dir)?),
        #[cfg(feature = "sqlite")]
        ExportFormat::Sqlite => Box::new(rn_store::SqliteGraphWriter::new(dir)?),
        #[cfg(not(feature = "sqlite"))]
        ExportFormat::Sqlite => anyhow::bail!("SQLite export requires the `sqlite` feature"),
    };
    writer.write_graph(graph)?;
    writer.finish()?;
    info!("exported graph ({format:?}) to {}", dir.display());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

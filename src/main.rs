mod app;
mod knowledge;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::{AppConfig, KnowledgeAtlasApp, ViewMode, parse_hex_color};
use knowledge::SnapshotSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON snapshot of areas, content items, journal entries and edges.
    /// The built-in demo is shown when omitted.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Label of the root node.
    #[arg(long, default_value = "Me")]
    self_label: String,
    /// Root node colour as `#rrggbb` or `#rgb`.
    #[arg(long, default_value = "#8b5cf6")]
    accent_color: String,
    /// Initial link distance in pixels.
    #[arg(long, default_value_t = 90.0)]
    spacing: f32,
    /// Initial node size multiplier.
    #[arg(long, default_value_t = 1.0)]
    node_scale: f32,
    #[arg(long, value_enum, default_value_t = ViewMode::Category)]
    view_mode: ViewMode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let accent = parse_hex_color(&args.accent_color).context("invalid --accent-color")?;
    let config = AppConfig {
        source: args
            .snapshot
            .map_or(SnapshotSource::Demo, SnapshotSource::File),
        self_label: args.self_label,
        accent,
        spacing: args.spacing,
        node_scale: args.node_scale,
        view_mode: args.view_mode,
    };
    info!(source = %config.source.describe(), "starting knowledge atlas");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Knowledge Atlas",
        options,
        Box::new(move |cc| Ok(Box::new(KnowledgeAtlasApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("failed to start the window: {error}"))
}

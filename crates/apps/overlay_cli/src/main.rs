//! Command-line harness for the overlay layer manager.
//!
//! Resolves a selection against a running backend, materializes the layers
//! against a logging surface, and optionally animates through the selected
//! years. Useful for exercising the full load cycle without a map widget.

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::{LocationSet, Selection};
use layers::{MapSurface, SurfaceOp};
use scene::OverlayController;
use streaming::{HttpGeometrySource, HttpResolver};

#[derive(Parser, Debug)]
#[command(about = "Load and animate temporal geospatial overlays")]
struct Args {
    /// Backend base URL; falls back to OVERLAY_BACKEND_URL.
    #[arg(long)]
    backend: Option<String>,

    /// Datasets to overlay, e.g. PopDensity Precipitation.
    #[arg(long, required = true, num_args = 1..)]
    datasets: Vec<String>,

    /// Country names (mutually exclusive with --regions).
    #[arg(long, num_args = 1.., conflicts_with = "regions")]
    countries: Vec<String>,

    /// Sub-national region names (mutually exclusive with --countries).
    #[arg(long, num_args = 1..)]
    regions: Vec<String>,

    /// Years to load, e.g. 2015 2018 2020.
    #[arg(long, required = true, num_args = 1..)]
    years: Vec<i32>,

    /// Minimum DN threshold applied to every selected dataset.
    #[arg(long, default_value_t = 1.0)]
    threshold: f64,

    /// Animation steps to run after the initial paint (0 disables).
    #[arg(long, default_value_t = 0)]
    animate_steps: u32,

    /// Animation step interval in milliseconds.
    #[arg(long, default_value_t = 1000)]
    speed_ms: u64,
}

/// Surface that reports applied batches through tracing instead of
/// painting.
struct TracingSurface;

impl MapSurface for TracingSurface {
    fn apply(&mut self, batch: Vec<SurfaceOp>) {
        for op in &batch {
            match op {
                SurfaceOp::AddSource { id, geometry } => {
                    info!(id = %id, features = geometry.features.len(), "add source");
                }
                SurfaceOp::RemoveSource { id } => info!(id = %id, "remove source"),
                SurfaceOp::AddLayer { key, range, .. } => {
                    info!(%key, min = range.min, max = range.max, "add layer");
                }
                SurfaceOp::RemoveLayer { key } => info!(%key, "remove layer"),
                SurfaceOp::SetVisibility { key, visible } => {
                    info!(%key, visible = *visible, "set visibility");
                }
                SurfaceOp::SetFilter { key, filter } => {
                    info!(%key, min_value = filter.0, "set filter");
                }
            }
        }
        info!(ops = batch.len(), "batch applied");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let backend = args
        .backend
        .or_else(|| env::var("OVERLAY_BACKEND_URL").ok())
        .unwrap_or_else(|| "http://localhost:8000".to_string());

    let locations = if !args.regions.is_empty() {
        LocationSet::Regions(args.regions)
    } else {
        LocationSet::Countries(args.countries)
    };

    let mut selection = Selection::new(args.datasets.clone(), locations, args.years);
    for dataset in &args.datasets {
        selection = selection.with_threshold(dataset, args.threshold);
    }

    let mut controller = OverlayController::new(
        Arc::new(HttpResolver::new(&backend)),
        Arc::new(HttpGeometrySource::new(&backend)),
        Box::new(TracingSurface),
    );

    info!(backend = %backend, "loading selection");
    controller.apply_filters(selection).await;
    for notice in controller.drain_notices() {
        println!("{notice}");
    }

    if args.animate_steps > 0 {
        let interval = Duration::from_millis(args.speed_ms);
        controller.set_speed(interval, Instant::now());
        controller.toggle_animation(Instant::now());
        for notice in controller.drain_notices() {
            println!("{notice}");
        }

        let mut remaining = args.animate_steps;
        while remaining > 0 && controller.is_playing() {
            let Some(deadline) = controller.poll(Instant::now()) else {
                break;
            };
            tokio::time::sleep_until(deadline.into()).await;
            controller.poll(Instant::now());
            if let Some(year) = controller.years().current() {
                info!(year, "animation step");
            }
            remaining -= 1;
        }
        controller.toggle_animation(Instant::now());
    }

    info!(
        layers = controller.active().len(),
        years = controller.years().len(),
        "done"
    );
}

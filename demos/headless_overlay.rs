//! Headless overlay demo.
//!
//! Connects to a running display server and logs every state change.
//!
//! Usage:
//!
//! ```text
//! cargo run --example headless_overlay -- [--debug] [--page-url URL] [--catalog FILE]
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use button_overlay::{ButtonCatalog, ButtonDescriptor, Controller, HeadlessSurface, Result};

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    page_url: String,
    catalog: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            page_url: value_of("--page-url").unwrap_or_else(|| "http://127.0.0.1:8000/".into()),
            catalog: value_of("--catalog"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "button_overlay=trace,headless_overlay=debug"
    } else {
        "button_overlay=info,headless_overlay=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

fn load_catalog(path: Option<&str>) -> Result<ButtonCatalog> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| button_overlay::Error::invalid_catalog(format!("{path}: {e}")))?;
            ButtonCatalog::from_json(&json)
        }
        None => Ok(["btn_a", "btn_b", "btn_c", "lever_-1", "lever_0", "lever_1"]
            .into_iter()
            .map(|key| ButtonDescriptor::new(key, format!("/static/images/buttons/{key}.png")))
            .collect()),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

    let controller = Controller::builder()
        .catalog(load_catalog(args.catalog.as_deref())?)
        .page_url(&args.page_url)
        .shared_surface(surface.clone())
        .on_event(|event| info!(?event, "Controller event"))
        .build()?;

    controller.start();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let surface = surface.lock();
                info!(
                    status = surface.link_status().label(),
                    visible = ?surface.visible(),
                    "Overlay"
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.shutdown().await;
    Ok(())
}

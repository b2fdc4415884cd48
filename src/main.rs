mod analytics;
mod app;
mod bubbles;
mod camera;
mod util;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;

use analytics::{HorizonIconResolver, HttpAnalytics, TimeWindow};
use bubbles::StalePolicy;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "BUBBLES_API_ENDPOINT", default_value = "http://localhost:3001")]
    endpoint: String,
    #[arg(long, env = "BUBBLES_HORIZON_ENDPOINT", default_value = "https://horizon.stellar.org")]
    horizon: String,
    #[arg(long, default_value_t = 60)]
    polling_secs: u64,
    #[arg(long, value_enum, default_value_t = TimeWindow::Day)]
    time: TimeWindow,
    #[arg(long)]
    evict_stale: bool,
    #[arg(long, default_value_t = 20)]
    request_timeout_secs: u64,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init()
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let timeout = Duration::from_secs(args.request_timeout_secs);
    let source = HttpAnalytics::new(&args.endpoint, timeout)
        .with_context(|| format!("building analytics client for {}", args.endpoint))?;
    let icons = HorizonIconResolver::new(&args.horizon, timeout)
        .with_context(|| format!("building icon resolver for {}", args.horizon))?;
    let settings = app::Settings {
        window: args.time,
        polling_secs: args.polling_secs.max(1) as f64,
        stale_policy: if args.evict_stale {
            StalePolicy::Evict
        } else {
            StalePolicy::Keep
        },
    };
    info!(endpoint = %args.endpoint, window = args.time.label(), "starting");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Blend Bubbles",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::BubblesApp::new(
                cc,
                Arc::new(source),
                Arc::new(icons),
                settings,
            )))
        }),
    )
    .map_err(|error| anyhow!("window failed: {error}"))
}

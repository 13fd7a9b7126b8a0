//! CLI entry point for the temperature dashboard core.
//!
//! Provides subcommands for dumping a processed view to CSV, sampling the
//! current view on an interval, and evaluating warning thresholds.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use thermo_dash::alerts::{self, LogNotifier, Notifier, WebhookNotifier};
use thermo_dash::config::AppConfig;
use thermo_dash::output;
use thermo_dash::service::Dashboard;
use thermo_dash::store::HttpStore;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "thermo_dash")]
#[command(about = "Shape, clean, and serve temperature sensor series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum View {
    /// Pivoted readings, no resampling or filtering
    Raw,
    /// Cleaned long-lookback series for the history chart
    Chart,
    /// Fine-cadence short window behind the current readout
    Current,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one dashboard view and write it to CSV
    Snapshot {
        /// Which view to compute
        #[arg(value_enum, default_value = "chart")]
        view: View,

        /// CSV file to write
        #[arg(short, long, default_value = "snapshot.csv")]
        output: String,

        /// Bypass the view cache and recompute
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Sample the current view on an interval, appending one row per sample
    Watch {
        /// Seconds between samples
        #[arg(short = 'r', long, default_value_t = 60)]
        sample_rate: u64,

        /// Number of samples to collect (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,

        /// CSV file to append samples to
        #[arg(short, long, default_value = "samples.csv")]
        output: String,
    },
    /// Evaluate warning thresholds and notify for locations below them
    CheckWarnings,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/thermo_dash.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("thermo_dash.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let store = Arc::new(HttpStore::new(config.store_url.clone()));
    let dashboard = Dashboard::new(store.clone(), config.clone());

    match cli.command {
        Commands::Snapshot {
            view,
            output,
            force,
        } => {
            let frame = match view {
                View::Raw => dashboard.raw_view(force).await?,
                View::Chart => dashboard.chart_view(force).await?,
                View::Current => dashboard.current_view(force).await?,
            };
            output::write_csv(&output, &frame)?;
        }
        Commands::Watch {
            sample_rate,
            num_samples,
            output,
        } => {
            watch(&dashboard, sample_rate, num_samples, &output).await?;
        }
        Commands::CheckWarnings => {
            let states = alerts::check_warnings(
                &*store,
                config.owner,
                config.warning_window,
                config.store_timeout,
            )
            .await?;
            let warnings = alerts::below_threshold(&states);

            info!(
                evaluated = states.len(),
                warnings = warnings.len(),
                "Threshold evaluation complete"
            );

            if !warnings.is_empty() {
                let notifier: Box<dyn Notifier> = match &config.webhook_url {
                    Some(url) => Box::new(WebhookNotifier::new(url.clone())),
                    None => Box::new(LogNotifier),
                };
                notifier.notify(&warnings).await?;
            }
        }
    }

    Ok(())
}

/// Samples the current view at a fixed interval, appending the newest row
/// to a CSV after each pass.
#[tracing::instrument(skip(dashboard), fields(sample_rate, num_samples, output))]
async fn watch(
    dashboard: &Dashboard,
    sample_rate: u64,
    num_samples: usize,
    output: &str,
) -> Result<()> {
    if num_samples == 0 {
        info!(sample_rate, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, sample_rate, "Starting sample collection");
    }

    let mut sample_count = 0;

    loop {
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        match dashboard.current_view(false).await {
            Ok(frame) => {
                output::append_latest(output, &frame)?;
                info!(sample = sample_count, "Sample appended");
            }
            Err(e) => {
                // A failed sample is skipped, not fatal; the next tick
                // retries against the store.
                warn!(error = %e, sample = sample_count, "Sample failed");
            }
        }

        if num_samples == 0 || sample_count < num_samples {
            tokio::time::sleep(tokio::time::Duration::from_secs(sample_rate)).await;
        }
    }

    info!(output, "Finished sampling");
    Ok(())
}

//! Traffic Monitor - terminal monitor for HTTP access logs
//!
//! Tails a CSV access log, prints a periodic traffic summary and raises a
//! high-traffic alert when the rolling request rate crosses a threshold.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use chrono::Duration as TimeDelta;
use clap::Parser;
use monitor_lib::{AlertAggregator, LogSource, Monitor, MonitorConfig, SummaryAggregator};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod display;

/// Terminal monitor for HTTP access logs
#[derive(Parser)]
#[command(name = "monitor")]
#[command(author, version, about = "Terminal monitor for HTTP access logs", long_about = None)]
struct Cli {
    /// Path to the CSV access log to follow
    #[arg(long, env = "MONITOR_FILE", default_value = "./logs/access.csv")]
    file: PathBuf,

    /// Summary window size in seconds
    #[arg(long, env = "MONITOR_SUMMARY_WINDOW", default_value_t = 10)]
    summary_window: u32,

    /// Alert window size in seconds
    #[arg(long, env = "MONITOR_ALERT_WINDOW", default_value_t = 30)]
    alert_window: u32,

    /// Requests-per-second threshold for the high-traffic alert
    #[arg(long, env = "MONITOR_THRESHOLD", default_value_t = 10)]
    threshold: u32,

    /// Seconds between terminal refresh attempts
    #[arg(long, env = "MONITOR_POLL_INTERVAL", default_value_t = 2.0)]
    poll_interval: f64,

    /// Seconds without new log data before the stream ends (0 tails forever)
    #[arg(long, env = "MONITOR_IDLE_TIMEOUT", default_value_t = 0)]
    idle_timeout: u64,

    /// Do not render summary notifications (aggregation continues)
    #[arg(long)]
    no_summary: bool,

    /// Do not render alert notifications (aggregation continues)
    #[arg(long)]
    no_alert: bool,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: display::OutputFormat,

    /// Enable debug logging
    #[arg(long, short = 'X')]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    ensure!(cli.poll_interval > 0.0, "poll interval must be positive");

    info!(file = %cli.file.display(), "starting traffic monitor");

    let idle_timeout = (cli.idle_timeout > 0).then(|| Duration::from_secs(cli.idle_timeout));
    let source = LogSource::open(&cli.file, idle_timeout)
        .with_context(|| format!("failed to open log file {}", cli.file.display()))?;

    let summary = SummaryAggregator::new(TimeDelta::seconds(i64::from(cli.summary_window)))
        .context("invalid summary window")?;
    let alert = AlertAggregator::new(TimeDelta::seconds(i64::from(cli.alert_window)), cli.threshold)
        .context("invalid alert window")?;

    let sink = display::ConsoleSink::new(cli.format);
    let config = MonitorConfig {
        poll_interval: Duration::from_secs_f64(cli.poll_interval),
        suppress_summary: cli.no_summary,
        suppress_alert: cli.no_alert,
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    Monitor::new(source, sink, summary, alert, config)
        .run(shutdown_rx)
        .await?;

    Ok(())
}

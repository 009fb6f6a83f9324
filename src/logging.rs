use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Stdout filter used when `RUST_LOG` is not set
pub const DEFAULT_STDOUT_FILTER: &str = "info,cluster=info,rhetoric=warn,prediction=info,sqlx=off";

/// File filter; the rolling log keeps per-article decisions for later review
pub const DEFAULT_FILE_FILTER: &str = "info,cluster=debug,rhetoric=debug,prediction=debug,sqlx=info";

pub fn configure_logging() {
    configure_logging_in("logs")
}

/// Installs stdout and daily-rolling file layers, writing files under `directory`.
pub fn configure_logging_in(directory: &str) {
    // Per-pair similarity traces are too chatty for stdout
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::TRACE && metadata.target() == crate::TARGET_CLUSTER)
    });

    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER));

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter)
        .with_filter(custom_filter);

    let file_appender = rolling::daily(directory, "trajectory.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(DEFAULT_FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}

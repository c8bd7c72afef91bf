//! Logging bootstrap shared by every binary and test harness in the workspace.
//!
//! Builds a `tracing` registry with a non-blocking daily-rolling file layer and
//! an optional ANSI stdout layer. The returned guard must be held for the
//! lifetime of the process or buffered log lines are lost on exit.

use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    std::fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_owned()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if crate::config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}

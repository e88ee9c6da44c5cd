//! Structured logging configuration
//!
//! JSON output for machine consumption, pretty formatting for development,
//! console/file/both sinks - all selected by the logging config. Diagnostics
//! go to stderr so the report stream on stdout stays clean.

use crate::config::get_config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the logging system based on configuration.
///
/// Returns the file writer's guard when file logging is active; the caller
/// must hold it for the process lifetime or buffered lines are lost.
pub fn init_logging() -> Option<WorkerGuard> {
    let config = get_config();

    let log_level = &config.logging.level;
    let log_output = &config.logging.output;
    let log_format = &config.logging.format;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_output.as_str() {
        "file" => Some(init_file_logging(
            env_filter,
            log_format,
            &config.logging.directory,
        )),
        "both" => Some(init_combined_logging(
            env_filter,
            log_format,
            &config.logging.directory,
        )),
        _ => {
            init_console_logging(env_filter, log_format);
            None
        }
    }
}

fn init_console_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(std::io::stderr)
                        .pretty(),
                )
                .init();
        }
    }
}

fn init_file_logging(filter: EnvFilter, format: &str, log_dir: &std::path::Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "update-census.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
    }

    guard
}

fn init_combined_logging(
    filter: EnvFilter,
    format: &str,
    log_dir: &std::path::Path,
) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "update-census.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .init();
        }
    }

    guard
}

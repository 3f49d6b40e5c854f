//! Logging setup for hosts embedding the library.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Base name of the rolling log file
const LOG_FILE_PREFIX: &str = "studyguide.log";

/// Install the global subscriber.
///
/// `RUST_LOG` controls the level (default `warn`). Output goes to stderr and,
/// when `log_dir` is given, to a daily-rolling file in that directory. Keep
/// the returned guard alive for as long as file logging should flush.
///
/// Calling this a second time leaves the first subscriber in place.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    guard
}

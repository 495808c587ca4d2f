//! Subscriber setup: stderr output, a daily log file and the progress channel.

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use redpersona_execution::{PipelineEvent, PipelineEventLayer};
use redpersona_infrastructure::PersonaPaths;

const LOG_FILE_PREFIX: &str = "redpersona.log";

/// Installs the global subscriber.
///
/// Keep the returned guard alive for the whole run, otherwise buffered file
/// output is lost on exit.
pub fn init(
    verbose: bool,
    debug: bool,
) -> Result<(Option<WorkerGuard>, UnboundedReceiver<PipelineEvent>)> {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_filter(env_filter(default_level));

    // Without a config dir the run still works, only the file log is skipped.
    let (file_layer, guard) = match PersonaPaths::log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter(if debug { "debug" } else { "info" }));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let (progress_layer, events) = PipelineEventLayer::channel();

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(progress_layer.with_filter(LevelFilter::INFO))
        .try_init()?;

    Ok((guard, events))
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

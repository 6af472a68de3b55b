//! Logging for the hook binary.
//!
//! The host owns stdout on the hook path, so diagnostics go to a
//! non-blocking file appender under the assistant's `logs/` directory,
//! falling back to stderr when no home directory or log directory is
//! available. Filter via `AIDE_LOG` (defaults to `info`).

use aide_core::storage::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env("AIDE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let logs_dir = StorageConfig::discover().map(|s| s.logs_dir());
    let logs_dir = match logs_dir {
        Some(dir) if fs_err::create_dir_all(&dir).is_ok() => dir,
        _ => {
            init_stderr(filter);
            return None;
        }
    };

    let appender = tracing_appender::rolling::daily(logs_dir, "aide-hook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn init_stderr(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

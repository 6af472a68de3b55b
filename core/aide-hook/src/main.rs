//! aide-hook: session-lifecycle hook handler for aide work-state tracking.
//!
//! Invoked by the host application's hooks configured in its
//! `settings.json`. The `handle` subcommand runs at SessionEnd: it marks
//! the session's tracked work complete, writes resume pointers, and clears
//! the consumed session state.
//!
//! `handle` always exits 0 - this subsystem must never block or fail the
//! host's shutdown sequence. Diagnostics go to the log file (or stderr),
//! never stdout.

mod handle;
mod logging;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aide-hook")]
#[command(about = "aide session work-state tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a host lifecycle event (reads JSON from stdin)
    Handle,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Handle => {
            if let Err(e) = handle::run() {
                tracing::error!(error = %e, "aide-hook handle failed");
            }
            // Exit 0 unconditionally: the non-blocking finalizer contract.
        }
    }
}

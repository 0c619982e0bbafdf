/*!
 * Signal Layer: registers the daemon's POSIX signal handling (spec.md
 * §4.6). Handlers themselves must stay async-signal-safe, so they may
 * only set atomic flags; everything that reacts to a flag (logging,
 * I/O, the busy check) runs later on the worker thread, never inside
 * the handler.
 */

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use signal_hook::consts::{SIGCHLD, SIGHUP, SIGTERM, SIGUSR1};
use signal_hook::flag;
use signal_hook::low_level;

use crate::error::{DaemonError, Result};

/// Flags flipped by signal handlers and observed by the worker thread.
/// Installed once at startup and shared for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ControlFlags {
    /// Set by SIGUSR1. Consumed by the Wake Controller to end a sleep
    /// cycle early.
    pub wake_requested: Arc<AtomicBool>,
    /// Set by SIGTERM. Checked at the top of the daemon's main loop to
    /// exit cleanly instead of mid-cycle.
    pub terminate_requested: Arc<AtomicBool>,
    /// Set by the worker thread itself while a reconciliation cycle is
    /// in progress, so a SIGUSR1 that arrives mid-cycle is recognized
    /// as "received but busy" rather than silently coalesced.
    pub daemon_busy: Arc<AtomicBool>,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self {
            wake_requested: Arc::new(AtomicBool::new(false)),
            terminate_requested: Arc::new(AtomicBool::new(false)),
            daemon_busy: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the daemon's signal handlers against `flags`.
///
/// - `SIGUSR1` sets `wake_requested`.
/// - `SIGTERM` sets `terminate_requested`.
/// - `SIGCHLD` and `SIGHUP` are explicitly ignored (spec.md §4.6): the
///   daemon reaps no children of its own and does not reload
///   configuration on hangup.
pub fn install(flags: &ControlFlags) -> Result<()> {
    flag::register(SIGUSR1, Arc::clone(&flags.wake_requested))
        .map_err(|e| DaemonError::Daemonize(format!("failed to register SIGUSR1: {}", e)))?;

    flag::register(SIGTERM, Arc::clone(&flags.terminate_requested))
        .map_err(|e| DaemonError::Daemonize(format!("failed to register SIGTERM: {}", e)))?;

    unsafe {
        low_level::register(SIGCHLD, || {})
            .map_err(|e| DaemonError::Daemonize(format!("failed to ignore SIGCHLD: {}", e)))?;
        low_level::register(SIGHUP, || {})
            .map_err(|e| DaemonError::Daemonize(format!("failed to ignore SIGHUP: {}", e)))?;
    }

    Ok(())
}

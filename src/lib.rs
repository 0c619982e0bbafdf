/*!
 * file_sync_daemon - one-way directory mirroring background daemon
 *
 * Periodically scans a source directory tree and reconciles a
 * destination tree to match it: new and changed files are copied
 * across, orphaned destination files are removed, and directories left
 * empty by that removal are pruned. Intended to run detached from a
 * terminal, woken early by `SIGUSR1` and stopped by `SIGTERM`.
 */

pub mod cli;
pub mod config;
pub mod copy;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod paths;
pub mod reconciler;
pub mod scanner;
pub mod signals;
pub mod wake;

pub use config::Config;
pub use error::{DaemonError, Result};
pub use reconciler::{reconcile, ReconcileStats};

/// Crate version, as reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/*!
 * file-sync-daemon - one-way directory mirroring background daemon
 *
 * Usage: file-sync-daemon [OPTIONS] <SOURCE> <DESTINATION>
 */

use anyhow::Context;

use file_sync_daemon::cli;
use file_sync_daemon::daemon;
use file_sync_daemon::logging::{log, OpTag};

fn main() -> anyhow::Result<()> {
    let invocation = cli::parse(std::env::args_os()).map_err(|e| {
        log(OpTag::DaemonInitError, &e.to_string());
        anyhow::anyhow!(e)
    })?;

    daemon::start(invocation.source, invocation.destination, invocation.config)
        .context("daemon failed to start")
        .map_err(|e| {
            log(OpTag::DaemonInitError, &e.to_string());
            e
        })
}

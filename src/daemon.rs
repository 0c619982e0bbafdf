/*!
 * Daemon Lifecycle: double-fork detachment and the perpetual
 * reconciliation loop (spec.md §4.7).
 *
 * In debug mode the process stays attached to its controlling terminal
 * and runs the same loop in the foreground, so the behavior under test
 * is identical minus the detachment step.
 */

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use crate::config::Config;
use crate::error::{DaemonError, Result};
use crate::logging::{self, log, OpTag};
use crate::reconciler::reconcile;
use crate::signals::{self, ControlFlags};
use crate::wake::wait_for_wake;

/// Detaches the process from its controlling terminal using the
/// classic double-fork sequence: fork, become session leader, fork
/// again so the daemon can never reacquire a controlling terminal,
/// reset the umask, chdir to `/`, and redirect stdio to `/dev/null`.
///
/// There is no safe std equivalent for `fork`/`setsid`; this function
/// is the one place in the crate that calls into raw `libc`.
///
/// # Safety
/// Must be called before any additional threads are spawned: forking a
/// multi-threaded process only duplicates the calling thread, leaving
/// any other thread's locks permanently held in the child.
pub unsafe fn daemonize() -> Result<()> {
    match libc::fork() {
        -1 => return Err(DaemonError::Daemonize("first fork failed".into())),
        0 => {}
        _ => std::process::exit(0),
    }

    if libc::setsid() == -1 {
        return Err(DaemonError::Daemonize("setsid failed".into()));
    }

    match libc::fork() {
        -1 => return Err(DaemonError::Daemonize("second fork failed".into())),
        0 => {}
        _ => std::process::exit(0),
    }

    libc::umask(0);

    let root = CString::new("/").unwrap();
    if libc::chdir(root.as_ptr()) != 0 {
        return Err(DaemonError::Daemonize("chdir(\"/\") failed".into()));
    }

    close_inherited_file_descriptors();
    redirect_stdio_to_dev_null()?;

    Ok(())
}

/// Closes every file descriptor from 3 up to the process's open-file
/// limit, so the daemon inherits nothing from whatever shell or parent
/// process launched it. Descriptors 0-2 are handled separately by
/// `redirect_stdio_to_dev_null`, since those are replaced rather than
/// simply closed.
unsafe fn close_inherited_file_descriptors() {
    let open_max = libc::sysconf(libc::_SC_OPEN_MAX);
    let limit = if open_max > 0 { open_max as i32 } else { 1024 };
    for fd in 3..limit {
        libc::close(fd);
    }
}

unsafe fn redirect_stdio_to_dev_null() -> Result<()> {
    let dev_null = CString::new("/dev/null").unwrap();
    let fd = libc::open(dev_null.as_ptr(), libc::O_RDWR);
    if fd == -1 {
        return Err(DaemonError::Daemonize("failed to open /dev/null".into()));
    }
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if libc::dup2(fd, target) == -1 {
            return Err(DaemonError::Daemonize("dup2 onto standard fd failed".into()));
        }
    }
    if fd > libc::STDERR_FILENO {
        libc::close(fd);
    }
    Ok(())
}

/// Runs the daemon's perpetual reconciliation loop: reconcile, then
/// sleep until the next cycle is due, until `SIGTERM` is observed at
/// the top of a cycle.
///
/// `daemon_busy` is set for the duration of each `reconcile()` call so
/// the worker thread (not the signal handler, which must stay
/// async-signal-safe) can recognize and log a wake signal that arrived
/// while a cycle was already in progress.
pub fn run(source: &Path, destination: &Path, config: &Config, flags: &ControlFlags) {
    log(
        OpTag::DaemonInit,
        &format!(
            "mirroring {} -> {} every {}s (recursive={}, big_file_threshold={}MB)",
            source.display(),
            destination.display(),
            config.sleep_seconds,
            config.recursive,
            config.big_file_threshold_mb
        ),
    );

    loop {
        if flags.terminate_requested.load(Ordering::SeqCst) {
            log(OpTag::DaemonWorkInfo, "terminate signal observed, exiting");
            return;
        }

        flags.daemon_busy.store(true, Ordering::SeqCst);
        let stats = reconcile(
            source,
            destination,
            config.recursive,
            config.big_file_threshold_bytes(),
        );
        flags.daemon_busy.store(false, Ordering::SeqCst);

        // A SIGUSR1 that arrived while this cycle was running set
        // `wake_requested` with no one watching (the handler itself
        // must stay async-signal-safe and cannot consult `daemon_busy`
        // there). Consume it here instead of letting it bleed into the
        // next `wait_for_wake` call, which would otherwise fire an
        // extra cycle immediately after this one completes.
        if flags.wake_requested.swap(false, Ordering::SeqCst) {
            log(
                OpTag::SignalReceived,
                "wake signal received while a cycle was in progress, coalesced",
            );
        }

        log(
            OpTag::DaemonWorkInfo,
            &format!(
                "cycle complete: {} copied, {} deleted, {} directories pruned",
                stats.copied, stats.deleted, stats.directories_pruned
            ),
        );

        if flags.terminate_requested.load(Ordering::SeqCst) {
            log(OpTag::DaemonWorkInfo, "terminate signal observed, exiting");
            return;
        }

        wait_for_wake(flags, config.sleep_seconds, config.uses_default_sleep());
    }
}

/// Full startup sequence shared by `main`: installs signal handlers,
/// daemonizes unless in debug mode, initializes the logger, and enters
/// the reconciliation loop. Never returns under normal operation.
pub fn start(source: PathBuf, destination: PathBuf, config: Config) -> Result<()> {
    let flags = ControlFlags::new();
    signals::install(&flags)?;

    if !config.debug {
        unsafe {
            daemonize()?;
        }
    }

    logging::init(config.debug)
        .map_err(|e| DaemonError::Daemonize(format!("failed to initialize logger: {}", e)))?;

    run(&source, &destination, &config, &flags);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    #[test]
    fn test_run_exits_immediately_on_terminate() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let flags = ControlFlags::new();
        flags.terminate_requested.store(true, Ordering::SeqCst);

        run(source.path(), dest.path(), &Config::default(), &flags);
    }

    #[test]
    fn test_run_terminates_after_one_cycle() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let flags = ControlFlags::new();
        let config = Config {
            sleep_seconds: 1,
            ..Config::default()
        };

        let terminate_flag = flags.terminate_requested.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(100));
            terminate_flag.store(true, Ordering::SeqCst);
        });

        run(source.path(), dest.path(), &config, &flags);
        handle.join().unwrap();

        assert_eq!(
            fs::read(dest.path().join("a.txt")).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_wake_signal_during_cycle_is_coalesced_not_queued() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let flags = ControlFlags::new();
        // Simulates a SIGUSR1 that arrived while the cycle below was
        // running: the flag is set, but no extra cycle should follow
        // once `run` consumes it after `reconcile` returns.
        flags.wake_requested.store(true, Ordering::SeqCst);

        let config = Config {
            sleep_seconds: 30,
            ..Config::default()
        };

        let terminate_flag = flags.terminate_requested.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(100));
            terminate_flag.store(true, Ordering::SeqCst);
        });

        run(source.path(), dest.path(), &config, &flags);
        handle.join().unwrap();

        assert!(!flags.wake_requested.load(Ordering::SeqCst));
    }
}

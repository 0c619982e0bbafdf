//! Spawns the real `file-sync-daemon` binary in debug mode (so it stays
//! attached and visible to this test) and drives it with real POSIX
//! signals, observing effects through the mirrored directory rather
//! than through syslog output.

use std::fs;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::tempdir;

fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn sigusr1_triggers_an_immediate_reconciliation_cycle() {
    let source = tempdir().unwrap();
    let dest = tempdir().unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_file-sync-daemon"))
        .arg(source.path())
        .arg(dest.path())
        .arg("--debug")
        .arg("--sleep-time")
        .arg("300")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn file-sync-daemon");

    // Let the daemon complete its first cycle and enter the long sleep.
    thread::sleep(Duration::from_millis(300));

    fs::write(source.path().join("urgent.txt"), b"send it now").unwrap();

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGUSR1);
    }

    let arrived = wait_until(
        || dest.path().join("urgent.txt").exists(),
        Duration::from_secs(5),
    );

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
    let _ = child.wait();

    assert!(
        arrived,
        "expected urgent.txt to be mirrored promptly after SIGUSR1"
    );
}

#[test]
fn sigterm_stops_the_daemon_without_killing_it() {
    let source = tempdir().unwrap();
    let dest = tempdir().unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_file-sync-daemon"))
        .arg(source.path())
        .arg(dest.path())
        .arg("--debug")
        .arg("--sleep-time")
        .arg("300")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn file-sync-daemon");

    thread::sleep(Duration::from_millis(300));

    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }

    let exited = wait_until(
        || matches!(child.try_wait(), Ok(Some(_))),
        Duration::from_secs(5),
    );

    assert!(exited, "daemon did not exit after SIGTERM");
}

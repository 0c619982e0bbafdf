/*!
 * Wake Controller: the cooperative sleep between reconciliation cycles
 * (spec.md §4.5). Sleeps in one-second slices so a SIGUSR1 arriving
 * mid-cycle wakes the daemon within a second, instead of blocking for
 * the full configured period.
 */

use std::sync::atomic::Ordering;
use std::thread::sleep;
use std::time::Duration;

use crate::logging::{log, OpTag};
use crate::signals::ControlFlags;

/// Blocks until either `sleep_seconds` whole seconds have elapsed or
/// `flags.wake_requested` is set, whichever comes first. Always clears
/// `wake_requested` before returning, so a signal that arrives during
/// the wait is consumed exactly once. Logs which of the three wake
/// reasons applied.
pub fn wait_for_wake(flags: &ControlFlags, sleep_seconds: u64, uses_default_sleep: bool) {
    log(
        OpTag::DaemonSleep,
        &format!("sleeping for up to {}s", sleep_seconds),
    );

    let mut elapsed = 0u64;
    while elapsed < sleep_seconds {
        if flags.wake_requested.swap(false, Ordering::SeqCst) {
            log(
                OpTag::DaemonWakeUpBySignal,
                "woken early by SIGUSR1",
            );
            return;
        }
        if flags.terminate_requested.load(Ordering::SeqCst) {
            return;
        }
        sleep(Duration::from_secs(1));
        elapsed += 1;
    }

    // The timer ran out on its own; consume any wake flag set in the
    // final second so it cannot bleed into the next cycle.
    flags.wake_requested.store(false, Ordering::SeqCst);

    if uses_default_sleep {
        log(
            OpTag::DaemonWakeUpDefaultTimer,
            &format!("woken by default {}s timer", sleep_seconds),
        );
    } else {
        log(
            OpTag::DaemonWakeUpCustomTimer,
            &format!("woken by custom {}s timer", sleep_seconds),
        );
    }
}

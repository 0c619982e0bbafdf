/*!
 * Structured logger: one-line records routed to the host syslog facility
 * through the `log` crate's facade.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use syslog::{Facility, Formatter3164};

/// Closed set of operation tags recognized by the logger (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    DaemonInit,
    DaemonInitError,
    DaemonSleep,
    DaemonWakeUpBySignal,
    DaemonWakeUpDefaultTimer,
    DaemonWakeUpCustomTimer,
    DaemonWorkInfo,
    SignalReceived,
    FileOperationInfo,
    FileOperationError,
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpTag::DaemonInit => "DAEMON_INIT",
            OpTag::DaemonInitError => "DAEMON_INIT_ERROR",
            OpTag::DaemonSleep => "DAEMON_SLEEP",
            OpTag::DaemonWakeUpBySignal => "DAEMON_WAKE_UP_BY_SIGNAL",
            OpTag::DaemonWakeUpDefaultTimer => "DAEMON_WAKE_UP_DEFAULT_TIMER",
            OpTag::DaemonWakeUpCustomTimer => "DAEMON_WAKE_UP_CUSTOM_TIMER",
            OpTag::DaemonWorkInfo => "DAEMON_WORK_INFO",
            OpTag::SignalReceived => "SIGNAL_RECEIVED",
            OpTag::FileOperationInfo => "FILE_OPERATION_INFO",
            OpTag::FileOperationError => "FILE_OPERATION_ERROR",
        };
        f.write_str(s)
    }
}

/// Identity string used when opening the syslog connection.
const SYSLOG_IDENTITY: &str = "file_sync_daemon";

struct SyslogSink {
    writer: Mutex<syslog::Logger<syslog::LoggerBackend, Formatter3164>>,
    duplicate_to_stdout: bool,
}

static SINK: Mutex<Option<SyslogSink>> = Mutex::new(None);

/// True once `log::set_logger` has been called (or found already set),
/// so `log()` knows whether the `log` crate's global dispatcher is live.
static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// The `log::Log` implementation registered as the process-wide logger.
/// Reads the syslog connection out of `SINK` on every call, rather than
/// owning it, since `init()` may install a new connection after the
/// logger itself is registered.
struct DaemonLogger;

impl Log for DaemonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{} | {} | {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.target(),
            record.args()
        );

        let guard = SINK.lock().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            Some(sink) => {
                if sink.duplicate_to_stdout {
                    println!("{}", line);
                }
                if let Ok(mut logger) = sink.writer.lock() {
                    let _ = logger.info(line);
                }
            }
            None => println!("{}", line),
        }
    }

    fn flush(&self) {}
}

static DAEMON_LOGGER: DaemonLogger = DaemonLogger;

/// Installs the logger's syslog connection and registers it with the
/// `log` crate's global dispatcher. Must be called once during
/// initialization, before any `log()` call. `debug` duplicates every
/// line to stdout in addition to syslog (spec.md §4.8).
pub fn init(debug: bool) -> Result<(), String> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: SYSLOG_IDENTITY.into(),
        pid: std::process::id(),
    };

    let writer = syslog::unix(formatter).map_err(|e| format!("failed to open syslog: {}", e))?;

    let mut guard = SINK.lock().unwrap_or_else(|p| p.into_inner());
    *guard = Some(SyslogSink {
        writer: Mutex::new(writer),
        duplicate_to_stdout: debug,
    });
    drop(guard);

    // set_logger can only succeed once per process; a second call (e.g.
    // re-init in tests) just means the dispatcher is already pointed at
    // DAEMON_LOGGER, which still reads the SINK we just replaced above.
    if log::set_logger(&DAEMON_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    LOGGER_INSTALLED.store(true, Ordering::SeqCst);

    Ok(())
}

/// Formats and emits one log line: `"<local time> | <op tag> | <message>"`.
///
/// Whole-second resolution. Dispatched through the `log` crate facade to
/// the registered syslog backend at informational priority, duplicated
/// to stdout when the logger was initialized in debug mode. If the
/// logger was never initialized (e.g. in unit tests that exercise this
/// function directly), the line is only printed to stdout.
pub fn log(op: OpTag, message: &str) {
    if LOGGER_INSTALLED.load(Ordering::SeqCst) {
        log::logger().log(
            &Record::builder()
                .level(Level::Info)
                .target(&op.to_string())
                .args(format_args!("{}", message))
                .build(),
        );
        return;
    }

    let line = format!(
        "{} | {} | {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        op,
        message
    );
    println!("{}", line);
}

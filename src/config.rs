/*!
 * Configuration bundle for the file sync daemon
 */

/// The hard-coded default sleep period, in seconds. Used only to decide
/// which timer-wake operation tag to log (spec.md §4.5).
pub const DEFAULT_SLEEP_SECONDS: u64 = 20;

const DEFAULT_BIG_FILE_THRESHOLD_MB: u64 = 5;

/// Process-wide configuration, built once from CLI arguments before any
/// signal handler is installed and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cycle period, in seconds.
    pub sleep_seconds: u64,

    /// Whether the scanner recurses into subdirectories.
    pub recursive: bool,

    /// Suppresses daemonization and duplicates log lines to stdout.
    pub debug: bool,

    /// Files larger than this many megabytes use the memory-mapped copy
    /// strategy instead of the buffered one.
    pub big_file_threshold_mb: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sleep_seconds: DEFAULT_SLEEP_SECONDS,
            recursive: false,
            debug: false,
            big_file_threshold_mb: DEFAULT_BIG_FILE_THRESHOLD_MB,
        }
    }
}

impl Config {
    /// Threshold in bytes, as used by the Copy Engine's strategy selection.
    pub fn big_file_threshold_bytes(&self) -> u64 {
        self.big_file_threshold_mb * 1_048_576
    }

    /// True if `sleep_seconds` is the hard-coded default, which decides
    /// whether the Wake Controller logs a "default" or "custom" timer wake.
    pub fn uses_default_sleep(&self) -> bool {
        self.sleep_seconds == DEFAULT_SLEEP_SECONDS
    }
}

/*!
 * Error types for the file sync daemon
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Debug)]
pub enum DaemonError {
    /// Source or destination path does not exist
    SourceNotFound(PathBuf),

    /// Path exists but is not a directory
    InvalidPath(PathBuf),

    /// I/O error from a filesystem primitive
    Io(io::Error),

    /// Malformed CLI flag or missing argument
    Config(String),

    /// Double-fork detachment failed
    Daemonize(String),
}

impl DaemonError {
    /// Fatal errors abort startup before the daemon enters `Running`
    /// (spec.md §7 classes 1-2). Everything else is a local, per-file
    /// or per-subtree error that is logged and skipped (classes 3-4).
    pub fn is_fatal(&self) -> bool {
        match self {
            DaemonError::SourceNotFound(_) => true,
            DaemonError::InvalidPath(_) => true,
            DaemonError::Config(_) => true,
            DaemonError::Daemonize(_) => true,
            DaemonError::Io(_) => false,
        }
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::SourceNotFound(path) => {
                write!(f, "path does not exist: {}", path.display())
            }
            DaemonError::InvalidPath(path) => {
                write!(f, "not a directory: {}", path.display())
            }
            DaemonError::Io(err) => write!(f, "I/O error: {}", err),
            DaemonError::Config(msg) => write!(f, "configuration error: {}", msg),
            DaemonError::Daemonize(msg) => write!(f, "daemonization failed: {}", msg),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaemonError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DaemonError {
    fn from(err: io::Error) -> Self {
        DaemonError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(DaemonError::SourceNotFound(PathBuf::from("/tmp")).is_fatal());
        assert!(DaemonError::InvalidPath(PathBuf::from("/tmp")).is_fatal());
        assert!(DaemonError::Config("bad flag".to_string()).is_fatal());
        assert!(DaemonError::Daemonize("fork failed".to_string()).is_fatal());
    }

    #[test]
    fn test_non_fatal_errors() {
        assert!(!DaemonError::Io(io::Error::new(io::ErrorKind::NotFound, "x")).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = DaemonError::InvalidPath(PathBuf::from("/tmp/foo"));
        assert_eq!(err.to_string(), "not a directory: /tmp/foo");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: DaemonError = io_err.into();
        assert!(matches!(err, DaemonError::Io(_)));
    }
}

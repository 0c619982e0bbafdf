/*!
 * Command-line surface: a positional source and destination, plus flags
 * matching the daemon's configuration options (spec.md §6).
 */

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::config::Config;
use crate::error::{DaemonError, Result};

/// Paths the caller asked to mirror, plus the parsed configuration.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub config: Config,
}

fn build_command() -> Command {
    Command::new("file-sync-daemon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("One-way directory mirroring background daemon")
        .arg(
            Arg::new("source")
                .value_name("SOURCE")
                .help("Directory to mirror from")
                .required(true),
        )
        .arg(
            Arg::new("destination")
                .value_name("DESTINATION")
                .help("Directory to mirror into")
                .required(true),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Run in the foreground and duplicate log lines to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .short('R')
                .long("recursive")
                .help("Descend into subdirectories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sleep-time")
                .short('s')
                .long("sleep-time")
                .value_name("SECONDS")
                .help("Seconds between reconciliation cycles")
                .default_value("20"),
        )
        .arg(
            Arg::new("big-file-size")
                .short('B')
                .long("big-file-size")
                .value_name("MEGABYTES")
                .help("Files at or above this size use the memory-mapped copy strategy")
                .default_value("5"),
        )
}

/// Parses `args` (normally `std::env::args_os()`) into an `Invocation`,
/// validating the source path exists and both paths are directories.
/// Surfaces malformed flags and bad paths as `DaemonError` before the
/// daemon ever enters its running state.
pub fn parse<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command()
        .try_get_matches_from(args)
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    let source = PathBuf::from(matches.get_one::<String>("source").unwrap());
    let destination = PathBuf::from(matches.get_one::<String>("destination").unwrap());

    let sleep_seconds: u64 = matches
        .get_one::<String>("sleep-time")
        .unwrap()
        .parse()
        .map_err(|_| DaemonError::Config("--sleep-time must be a positive integer".into()))?;
    if sleep_seconds == 0 {
        return Err(DaemonError::Config(
            "--sleep-time must be a positive integer".into(),
        ));
    }

    let big_file_threshold_mb: u64 = matches
        .get_one::<String>("big-file-size")
        .unwrap()
        .parse()
        .map_err(|_| DaemonError::Config("--big-file-size must be a positive integer".into()))?;
    if big_file_threshold_mb == 0 {
        return Err(DaemonError::Config(
            "--big-file-size must be a positive integer".into(),
        ));
    }

    let config = Config {
        sleep_seconds,
        recursive: matches.get_flag("recursive"),
        debug: matches.get_flag("debug"),
        big_file_threshold_mb,
    };

    if !crate::paths::exists(&source) {
        return Err(DaemonError::SourceNotFound(source));
    }
    if !crate::paths::is_directory(&source) {
        return Err(DaemonError::InvalidPath(source));
    }
    if crate::paths::exists(&destination) && !crate::paths::is_directory(&destination) {
        return Err(DaemonError::InvalidPath(destination));
    }

    Ok(Invocation {
        source,
        destination,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_minimal_arguments() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let args = vec![
            "file-sync-daemon".to_string(),
            source.path().to_string_lossy().to_string(),
            dest.path().to_string_lossy().to_string(),
        ];

        let invocation = parse(args).unwrap();
        assert_eq!(invocation.config.sleep_seconds, 20);
        assert!(!invocation.config.recursive);
        assert!(!invocation.config.debug);
    }

    #[test]
    fn test_parse_all_flags() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let args = vec![
            "file-sync-daemon".to_string(),
            source.path().to_string_lossy().to_string(),
            dest.path().to_string_lossy().to_string(),
            "--debug".to_string(),
            "--recursive".to_string(),
            "--sleep-time".to_string(),
            "60".to_string(),
            "--big-file-size".to_string(),
            "10".to_string(),
        ];

        let invocation = parse(args).unwrap();
        assert!(invocation.config.debug);
        assert!(invocation.config.recursive);
        assert_eq!(invocation.config.sleep_seconds, 60);
        assert_eq!(invocation.config.big_file_threshold_mb, 10);
    }

    #[test]
    fn test_parse_rejects_missing_source() {
        let args = vec![
            "file-sync-daemon".to_string(),
            "/definitely/does/not/exist".to_string(),
            "/tmp".to_string(),
        ];

        let err = parse(args).unwrap_err();
        assert!(matches!(err, DaemonError::SourceNotFound(_)));
    }

    #[test]
    fn test_parse_rejects_zero_sleep_time() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let args = vec![
            "file-sync-daemon".to_string(),
            source.path().to_string_lossy().to_string(),
            dest.path().to_string_lossy().to_string(),
            "--sleep-time".to_string(),
            "0".to_string(),
        ];

        let err = parse(args).unwrap_err();
        assert!(matches!(err, DaemonError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric_sleep_time() {
        let source = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let args = vec![
            "file-sync-daemon".to_string(),
            source.path().to_string_lossy().to_string(),
            dest.path().to_string_lossy().to_string(),
            "--sleep-time".to_string(),
            "not-a-number".to_string(),
        ];

        let err = parse(args).unwrap_err();
        assert!(matches!(err, DaemonError::Config(_)));
    }
}

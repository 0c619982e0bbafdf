/*!
 * Path primitives: the small filesystem operations every other module
 * builds on (spec.md §4.1). Symlinks are never followed into directories:
 * `is_directory` and `mtime_secs` use `symlink_metadata`, never `metadata`.
 */

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_times, FileTime};

use crate::error::{DaemonError, Result};

/// True if `path` exists, without following a trailing symlink.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// True if `path` exists and is a directory. A symlink to a directory
/// is not itself a directory.
pub fn is_directory(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

/// Size in bytes of a regular file.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::symlink_metadata(path)?.len())
}

/// Last-modified time, truncated to whole seconds since the Unix epoch.
pub fn mtime_secs(path: &Path) -> Result<i64> {
    let meta = fs::symlink_metadata(path)?;
    Ok(FileTime::from_last_modification_time(&meta).unix_seconds())
}

/// Creates `path` and any missing parent directories.
pub fn mkdir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(DaemonError::from)
}

/// Removes a single empty directory. Does not recurse.
pub fn rmdir(path: &Path) -> Result<()> {
    fs::remove_dir(path).map_err(DaemonError::from)
}

/// Removes a single file.
pub fn unlink(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(DaemonError::from)
}

/// Sets both atime and mtime of `path` to `seconds` (whole-second
/// resolution, matching the source file's truncated mtime).
pub fn set_mtime(path: &Path, seconds: i64) -> Result<()> {
    let ft = FileTime::from_unix_seconds(seconds);
    set_file_times(path, ft, ft).map_err(DaemonError::from)
}

/// Ensures the parent directory chain for `dest_path` exists, creating
/// any missing ancestor one level at a time and stopping at the first
/// one that fails to create.
pub fn create_subdirectories(dest_path: &Path) -> Result<()> {
    let parent = match dest_path.parent() {
        Some(parent) => parent,
        None => return Ok(()),
    };

    let mut acc = PathBuf::new();
    for component in parent.components() {
        acc.push(component.as_os_str());
        if is_directory(&acc) {
            continue;
        }
        fs::create_dir(&acc).map_err(DaemonError::from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_exists_and_is_directory() {
        let dir = tempdir().unwrap();
        assert!(exists(dir.path()));
        assert!(is_directory(dir.path()));

        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();
        assert!(exists(&file_path));
        assert!(!is_directory(&file_path));

        assert!(!exists(&dir.path().join("missing")));
    }

    #[test]
    fn test_file_size() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"hello world").unwrap();
        assert_eq!(file_size(&file_path).unwrap(), 11);
    }

    #[test]
    fn test_mkdir_rmdir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        mkdir(&nested).unwrap();
        assert!(is_directory(&nested));
        rmdir(&nested).unwrap();
        assert!(!exists(&nested));
    }

    #[test]
    fn test_unlink() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();
        unlink(&file_path).unwrap();
        assert!(!exists(&file_path));
    }

    #[test]
    fn test_set_mtime_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, b"hello").unwrap();
        set_mtime(&file_path, 1_700_000_000).unwrap();
        assert_eq!(mtime_secs(&file_path).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_create_subdirectories() {
        let dir = tempdir().unwrap();
        let dest_path = dir.path().join("a/b/c/leaf.txt");

        create_subdirectories(&dest_path).unwrap();

        assert!(is_directory(&dir.path().join("a")));
        assert!(is_directory(&dir.path().join("a/b")));
        assert!(is_directory(&dir.path().join("a/b/c")));
        assert!(!exists(&dest_path));
    }

    #[test]
    fn test_create_subdirectories_is_idempotent() {
        let dir = tempdir().unwrap();
        let dest_path = dir.path().join("a/b/leaf.txt");

        create_subdirectories(&dest_path).unwrap();
        create_subdirectories(&dest_path).unwrap();

        assert!(is_directory(&dir.path().join("a/b")));
    }
}

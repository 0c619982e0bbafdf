/*!
 * Tree Scanner: walks a directory and builds its `FileRecord` set
 * (spec.md §4.3). Traversal is iterative (an explicit stack), not
 * naive recursion, so arbitrarily deep trees cannot blow the call
 * stack. A subtree whose `read_dir` call fails is logged and skipped;
 * it does not abort the scan.
 */

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{log, OpTag};
use crate::paths::is_directory;

/// One file discovered under a scanned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path under the scanned root.
    pub path: PathBuf,
    /// Path relative to the scanned root, used to locate the mirrored
    /// file under the other root.
    pub mirror_path: PathBuf,
    /// Modification time, whole seconds since the Unix epoch.
    pub mtime: i64,
    /// Size in bytes.
    pub size: u64,
}

/// The full result of scanning one root: every regular file found,
/// plus every directory encountered (used by the reconciler's
/// empty-directory pruning pass).
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub root: PathBuf,
    pub records: Vec<FileRecord>,
    pub directories: Vec<PathBuf>,
}

/// Scans `root`. When `recursive` is false only the top-level entries of
/// `root` are visited; subdirectories are recorded but not descended
/// into. Symlinks are never followed into directories: each entry's
/// file type is inspected with `DirEntry::file_type()`, which does not
/// follow a trailing symlink.
pub fn scan(root: &Path, recursive: bool) -> ScanResult {
    let mut result = ScanResult {
        root: root.to_path_buf(),
        records: Vec::new(),
        directories: Vec::new(),
    };

    if !is_directory(root) {
        return result;
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log(
                    OpTag::FileOperationError,
                    &format!("failed to read directory {}: {}", dir.display(), e),
                );
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log(
                        OpTag::FileOperationError,
                        &format!("failed to read entry under {}: {}", dir.display(), e),
                    );
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    log(
                        OpTag::FileOperationError,
                        &format!("failed to stat {}: {}", path.display(), e),
                    );
                    continue;
                }
            };

            if file_type.is_dir() {
                result.directories.push(path.clone());
                if recursive {
                    stack.push(path);
                }
                continue;
            }

            if !file_type.is_file() {
                // Symlinks and other special files are neither copied
                // nor descended into.
                continue;
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    log(
                        OpTag::FileOperationError,
                        &format!("failed to stat {}: {}", path.display(), e),
                    );
                    continue;
                }
            };

            let mirror_path = match path.strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };

            let mtime = filetime::FileTime::from_last_modification_time(&meta).unix_seconds();

            result.records.push(FileRecord {
                path,
                mirror_path,
                mtime,
                size: meta.len(),
            });
        }
    }

    result
}

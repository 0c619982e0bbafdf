/*!
 * Reconciler: the core one-way mirroring algorithm (spec.md §4.4).
 *
 * Given a source and destination root, brings the destination into
 * agreement with the source:
 *   1. Scan both trees.
 *   2. If the source scan is empty, do nothing and return (Open
 *      Question #1: an empty or unreadable source must never be
 *      treated as "delete everything at the destination").
 *   3. Delete destination files that have no counterpart in the
 *      source (orphans).
 *   4. Copy or refresh every source file whose destination
 *      counterpart is missing or differs in size or mtime.
 *   5. Prune destination directories left empty by step 3.
 *
 * Two files are considered equal by size and mtime alone; no content
 * hashing is performed (spec.md §4.4 Non-goals).
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::copy::copy_file;
use crate::logging::{log, OpTag};
use crate::paths::{rmdir, unlink};
use crate::scanner::{scan, FileRecord, ScanResult};

/// Counts of what a reconciliation cycle actually did, returned so the
/// daemon can fold them into its per-cycle log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub copied: u64,
    pub deleted: u64,
    pub directories_pruned: u64,
}

/// Runs one full reconciliation cycle from `source_root` into
/// `dest_root`. `recursive` controls whether either side's scan
/// descends into subdirectories; `big_file_threshold_bytes` is
/// forwarded to the copy engine's strategy selection.
pub fn reconcile(
    source_root: &Path,
    dest_root: &Path,
    recursive: bool,
    big_file_threshold_bytes: u64,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();

    let source_scan = scan(source_root, recursive);
    if source_scan.records.is_empty() {
        log(
            OpTag::DaemonWorkInfo,
            &format!(
                "source {} is empty or unreadable, skipping this cycle",
                source_root.display()
            ),
        );
        return stats;
    }

    let dest_scan = scan(dest_root, recursive);

    delete_orphans(&source_scan, &dest_scan, &mut stats);
    copy_missing_or_stale(
        &source_scan,
        &dest_scan,
        dest_root,
        big_file_threshold_bytes,
        &mut stats,
    );
    prune_empty_directories(dest_scan.directories, &mut stats);

    stats
}

fn delete_orphans(source_scan: &ScanResult, dest_scan: &ScanResult, stats: &mut ReconcileStats) {
    let source_mirrors: std::collections::HashSet<&Path> = source_scan
        .records
        .iter()
        .map(|r| r.mirror_path.as_path())
        .collect();

    for dest_record in &dest_scan.records {
        if !source_mirrors.contains(dest_record.mirror_path.as_path()) {
            match unlink(&dest_record.path) {
                Ok(()) => {
                    stats.deleted += 1;
                    log(
                        OpTag::FileOperationInfo,
                        &format!("deleted orphan {}", dest_record.path.display()),
                    );
                }
                Err(e) => log(
                    OpTag::FileOperationError,
                    &format!("failed to delete orphan {}: {}", dest_record.path.display(), e),
                ),
            }
        }
    }
}

fn copy_missing_or_stale(
    source_scan: &ScanResult,
    dest_scan: &ScanResult,
    dest_root: &Path,
    big_file_threshold_bytes: u64,
    stats: &mut ReconcileStats,
) {
    let dest_index: HashMap<&Path, &FileRecord> = dest_scan
        .records
        .iter()
        .map(|r| (r.mirror_path.as_path(), r))
        .collect();

    for source_record in &source_scan.records {
        let dest_path = dest_root.join(&source_record.mirror_path);

        let needs_copy = match dest_index.get(source_record.mirror_path.as_path()) {
            None => true,
            Some(existing) => {
                existing.size != source_record.size || existing.mtime != source_record.mtime
            }
        };

        if !needs_copy {
            continue;
        }

        match copy_file(&source_record.path, &dest_path, big_file_threshold_bytes) {
            Ok(()) => {
                stats.copied += 1;
                log(
                    OpTag::FileOperationInfo,
                    &format!(
                        "copied {} -> {}",
                        source_record.path.display(),
                        dest_path.display()
                    ),
                );
            }
            Err(e) => log(
                OpTag::FileOperationError,
                &format!(
                    "failed to copy {} -> {}: {}",
                    source_record.path.display(),
                    dest_path.display(),
                    e
                ),
            ),
        }
    }
}

/// Removes destination directories left empty after orphan deletion,
/// deepest first, so a chain of now-empty parents collapses in one
/// cycle rather than one level per cycle. Reuses the directory list
/// from the same destination scan `delete_orphans` already walked,
/// rather than re-walking the destination tree a second time: a
/// directory's existence doesn't change between the two steps, and
/// each one's emptiness is still checked live via `read_dir` below.
fn prune_empty_directories(mut directories: Vec<PathBuf>, stats: &mut ReconcileStats) {
    directories.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    for directory in directories {
        let is_empty = std::fs::read_dir(&directory)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);

        if is_empty {
            match rmdir(&directory) {
                Ok(()) => {
                    stats.directories_pruned += 1;
                    log(
                        OpTag::FileOperationInfo,
                        &format!("pruned empty directory {}", directory.display()),
                    );
                }
                Err(e) => log(
                    OpTag::FileOperationError,
                    &format!("failed to prune directory {}: {}", directory.display(), e),
                ),
            }
        }
    }
}

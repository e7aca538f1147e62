//! Timestamped backup rotation for the persisted record files. Before a
//! file is overwritten, the previous version is copied into the backup
//! directory under a `<base>_<YYYYMMDD_HHMMSS>.json` name; only the five
//! most recent copies per base name are retained. Restore picks the backup
//! with the greatest modification time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use tracing::{debug, warn};

/// Retained backups per base file name; oldest beyond this are deleted.
const MAX_BACKUPS: usize = 5;

/// Copy `primary` into `backup_dir` under a timestamped name, then prune
/// old backups for the same base name. Returns `Ok(None)` when there is no
/// primary file yet (first save), which is not an error.
///
/// Several saves can land within the same wall-clock second; a `-N` suffix
/// keeps their backup names distinct so rotation still retains five real
/// copies instead of overwriting one.
pub fn create_backup(primary: &Path, backup_dir: &Path) -> io::Result<Option<PathBuf>> {
    if !primary.exists() {
        return Ok(None);
    }

    let stem = file_stem(primary);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut candidate = backup_dir.join(format!("{stem}_{timestamp}.json"));
    let mut attempt = 1;
    while candidate.exists() {
        candidate = backup_dir.join(format!("{stem}_{timestamp}-{attempt}.json"));
        attempt += 1;
    }

    fs::copy(primary, &candidate)?;
    debug!(backup = %candidate.display(), "created backup");

    prune_old_backups(backup_dir, &stem);
    Ok(Some(candidate))
}

/// Copy the most recent backup for `primary`'s base name back over the
/// primary file. Returns `Ok(false)` when no backup exists.
pub fn restore_latest(primary: &Path, backup_dir: &Path) -> io::Result<bool> {
    let stem = file_stem(primary);
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for path in list_backups(backup_dir, &stem)? {
        let modified = fs::metadata(&path)?.modified()?;
        // Ties broken by first-encountered.
        if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }

    match newest {
        Some((_, backup)) => {
            fs::copy(&backup, primary)?;
            warn!(
                backup = %backup.display(),
                target = %primary.display(),
                "restored file from backup"
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Delete the oldest backups for `stem` beyond the `MAX_BACKUPS` most
/// recent, ordered by modification time. Failures here are logged and
/// swallowed; losing a prune never loses data.
fn prune_old_backups(backup_dir: &Path, stem: &str) {
    let mut backups = match list_backups(backup_dir, stem) {
        Ok(backups) => backups,
        Err(err) => {
            warn!(error = %err, "could not list backups for pruning");
            return;
        }
    };
    if backups.len() <= MAX_BACKUPS {
        return;
    }

    backups.sort_by_key(|path| {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    });

    let excess = backups.len() - MAX_BACKUPS;
    for old in &backups[..excess] {
        match fs::remove_file(old) {
            Ok(()) => debug!(backup = %old.display(), "deleted old backup"),
            Err(err) => warn!(backup = %old.display(), error = %err, "could not delete old backup"),
        }
    }
}

/// All backup files in `backup_dir` whose names belong to `stem`.
fn list_backups(backup_dir: &Path, stem: &str) -> io::Result<Vec<PathBuf>> {
    let prefix = format!("{stem}_");
    let mut backups = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".json") && entry.path().is_file() {
            backups.push(entry.path());
        }
    }
    Ok(backups)
}

/// Base name of a record file without its extension.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

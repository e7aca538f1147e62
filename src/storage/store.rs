//! The `FileStore` façade: durable round-trip of the two catalog
//! collections, one JSON file per collection, under a single data
//! directory. Saves are backed up and rotated (see `backup`); loads never
//! fail outward, they degrade to an empty collection after one
//! restore-and-retry pass.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use tracing::{info, warn};

use super::backup;
use super::records::{BooksFile, MembersFile};
use crate::error::StorageError;
use crate::models::{Book, Member};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog-manager";
/// Record file holding the books collection.
const BOOKS_FILE_NAME: &str = "books.json";
/// Record file holding the members collection.
const MEMBERS_FILE_NAME: &str = "members.json";
/// Subdirectory holding rotated backups of both record files.
const BACKUP_DIR_NAME: &str = "backups";

/// Persistence gateway rooted at one data directory. The directory and its
/// backup subdirectory are created eagerly so every later save only deals
/// with file-level failures.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    backup_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at an explicit directory. Tests point this at a
    /// temp dir; production code usually goes through `default_location`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let backup_dir = data_dir.join(BACKUP_DIR_NAME);
        fs::create_dir_all(&data_dir).context("failed to create data directory")?;
        fs::create_dir_all(&backup_dir).context("failed to create backup directory")?;
        Ok(Self {
            data_dir,
            backup_dir,
        })
    }

    /// Resolve the default per-user data directory inside the home
    /// directory and open a store there.
    pub fn default_location() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Self::new(base_dirs.home_dir().join(DATA_DIR_NAME))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn books_path(&self) -> PathBuf {
        self.data_dir.join(BOOKS_FILE_NAME)
    }

    fn members_path(&self) -> PathBuf {
        self.data_dir.join(MEMBERS_FILE_NAME)
    }

    // ---- save ----

    /// Persist the books collection. The previous file version is backed up
    /// first; if the write itself fails, the pre-write state is restored
    /// from the most recent backup on a best-effort basis and the failure
    /// is reported to the caller.
    pub fn save_books(&self, books: &HashMap<u64, Book>) -> Result<(), StorageError> {
        self.save_file(&self.books_path(), &BooksFile::from_books(books))
    }

    /// Persist the members collection. Same backup/restore discipline as
    /// `save_books`.
    pub fn save_members(&self, members: &HashMap<u64, Member>) -> Result<(), StorageError> {
        self.save_file(&self.members_path(), &MembersFile::from_members(members))
    }

    fn save_file<T: serde::Serialize>(&self, path: &Path, payload: &T) -> Result<(), StorageError> {
        if let Err(err) = backup::create_backup(path, &self.backup_dir) {
            // A failed backup is not fatal for the save itself.
            warn!(file = %path.display(), error = %err, "could not create backup before save");
        }

        match write_json(path, payload) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "save failed, attempting restore");
                if let Err(restore_err) = backup::restore_latest(path, &self.backup_dir) {
                    warn!(file = %path.display(), error = %restore_err, "restore after failed save also failed");
                }
                Err(err)
            }
        }
    }

    // ---- load ----

    /// Load the books collection. A missing file is the normal first-run
    /// state and yields an empty map; a corrupt file triggers one
    /// restore-from-backup retry before degrading to empty.
    pub fn load_books(&self) -> HashMap<u64, Book> {
        self.load_file(&self.books_path(), |file: BooksFile| file.into_books())
    }

    /// Load the members collection. Same degradation rules as `load_books`.
    pub fn load_members(&self) -> HashMap<u64, Member> {
        self.load_file(&self.members_path(), |file: MembersFile| {
            file.into_members()
        })
    }

    fn load_file<F, E, T>(&self, path: &Path, decode: F) -> HashMap<u64, T>
    where
        F: Fn(E) -> Result<HashMap<u64, T>, StorageError>,
        E: serde::de::DeserializeOwned,
    {
        if !path.exists() {
            info!(file = %path.display(), "record file not found, starting with empty collection");
            return HashMap::new();
        }

        match read_json(path).and_then(&decode) {
            Ok(collection) => collection,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "record file corrupt, attempting restore");
                match backup::restore_latest(path, &self.backup_dir) {
                    Ok(true) => match read_json(path).and_then(&decode) {
                        Ok(collection) => collection,
                        Err(retry_err) => {
                            warn!(file = %path.display(), error = %retry_err, "restored file also unreadable, starting empty");
                            HashMap::new()
                        }
                    },
                    Ok(false) => {
                        warn!(file = %path.display(), "no backup available, starting empty");
                        HashMap::new()
                    }
                    Err(restore_err) => {
                        warn!(file = %path.display(), error = %restore_err, "restore failed, starting empty");
                        HashMap::new()
                    }
                }
            }
        }
    }

    // ---- introspection ----

    pub fn books_file_exists(&self) -> bool {
        self.books_path().exists()
    }

    pub fn members_file_exists(&self) -> bool {
        self.members_path().exists()
    }

    /// Human-readable summary of both record files for the shell's
    /// data-files view.
    pub fn files_info(&self) -> String {
        format!(
            "{}\n\n{}",
            file_info(&self.books_path()),
            file_info(&self.members_path())
        )
    }
}

/// Serialize `payload` as pretty JSON. The handle is synced before being
/// released so the bytes are on disk when the save reports success.
fn write_json<T: serde::Serialize>(path: &Path, payload: &T) -> Result<(), StorageError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(&file, payload)?;
    file.sync_all()?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

fn file_info(path: &Path) -> String {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return format!("File does not exist: {}", path.display()),
    };
    let size_kb = meta.len() as f64 / 1024.0;
    let modified = meta
        .modified()
        .ok()
        .map(|time| chrono::DateTime::<chrono::Local>::from(time).to_rfc2822())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "File: {}\nSize: {size_kb:.2} KB\nLast Modified: {modified}",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let root = TempDir::new().unwrap();
        let store = FileStore::new(root.path().join("data")).unwrap();
        (root, store)
    }

    fn sample_books() -> HashMap<u64, Book> {
        let mut books = HashMap::new();
        books.insert(9_780_441_172_719, Book::with_isbn("Dune", "Herbert", 9_780_441_172_719));
        books.insert(
            9_780_060_512_750,
            Book::with_isbn("The Dispossessed", "Le Guin", 9_780_060_512_750),
        );
        books
    }

    #[test]
    fn first_run_loads_empty_collections() {
        let (_root, store) = store();
        assert!(store.load_books().is_empty());
        assert!(store.load_members().is_empty());
        assert!(!store.books_file_exists());
    }

    #[test]
    fn books_survive_a_round_trip() {
        let (_root, store) = store();
        let books = sample_books();
        store.save_books(&books).unwrap();
        assert!(store.books_file_exists());
        assert_eq!(store.load_books(), books);
    }

    #[test]
    fn members_survive_a_round_trip() {
        let (_root, store) = store();
        let mut members = HashMap::new();
        let mut alice = Member::new("Alice");
        alice.borrowed.push(9_780_441_172_719);
        members.insert(alice.member_id, alice);
        store.save_members(&members).unwrap();
        assert_eq!(store.load_members(), members);
    }

    #[test]
    fn corrupt_file_is_recovered_from_backup() {
        let (_root, store) = store();
        let books = sample_books();
        // First save creates the file, second save creates a backup of it.
        store.save_books(&books).unwrap();
        store.save_books(&books).unwrap();

        fs::write(store.data_dir().join("books.json"), "{ truncated").unwrap();
        let loaded = store.load_books();
        assert_eq!(loaded, books);
    }

    #[test]
    fn corrupt_file_without_backup_degrades_to_empty() {
        let (_root, store) = store();
        fs::write(store.data_dir().join("books.json"), "not json at all").unwrap();
        assert!(store.load_books().is_empty());
    }

    #[test]
    fn unsupported_version_counts_as_corrupt() {
        let (_root, store) = store();
        fs::write(
            store.data_dir().join("books.json"),
            r#"{"version": 99, "books": {}}"#,
        )
        .unwrap();
        assert!(store.load_books().is_empty());
    }

    #[test]
    fn repeated_saves_retain_at_most_five_backups() {
        let (_root, store) = store();
        let books = sample_books();
        for _ in 0..8 {
            store.save_books(&books).unwrap();
        }
        let backups: Vec<_> = fs::read_dir(store.data_dir().join("backups"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.starts_with("books_"))
            .collect();
        // Eight saves back up the file seven times; rotation keeps five.
        assert_eq!(backups.len(), 5);
    }

    #[test]
    fn loaded_status_reflects_saved_status() {
        let (_root, store) = store();
        let mut books = sample_books();
        books.get_mut(&9_780_441_172_719).unwrap().status = BookStatus::Borrowed;
        store.save_books(&books).unwrap();
        let loaded = store.load_books();
        assert_eq!(loaded[&9_780_441_172_719].status, BookStatus::Borrowed);
        assert_eq!(loaded[&9_780_060_512_750].status, BookStatus::Available);
    }
}

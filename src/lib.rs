//! Core library surface for the library catalog manager.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the domain models, the in-memory catalog, the file-backed
//! persistence gateway, and the orchestration service that ties them
//! together with write-through saves.

pub mod catalog;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;
pub mod ui;

/// The catalog store owning both identity-keyed collections.
pub use catalog::Library;

/// The domain error taxonomy shared across layers.
pub use error::{LibraryError, LibraryResult, StorageError};

/// The primary domain types that other layers manipulate.
pub use models::{Book, BookStatus, Member, MAX_BORROWED_BOOKS};

/// The orchestration layer the interactive shell talks to.
pub use service::LibraryService;

/// The persistence gateway, typically constructed once in `main.rs`.
pub use storage::FileStore;

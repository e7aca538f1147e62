//! Error types for the library catalog. Every failing condition a caller can
//! act on gets its own variant so the menu shell can render a precise message
//! and tests can assert on the exact outcome instead of matching strings.

use thiserror::Error;

/// Failures surfaced by the persistence gateway's save path. The load path
/// never returns these; it degrades to an empty collection instead.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Domain error taxonomy shared by the catalog store and the orchestration
/// layer. Validation failures, not-found conditions, and invariant
/// violations are all distinct; none of them leave a partial mutation
/// behind.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("book with ISBN {0} not found")]
    BookNotFound(u64),

    #[error("member with ID {0} not found")]
    MemberNotFound(u64),

    #[error("book with ISBN {0} already exists")]
    DuplicateIsbn(u64),

    #[error("member with ID {0} already exists")]
    DuplicateMemberId(u64),

    #[error("book with ISBN {0} is not available")]
    BookNotAvailable(u64),

    #[error("member {0} has reached the maximum borrowing limit")]
    BorrowLimitReached(u64),

    #[error("member {member_id} has not borrowed book {isbn}")]
    NotBorrowedByMember { member_id: u64, isbn: u64 },

    #[error("member {0} still has borrowed books")]
    MemberHasActiveBorrows(u64),

    #[error("book with ISBN {0} is currently borrowed")]
    BookCurrentlyBorrowed(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Shorthand used throughout the catalog and service layers.
pub type LibraryResult<T> = Result<T, LibraryError>;

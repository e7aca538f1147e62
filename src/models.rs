//! Domain models shared by the catalog, the persistence layer, and the menu
//! shell. The intent is that these types stay light-weight data holders so
//! other layers can focus on invariant enforcement and persistence logic.
//! Cross-references between entities use catalog identities (a member holds
//! borrowed ISBNs, not `Book` handles) so there is never shared mutable
//! ownership of a book.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Upper bound on how many books a single member may hold at once.
pub const MAX_BORROWED_BOOKS: usize = 5;

/// Smallest ISBN the generator will hand out (smallest 13-digit value with
/// the 978 bookland prefix).
const ISBN_MIN: u64 = 9_780_000_000_000;
/// Largest ISBN the generator will hand out.
const ISBN_MAX: u64 = 9_789_999_999_999;

/// Smallest generated member ID (smallest 12-digit value).
const MEMBER_ID_MIN: u64 = 100_000_000_000;
/// Largest generated member ID.
const MEMBER_ID_MAX: u64 = 999_999_999_999;

/// Circulation state of a single book. A book is `Borrowed` exactly while
/// its ISBN sits in one member's borrowed list; the catalog keeps the two in
/// step by always mutating them inside the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl BookStatus {
    /// Canonical text used both for display and for the persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Borrowed => "Borrowed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    /// Parse a status from persisted or legacy text. Comparison is
    /// case-insensitive; the canonical casing is whatever `as_str` returns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("available") {
            Ok(BookStatus::Available)
        } else if s.eq_ignore_ascii_case("borrowed") {
            Ok(BookStatus::Borrowed)
        } else {
            Err(format!("unknown book status: {s}"))
        }
    }
}

/// A single catalog entry. Identity is the numeric ISBN; no checksum
/// validation is performed against the real-world ISBN standard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub isbn: u64,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
}

impl Book {
    /// Create a book with a freshly generated ISBN. New books always start
    /// out `Available`.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self::with_isbn(title, author, generate_isbn())
    }

    /// Create a book with a caller-supplied ISBN. The value is honored as-is
    /// as long as it is positive; uniqueness is checked by the catalog at
    /// add time, not here.
    pub fn with_isbn(title: impl Into<String>, author: impl Into<String>, isbn: u64) -> Self {
        Self {
            isbn,
            title: title.into(),
            author: author.into(),
            status: BookStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ISBN: {}, Title: {}, Author: {}, Status: {}",
            self.isbn, self.title, self.author, self.status
        )
    }
}

/// A registered library member. The borrowed list stores ISBNs in checkout
/// order; the catalog resolves them back to `Book`s on demand for display
/// and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub member_id: u64,
    pub name: String,
    pub borrowed: Vec<u64>,
}

impl Member {
    /// Register a member under a freshly generated ID with an empty
    /// borrowed list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            member_id: generate_member_id(),
            name: name.into(),
            borrowed: Vec::new(),
        }
    }

    /// Whether the member is below the borrowing limit. Strict `<` so the
    /// sixth concurrent checkout is rejected.
    pub fn can_borrow_more(&self) -> bool {
        self.borrowed.len() < MAX_BORROWED_BOOKS
    }

    pub fn has_borrowed(&self, isbn: u64) -> bool {
        self.borrowed.contains(&isbn)
    }

    pub fn borrowed_count(&self) -> usize {
        self.borrowed.len()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Books Borrowed: {}",
            self.member_id,
            self.name,
            self.borrowed.len()
        )
    }
}

/// Draw a pseudo-random 13-digit ISBN. Collisions are not retried here; a
/// collision surfaces as a duplicate-rejection when the book is added to
/// the catalog.
fn generate_isbn() -> u64 {
    rand::thread_rng().gen_range(ISBN_MIN..=ISBN_MAX)
}

/// Draw a pseudo-random 12-digit member ID. Same collision policy as ISBNs.
fn generate_member_id() -> u64 {
    rand::thread_rng().gen_range(MEMBER_ID_MIN..=MEMBER_ID_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_isbn_is_thirteen_digits_in_bookland() {
        for _ in 0..100 {
            let book = Book::new("Title", "Author");
            assert!((ISBN_MIN..=ISBN_MAX).contains(&book.isbn));
            assert_eq!(book.status, BookStatus::Available);
        }
    }

    #[test]
    fn generated_member_id_is_twelve_digits() {
        for _ in 0..100 {
            let member = Member::new("Name");
            assert!((MEMBER_ID_MIN..=MEMBER_ID_MAX).contains(&member.member_id));
            assert!(member.borrowed.is_empty());
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("AVAILABLE".parse::<BookStatus>(), Ok(BookStatus::Available));
        assert_eq!("borrowed".parse::<BookStatus>(), Ok(BookStatus::Borrowed));
        assert!("lost".parse::<BookStatus>().is_err());
    }

    #[test]
    fn borrow_limit_uses_strict_comparison() {
        let mut member = Member::new("Limit");
        for isbn in 0..MAX_BORROWED_BOOKS as u64 {
            assert!(member.can_borrow_more());
            member.borrowed.push(isbn);
        }
        assert!(!member.can_borrow_more());
    }
}

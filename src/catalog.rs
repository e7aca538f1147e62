//! The in-memory catalog store. `Library` owns the two identity-keyed
//! collections (books by ISBN, members by ID) and is the only place that
//! mutates them, which is what keeps the book-status/borrowed-list invariant
//! honest: every composite operation checks all of its preconditions first
//! and only then touches both entities, so a failed call never leaves a
//! half-applied mutation behind.

use std::collections::HashMap;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Book, BookStatus, Member};

/// Central catalog state for one process run. Constructed empty, seeded by
/// the orchestration layer from persisted data, and mutated in place by a
/// single control thread.
#[derive(Debug, Default)]
pub struct Library {
    books: HashMap<u64, Book>,
    members: HashMap<u64, Member>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- book management ----

    /// Insert a book, rejecting a duplicate ISBN. A book whose ISBN is
    /// already present is rejected regardless of its status.
    pub fn add_book(&mut self, book: Book) -> LibraryResult<()> {
        if self.books.contains_key(&book.isbn) {
            return Err(LibraryError::DuplicateIsbn(book.isbn));
        }
        self.books.insert(book.isbn, book);
        Ok(())
    }

    /// Remove a book unconditionally. The borrowed-status guard lives in the
    /// orchestration layer; the store only reports whether the ISBN existed.
    pub fn remove_book(&mut self, isbn: u64) -> LibraryResult<Book> {
        self.books
            .remove(&isbn)
            .ok_or(LibraryError::BookNotFound(isbn))
    }

    pub fn find_book(&self, isbn: u64) -> Option<&Book> {
        self.books.get(&isbn)
    }

    /// Substring match against titles, case-insensitive. Result order follows
    /// map iteration and is display-only.
    pub fn search_books_by_title(&self, term: &str) -> Vec<&Book> {
        let needle = term.to_lowercase();
        self.books
            .values()
            .filter(|book| book.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Substring match against authors, case-insensitive.
    pub fn search_books_by_author(&self, term: &str) -> Vec<&Book> {
        let needle = term.to_lowercase();
        self.books
            .values()
            .filter(|book| book.author.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn all_books(&self) -> Vec<&Book> {
        self.books.values().collect()
    }

    pub fn available_books(&self) -> Vec<&Book> {
        self.books.values().filter(|b| b.is_available()).collect()
    }

    pub fn borrowed_books(&self) -> Vec<&Book> {
        self.books.values().filter(|b| !b.is_available()).collect()
    }

    // ---- member management ----

    /// Insert a member, rejecting a duplicate ID.
    pub fn add_member(&mut self, member: Member) -> LibraryResult<()> {
        if self.members.contains_key(&member.member_id) {
            return Err(LibraryError::DuplicateMemberId(member.member_id));
        }
        self.members.insert(member.member_id, member);
        Ok(())
    }

    /// Remove a member. Fails while the member still holds borrowed books so
    /// a book can never point back at a member the catalog has forgotten.
    pub fn remove_member(&mut self, member_id: u64) -> LibraryResult<Member> {
        let member = self
            .members
            .get(&member_id)
            .ok_or(LibraryError::MemberNotFound(member_id))?;
        if !member.borrowed.is_empty() {
            return Err(LibraryError::MemberHasActiveBorrows(member_id));
        }
        Ok(self
            .members
            .remove(&member_id)
            .expect("member existed under this id"))
    }

    pub fn find_member(&self, member_id: u64) -> Option<&Member> {
        self.members.get(&member_id)
    }

    /// Substring match against member names, case-insensitive.
    pub fn search_members_by_name(&self, term: &str) -> Vec<&Member> {
        let needle = term.to_lowercase();
        self.members
            .values()
            .filter(|member| member.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn all_members(&self) -> Vec<&Member> {
        self.members.values().collect()
    }

    // ---- checkout / return ----

    /// Check a book out to a member. All preconditions are verified before
    /// either entity is touched; on success the book flips to `Borrowed` and
    /// its ISBN is appended to the member's borrowed list in the same call.
    pub fn checkout_book(&mut self, member_id: u64, isbn: u64) -> LibraryResult<()> {
        let member = self
            .members
            .get(&member_id)
            .ok_or(LibraryError::MemberNotFound(member_id))?;
        let book = self
            .books
            .get(&isbn)
            .ok_or(LibraryError::BookNotFound(isbn))?;

        if !book.is_available() {
            return Err(LibraryError::BookNotAvailable(isbn));
        }
        if !member.can_borrow_more() {
            return Err(LibraryError::BorrowLimitReached(member_id));
        }

        // Preconditions hold; apply both halves of the mutation.
        self.books
            .get_mut(&isbn)
            .expect("book existed under this isbn")
            .status = BookStatus::Borrowed;
        self.members
            .get_mut(&member_id)
            .expect("member existed under this id")
            .borrowed
            .push(isbn);
        Ok(())
    }

    /// Return a borrowed book. Verifies the ISBN actually sits in the
    /// member's borrowed list, removes it, and flips the book back to
    /// `Available`.
    pub fn return_book(&mut self, member_id: u64, isbn: u64) -> LibraryResult<()> {
        let member = self
            .members
            .get(&member_id)
            .ok_or(LibraryError::MemberNotFound(member_id))?;
        if !self.books.contains_key(&isbn) {
            return Err(LibraryError::BookNotFound(isbn));
        }
        if !member.has_borrowed(isbn) {
            return Err(LibraryError::NotBorrowedByMember { member_id, isbn });
        }

        let member = self
            .members
            .get_mut(&member_id)
            .expect("member existed under this id");
        member.borrowed.retain(|&held| held != isbn);
        self.books
            .get_mut(&isbn)
            .expect("book existed under this isbn")
            .status = BookStatus::Available;
        Ok(())
    }

    // ---- aggregates ----
    //
    // All counts are computed by full scan at call time. The collections are
    // small enough that maintained counters would only add invariants to
    // break.

    pub fn total_books(&self) -> usize {
        self.books.len()
    }

    pub fn total_members(&self) -> usize {
        self.members.len()
    }

    pub fn available_books_count(&self) -> usize {
        self.books.values().filter(|b| b.is_available()).count()
    }

    pub fn borrowed_books_count(&self) -> usize {
        self.books.values().filter(|b| !b.is_available()).count()
    }

    /// Members currently holding at least one book.
    pub fn active_members_count(&self) -> usize {
        self.members
            .values()
            .filter(|m| !m.borrowed.is_empty())
            .count()
    }
}

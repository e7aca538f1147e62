//! Orchestration layer sitting between the menu shell and the catalog.
//! Every mutating call validates its inputs, delegates the invariant checks
//! to the catalog store, and writes the affected collection(s) through to
//! the file store before returning. Read-only queries format catalog data
//! for display and never persist anything.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::catalog::Library;
use crate::error::{LibraryError, LibraryResult};
use crate::models::{Book, Member};
use crate::storage::FileStore;

/// Owns the catalog and the persistence gateway for one process run. There
/// is no ambient state: the instance is constructed at startup, seeded via
/// `load_all`, and flushed via `save_all` at shutdown.
pub struct LibraryService {
    library: Library,
    store: FileStore,
}

impl LibraryService {
    pub fn new(store: FileStore) -> Self {
        Self {
            library: Library::new(),
            store,
        }
    }

    /// Direct access to the catalog for read-only callers (the shell's
    /// statistics view, tests).
    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    // ---- mutations ----

    /// Register a new member and persist the members collection. Returns
    /// the generated member ID.
    pub fn register_member(&mut self, name: &str) -> LibraryResult<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::Validation(
                "member name cannot be empty".into(),
            ));
        }

        let member = Member::new(name);
        let member_id = member.member_id;
        self.library.add_member(member)?;
        info!(member_id, name, "registered member");
        self.persist_members();
        Ok(member_id)
    }

    /// Add a new book, generating an ISBN when the caller does not supply
    /// one, and persist the books collection. Returns the resulting ISBN.
    pub fn add_new_book(
        &mut self,
        title: &str,
        author: &str,
        isbn: Option<u64>,
    ) -> LibraryResult<u64> {
        let title = title.trim();
        let author = author.trim();
        if title.is_empty() {
            return Err(LibraryError::Validation("book title cannot be empty".into()));
        }
        if author.is_empty() {
            return Err(LibraryError::Validation(
                "book author cannot be empty".into(),
            ));
        }
        if isbn == Some(0) {
            return Err(LibraryError::Validation("ISBN must be a positive value".into()));
        }

        let book = match isbn {
            Some(isbn) => Book::with_isbn(title, author, isbn),
            None => Book::new(title, author),
        };
        let isbn = book.isbn;
        self.library.add_book(book)?;
        info!(isbn, title, author, "added book");
        self.persist_books();
        Ok(isbn)
    }

    /// Check a book out to a member. Both entities are re-validated up
    /// front so an unknown ID is reported distinctly, then the composite
    /// mutation is delegated to the catalog. A checkout touches both
    /// collections, so both files are persisted.
    pub fn borrow_book(&mut self, member_id: u64, isbn: u64) -> LibraryResult<()> {
        if self.library.find_member(member_id).is_none() {
            return Err(LibraryError::MemberNotFound(member_id));
        }
        if self.library.find_book(isbn).is_none() {
            return Err(LibraryError::BookNotFound(isbn));
        }

        self.library.checkout_book(member_id, isbn)?;
        info!(member_id, isbn, "book checked out");
        self.persist_books();
        self.persist_members();
        Ok(())
    }

    /// Return a borrowed book. Mirror image of `borrow_book`, including the
    /// dual persist.
    pub fn return_book(&mut self, member_id: u64, isbn: u64) -> LibraryResult<()> {
        if self.library.find_member(member_id).is_none() {
            return Err(LibraryError::MemberNotFound(member_id));
        }
        if self.library.find_book(isbn).is_none() {
            return Err(LibraryError::BookNotFound(isbn));
        }

        self.library.return_book(member_id, isbn)?;
        info!(member_id, isbn, "book returned");
        self.persist_books();
        self.persist_members();
        Ok(())
    }

    /// Delete a book from the catalog. Refused while the book is checked
    /// out, otherwise removed and persisted.
    pub fn delete_book(&mut self, isbn: u64) -> LibraryResult<()> {
        let book = self
            .library
            .find_book(isbn)
            .ok_or(LibraryError::BookNotFound(isbn))?;
        if !book.is_available() {
            return Err(LibraryError::BookCurrentlyBorrowed(isbn));
        }

        self.library.remove_book(isbn)?;
        info!(isbn, "deleted book");
        self.persist_books();
        Ok(())
    }

    /// Remove a member. Refused while the member holds any books.
    pub fn remove_member(&mut self, member_id: u64) -> LibraryResult<()> {
        self.library.remove_member(member_id)?;
        info!(member_id, "removed member");
        self.persist_members();
        Ok(())
    }

    // ---- bulk persistence ----

    /// Persist both collections. Used at shutdown and available from the
    /// shell; the first error is reported after both saves were attempted.
    pub fn save_all(&self) -> LibraryResult<()> {
        let books = self.store.save_books(&self.books_by_isbn());
        let members = self.store.save_members(&self.members_by_id());
        books?;
        members?;
        Ok(())
    }

    /// Seed the catalog from the persisted collections. The merge is
    /// additive: entities whose identity is already present are skipped by
    /// the catalog's duplicate rejection rather than overwritten. Returns
    /// how many books and members were merged in.
    pub fn load_all(&mut self) -> (usize, usize) {
        let mut books_loaded = 0;
        for (_, book) in self.store.load_books() {
            if self.library.add_book(book).is_ok() {
                books_loaded += 1;
            }
        }

        let mut members_loaded = 0;
        for (_, member) in self.store.load_members() {
            if self.library.add_member(member).is_ok() {
                members_loaded += 1;
            }
        }

        info!(books_loaded, members_loaded, "library data loaded");
        (books_loaded, members_loaded)
    }

    /// Write-through persist of the books file. A failure does not undo
    /// the in-memory mutation that triggered it; the state is recoverable
    /// at the next successful save, so it is logged and swallowed here.
    fn persist_books(&self) {
        if let Err(err) = self.store.save_books(&self.books_by_isbn()) {
            warn!(error = %err, "failed to persist books; in-memory state is ahead of disk");
        }
    }

    /// Write-through persist of the members file. Same failure policy as
    /// `persist_books`.
    fn persist_members(&self) {
        if let Err(err) = self.store.save_members(&self.members_by_id()) {
            warn!(error = %err, "failed to persist members; in-memory state is ahead of disk");
        }
    }

    fn books_by_isbn(&self) -> HashMap<u64, Book> {
        self.library
            .all_books()
            .into_iter()
            .map(|book| (book.isbn, book.clone()))
            .collect()
    }

    fn members_by_id(&self) -> HashMap<u64, Member> {
        self.library
            .all_members()
            .into_iter()
            .map(|member| (member.member_id, member.clone()))
            .collect()
    }

    // ---- read-only queries for the shell ----

    pub fn all_books_report(&self) -> String {
        let books = self.library.all_books();
        let mut out = String::from("=== ALL BOOKS ===\n");
        if books.is_empty() {
            out.push_str("No books in the library.\n");
        } else {
            for book in books {
                out.push_str(&format!("{book}\n"));
            }
        }
        out
    }

    pub fn available_books_report(&self) -> String {
        let books = self.library.available_books();
        let mut out = String::from("=== AVAILABLE BOOKS ===\n");
        if books.is_empty() {
            out.push_str("No available books.\n");
        } else {
            for book in books {
                out.push_str(&format!(
                    "ISBN: {}, Title: {}, Author: {}\n",
                    book.isbn, book.title, book.author
                ));
            }
        }
        out
    }

    pub fn borrowed_books_report(&self) -> String {
        let books = self.library.borrowed_books();
        let mut out = String::from("=== BORROWED BOOKS ===\n");
        if books.is_empty() {
            out.push_str("No borrowed books.\n");
        } else {
            for book in books {
                out.push_str(&format!(
                    "ISBN: {}, Title: {}, Author: {}\n",
                    book.isbn, book.title, book.author
                ));
            }
        }
        out
    }

    pub fn all_members_report(&self) -> String {
        let members = self.library.all_members();
        let mut out = String::from("=== ALL MEMBERS ===\n");
        if members.is_empty() {
            out.push_str("No members registered.\n");
        } else {
            for member in members {
                out.push_str(&format!("{member}\n"));
            }
        }
        out
    }

    /// Books whose title contains `term`, or an error for a blank term.
    /// Empty-term rejection lives here, not in the catalog.
    pub fn find_books_by_title(&self, term: &str) -> LibraryResult<String> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LibraryError::Validation("search term cannot be empty".into()));
        }

        let results = self.library.search_books_by_title(term);
        if results.is_empty() {
            return Ok(format!("No books found with title containing: '{term}'"));
        }
        let mut out = format!("=== BOOKS FOUND ({}) ===\n", results.len());
        for book in results {
            out.push_str(&format!("{book}\n"));
        }
        Ok(out)
    }

    pub fn find_books_by_author(&self, term: &str) -> LibraryResult<String> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LibraryError::Validation("search term cannot be empty".into()));
        }

        let results = self.library.search_books_by_author(term);
        if results.is_empty() {
            return Ok(format!("No books found by: '{term}'"));
        }
        let mut out = format!("=== BOOKS BY {} ===\n", term.to_uppercase());
        for book in results {
            out.push_str(&format!(
                "ISBN: {}, Title: {}, Status: {}\n",
                book.isbn, book.title, book.status
            ));
        }
        Ok(out)
    }

    pub fn find_book_by_isbn(&self, isbn: u64) -> LibraryResult<String> {
        let book = self
            .library
            .find_book(isbn)
            .ok_or(LibraryError::BookNotFound(isbn))?;
        Ok(format!(
            "Book Found:\nISBN: {}\nTitle: {}\nAuthor: {}\nStatus: {}",
            book.isbn, book.title, book.author, book.status
        ))
    }

    /// Member details with their borrowed list resolved to titles through
    /// the catalog (the member itself only stores ISBNs).
    pub fn find_member_by_id(&self, member_id: u64) -> LibraryResult<String> {
        let member = self
            .library
            .find_member(member_id)
            .ok_or(LibraryError::MemberNotFound(member_id))?;

        let mut out = format!(
            "Member Found:\nID: {}\nName: {}\nBooks Borrowed: {}\n",
            member.member_id,
            member.name,
            member.borrowed_count()
        );
        if !member.borrowed.is_empty() {
            out.push_str("Borrowed Books:\n");
            for &isbn in &member.borrowed {
                match self.library.find_book(isbn) {
                    Some(book) => out.push_str(&format!(
                        "  - {} by {} (ISBN: {})\n",
                        book.title, book.author, book.isbn
                    )),
                    None => out.push_str(&format!("  - unknown book (ISBN: {isbn})\n")),
                }
            }
        }
        Ok(out)
    }

    pub fn find_members_by_name(&self, term: &str) -> LibraryResult<String> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LibraryError::Validation("search term cannot be empty".into()));
        }

        let results = self.library.search_members_by_name(term);
        if results.is_empty() {
            return Ok(format!("No members found with name containing: '{term}'"));
        }
        let mut out = format!("=== MEMBERS FOUND ({}) ===\n", results.len());
        for member in results {
            out.push_str(&format!("{member}\n"));
        }
        Ok(out)
    }

    pub fn member_borrowed_books(&self, member_id: u64) -> LibraryResult<String> {
        let member = self
            .library
            .find_member(member_id)
            .ok_or(LibraryError::MemberNotFound(member_id))?;
        if member.borrowed.is_empty() {
            return Ok(format!("{} has no borrowed books.", member.name));
        }

        let mut out = format!("Books borrowed by {}:\n", member.name);
        for &isbn in &member.borrowed {
            match self.library.find_book(isbn) {
                Some(book) => out.push_str(&format!(
                    "- {} by {} (ISBN: {})\n",
                    book.title, book.author, book.isbn
                )),
                None => out.push_str(&format!("- unknown book (ISBN: {isbn})\n")),
            }
        }
        Ok(out)
    }

    /// Aggregate statistics block. All counts are full scans over the
    /// catalog at call time.
    pub fn statistics_report(&self) -> String {
        let total_books = self.library.total_books();
        let available = self.library.available_books_count();
        let borrowed = self.library.borrowed_books_count();
        let total_members = self.library.total_members();
        let active_members = self.library.active_members_count();

        let mut out = String::from("=== LIBRARY STATISTICS ===\n");
        out.push_str(&format!("Total Books: {total_books}\n"));
        out.push_str(&format!("Available Books: {available}\n"));
        out.push_str(&format!("Borrowed Books: {borrowed}\n"));
        out.push_str(&format!("Total Members: {total_members}\n"));
        out.push_str(&format!("Active Members (with books): {active_members}\n"));
        out.push_str(&format!(
            "Inactive Members: {}\n",
            total_members - active_members
        ));
        if total_members > 0 {
            let active_pct = active_members as f64 * 100.0 / total_members as f64;
            out.push_str(&format!("Active Members Percentage: {active_pct:.1}%\n"));
        }
        out
    }

    pub fn data_files_report(&self) -> String {
        format!("=== DATA FILES ===\n{}", self.store.files_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;
    use std::fs;
    use tempfile::TempDir;

    fn service() -> (TempDir, LibraryService) {
        let root = TempDir::new().unwrap();
        let store = FileStore::new(root.path().join("data")).unwrap();
        (root, LibraryService::new(store))
    }

    #[test]
    fn blank_inputs_are_rejected_before_touching_the_catalog() {
        let (_root, mut service) = service();
        assert!(matches!(
            service.register_member("   "),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            service.add_new_book("", "Author", None),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            service.add_new_book("Title", "  ", None),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            service.add_new_book("Title", "Author", Some(0)),
            Err(LibraryError::Validation(_))
        ));
        assert_eq!(service.library().total_books(), 0);
        assert_eq!(service.library().total_members(), 0);
    }

    #[test]
    fn added_book_is_immediately_findable_and_available() {
        let (_root, mut service) = service();
        let isbn = service.add_new_book("Dune", "Herbert", None).unwrap();
        let book = service.library().find_book(isbn).unwrap();
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn caller_supplied_isbn_is_honored() {
        let (_root, mut service) = service();
        let isbn = service
            .add_new_book("Dune", "Herbert", Some(9_780_441_172_719))
            .unwrap();
        assert_eq!(isbn, 9_780_441_172_719);
    }

    #[test]
    fn end_to_end_borrow_and_return_scenario() {
        let (_root, mut service) = service();
        let member_id = service.register_member("Alice").unwrap();
        let isbn = service.add_new_book("Dune", "Herbert", None).unwrap();

        service.borrow_book(member_id, isbn).unwrap();
        assert_eq!(
            service.library().find_book(isbn).unwrap().status,
            BookStatus::Borrowed
        );
        assert_eq!(
            service.library().find_member(member_id).unwrap().borrowed,
            vec![isbn]
        );

        assert!(matches!(
            service.borrow_book(member_id, isbn),
            Err(LibraryError::BookNotAvailable(_))
        ));

        service.return_book(member_id, isbn).unwrap();
        assert_eq!(
            service.library().find_book(isbn).unwrap().status,
            BookStatus::Available
        );
        assert!(service
            .library()
            .find_member(member_id)
            .unwrap()
            .borrowed
            .is_empty());
    }

    #[test]
    fn borrow_reports_unknown_ids_before_delegating() {
        let (_root, mut service) = service();
        let member_id = service.register_member("Alice").unwrap();
        assert!(matches!(
            service.borrow_book(member_id + 1, 1),
            Err(LibraryError::MemberNotFound(_))
        ));
        assert!(matches!(
            service.borrow_book(member_id, 1),
            Err(LibraryError::BookNotFound(1))
        ));
    }

    #[test]
    fn borrowed_book_cannot_be_deleted() {
        let (_root, mut service) = service();
        let member_id = service.register_member("Alice").unwrap();
        let isbn = service.add_new_book("Dune", "Herbert", None).unwrap();
        service.borrow_book(member_id, isbn).unwrap();

        assert!(matches!(
            service.delete_book(isbn),
            Err(LibraryError::BookCurrentlyBorrowed(_))
        ));
        assert!(service.library().find_book(isbn).is_some());

        service.return_book(member_id, isbn).unwrap();
        service.delete_book(isbn).unwrap();
        assert!(service.library().find_book(isbn).is_none());
    }

    #[test]
    fn member_with_borrows_cannot_be_removed() {
        let (_root, mut service) = service();
        let member_id = service.register_member("Alice").unwrap();
        let isbn = service.add_new_book("Dune", "Herbert", None).unwrap();
        service.borrow_book(member_id, isbn).unwrap();

        assert!(matches!(
            service.remove_member(member_id),
            Err(LibraryError::MemberHasActiveBorrows(_))
        ));
        assert!(service.library().find_member(member_id).is_some());
    }

    #[test]
    fn mutations_write_through_to_disk() {
        let root = TempDir::new().unwrap();
        let data_dir = root.path().join("data");
        let member_id;
        let isbn;
        {
            let mut service = LibraryService::new(FileStore::new(&data_dir).unwrap());
            member_id = service.register_member("Alice").unwrap();
            isbn = service.add_new_book("Dune", "Herbert", None).unwrap();
            service.borrow_book(member_id, isbn).unwrap();
            // No explicit save_all: write-through already persisted both
            // collections.
        }

        let mut fresh = LibraryService::new(FileStore::new(&data_dir).unwrap());
        fresh.load_all();
        assert_eq!(
            fresh.library().find_book(isbn).unwrap().status,
            BookStatus::Borrowed
        );
        assert_eq!(
            fresh.library().find_member(member_id).unwrap().borrowed,
            vec![isbn]
        );
    }

    #[test]
    fn load_all_merges_additively() {
        let root = TempDir::new().unwrap();
        let data_dir = root.path().join("data");
        let isbn;
        {
            let mut seeded = LibraryService::new(FileStore::new(&data_dir).unwrap());
            isbn = seeded
                .add_new_book("Dune", "Herbert", Some(9_780_441_172_719))
                .unwrap();
        }

        let mut service = LibraryService::new(FileStore::new(&data_dir).unwrap());
        // The in-memory copy already holds the same ISBN with a different
        // title; the loaded duplicate must be skipped, not overwrite it.
        service
            .add_new_book("Dune (annotated)", "Herbert", Some(isbn))
            .unwrap();
        let (books_loaded, _) = service.load_all();
        assert_eq!(books_loaded, 0);
        assert_eq!(
            service.library().find_book(isbn).unwrap().title,
            "Dune (annotated)"
        );
    }

    #[test]
    fn save_failure_leaves_in_memory_state_intact() {
        let (root, mut service) = service();
        let member_id = service.register_member("Alice").unwrap();
        // Replace the members file with a directory so the next save fails.
        let members_path = root.path().join("data").join("members.json");
        fs::remove_file(&members_path).unwrap();
        fs::create_dir(&members_path).unwrap();

        let second = service.register_member("Bob").unwrap();
        assert_eq!(service.library().total_members(), 2);
        assert!(service.library().find_member(member_id).is_some());
        assert!(service.library().find_member(second).is_some());
        assert!(service.save_all().is_err());
    }
}

//! On-disk record schema for the two persisted collections. These types are
//! deliberately decoupled from the in-memory models: the files carry a
//! version tag and plain serde structs, so the format can evolve without
//! dragging the domain types along. `BTreeMap` keys keep the serialized
//! output stable, which makes the files diffable across saves.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::models::{Book, Member};

/// Current schema version written into every file. A file carrying any
/// other version is treated the same as a corrupt file.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of one book. The ISBN lives in the surrounding map key.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub status: String,
}

/// Serialized form of one member. Borrowed books are stored as ISBNs in
/// checkout order.
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberRecord {
    pub name: String,
    pub borrowed: Vec<u64>,
}

/// Envelope for the books file.
#[derive(Debug, Serialize, Deserialize)]
pub struct BooksFile {
    pub version: u32,
    pub books: BTreeMap<u64, BookRecord>,
}

/// Envelope for the members file.
#[derive(Debug, Serialize, Deserialize)]
pub struct MembersFile {
    pub version: u32,
    pub members: BTreeMap<u64, MemberRecord>,
}

impl BooksFile {
    pub fn from_books(books: &HashMap<u64, Book>) -> Self {
        Self {
            version: FORMAT_VERSION,
            books: books
                .iter()
                .map(|(&isbn, book)| {
                    (
                        isbn,
                        BookRecord {
                            title: book.title.clone(),
                            author: book.author.clone(),
                            status: book.status.as_str().to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Rebuild the in-memory collection. Rejects a version mismatch or an
    /// unparseable status so the caller's restore-and-retry path kicks in.
    pub fn into_books(self) -> Result<HashMap<u64, Book>, StorageError> {
        if self.version != FORMAT_VERSION {
            return Err(StorageError::InvalidRecord(format!(
                "unsupported books file version {}",
                self.version
            )));
        }
        self.books
            .into_iter()
            .map(|(isbn, record)| {
                let status = record
                    .status
                    .parse()
                    .map_err(StorageError::InvalidRecord)?;
                Ok((
                    isbn,
                    Book {
                        isbn,
                        title: record.title,
                        author: record.author,
                        status,
                    },
                ))
            })
            .collect()
    }
}

impl MembersFile {
    pub fn from_members(members: &HashMap<u64, Member>) -> Self {
        Self {
            version: FORMAT_VERSION,
            members: members
                .iter()
                .map(|(&member_id, member)| {
                    (
                        member_id,
                        MemberRecord {
                            name: member.name.clone(),
                            borrowed: member.borrowed.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn into_members(self) -> Result<HashMap<u64, Member>, StorageError> {
        if self.version != FORMAT_VERSION {
            return Err(StorageError::InvalidRecord(format!(
                "unsupported members file version {}",
                self.version
            )));
        }
        Ok(self
            .members
            .into_iter()
            .map(|(member_id, record)| {
                (
                    member_id,
                    Member {
                        member_id,
                        name: record.name,
                        borrowed: record.borrowed,
                    },
                )
            })
            .collect())
    }
}

//! The boundary between the console and the embedded key-value engine.
//!
//! The console treats the store as an ordered map of byte strings. Every access
//! happens inside a transaction obtained from a [`Store`]; writes become
//! visible only once [`WriteTxn::commit`] succeeds.

mod durable;
#[cfg(test)]
pub(crate) mod flaky;
mod memory;

pub use durable::RedbStore;
pub use memory::MemStore;

use std::ops::Bound;
use thiserror::Error;

/// A key/value pair copied out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Statistics reported by the `stat` command.
///
/// Fields other than `entries` are engine specific and left empty when the
/// engine has no notion of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStat {
    pub entries: u64,
    pub tree_height: Option<u32>,
    pub stored_bytes: Option<u64>,
    pub file_bytes: Option<u64>,
}

/// Failures reported by a store engine.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store is opened read-only")]
    ReadOnly,

    #[error("store error: {0}")]
    Redb(#[from] redb::Error),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Other(String),
}

macro_rules! redb_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Redb(e.into())
                }
            }
        )*
    };
}

redb_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Entries in key order, as produced by [`ReadTxn::range_from`].
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<Entry, StoreError>> + 'a>;

/// Read access shared by read-only and read-write transactions.
pub trait ReadTxn {
    /// Looks up a single key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Returns the first entry whose key satisfies `from` as a lower bound.
    ///
    /// `Included(k)` positions at the first key `>= k`, `Excluded(k)` at the
    /// first key `> k` and `Unbounded` at the smallest key.
    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError>;

    /// Walks the entries from `from` (same bound rules as [`ReadTxn::seek`])
    /// to the end of the key space. The walk stops after the first error.
    ///
    /// The provided implementation seeks once per entry. Engines that can
    /// hold a range open override it.
    fn range_from<'t>(&'t self, from: Bound<&[u8]>) -> Result<EntryIter<'t>, StoreError> {
        let mut next = Some(from.map(<[u8]>::to_vec));
        Ok(Box::new(std::iter::from_fn(move || {
            let bound = next.take()?;
            match self.seek(bound.as_ref().map(Vec::as_slice)) {
                Ok(Some(entry)) => {
                    next = Some(Bound::Excluded(entry.key.clone()));
                    Some(Ok(entry))
                }
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            }
        })))
    }

    fn stat(&self) -> Result<StoreStat, StoreError>;
}

/// A read-write transaction. Dropping it without calling [`WriteTxn::commit`]
/// discards its changes.
pub trait WriteTxn: ReadTxn {
    /// Inserts or replaces the value stored under `key`.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Removes `key`, returning whether it existed.
    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn abort(self: Box<Self>) -> Result<(), StoreError>;
}

/// An opened store environment holding the default database.
pub trait Store {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError>;

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError>;
}

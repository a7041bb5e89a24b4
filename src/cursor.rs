//! Paginated range scans.
//!
//! A [`Cursor`] remembers where a scan stands instead of holding a live engine
//! iterator: every page is read in its own read transaction and resumes
//! strictly after the last key handed out. This lets a scan survive between
//! console turns without pinning a transaction.

use crate::store::{Entry, ReadTxn, StoreError};
use std::ops::Bound;

/// Default number of entries per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Position and bounds of an in-progress scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    prefix: Option<Vec<u8>>,
    include_values: bool,
    last_key: Option<Vec<u8>>,
}

/// How a page ended.
#[derive(Debug)]
pub enum PageEnd {
    /// The page is full; more entries may follow.
    Full,
    /// The range is exhausted or the scan left its prefix.
    Exhausted,
    /// The engine failed part-way through the page.
    Failed(StoreError),
}

/// Entries read for one page, in key order.
#[derive(Debug)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub end: PageEnd,
}

impl Cursor {
    /// A cursor positioned before the first key, or before the first key
    /// `>= prefix` when a prefix bounds the scan.
    pub fn new(prefix: Option<Vec<u8>>, include_values: bool) -> Self {
        Self {
            prefix,
            include_values,
            last_key: None,
        }
    }

    pub fn prefix(&self) -> Option<&[u8]> {
        self.prefix.as_deref()
    }

    pub fn include_values(&self) -> bool {
        self.include_values
    }

    fn next_bound(&self) -> Bound<&[u8]> {
        match (&self.last_key, &self.prefix) {
            (Some(last), _) => Bound::Excluded(last.as_slice()),
            (None, Some(prefix)) => Bound::Included(prefix.as_slice()),
            (None, None) => Bound::Unbounded,
        }
    }

    fn in_range(&self, key: &[u8]) -> bool {
        self.prefix
            .as_deref()
            .is_none_or(|prefix| key.starts_with(prefix))
    }

    /// Reads up to `page_size` entries from one range over `txn`, advancing
    /// the cursor past each one.
    pub fn fill_page(&mut self, txn: &dyn ReadTxn, page_size: usize) -> Page {
        let mut entries = Vec::with_capacity(page_size);
        let mut range = match txn.range_from(self.next_bound()) {
            Ok(range) => range,
            Err(e) => {
                return Page {
                    entries,
                    end: PageEnd::Failed(e),
                };
            }
        };

        while entries.len() < page_size {
            let end = match range.next() {
                Some(Ok(entry)) if self.in_range(&entry.key) => {
                    self.last_key = Some(entry.key.clone());
                    entries.push(entry);
                    continue;
                }
                Some(Err(e)) => PageEnd::Failed(e),
                _ => PageEnd::Exhausted,
            };
            return Page { entries, end };
        }
        Page {
            entries,
            end: PageEnd::Full,
        }
    }
}

//! The state shared by every command of a console session.

use crate::cursor::{Cursor, DEFAULT_PAGE_SIZE, PageEnd};
use crate::error::Result;
use crate::store::{Entry, ReadTxn, Store, WriteTxn};
use std::io::Write;
use tracing::{debug, warn};

/// Printed when a scan page fills up and `it` may return more entries.
pub const SCAN_MORE: &[u8] = br#""it" for more"#;

/// Owns the store handle, the output sink and at most one open scan cursor.
///
/// Commands never hold a transaction between calls: reads and writes go
/// through [`Session::within_read`] and [`Session::within_write`].
pub struct Session {
    store: Box<dyn Store>,
    cursor: Option<Cursor>,
    out: Box<dyn Write>,
    page_size: usize,
    /// When set to true, the interpreter stops reading input.
    pub should_exit: bool,
}

impl Session {
    pub fn new(store: Box<dyn Store>, out: Box<dyn Write>) -> Self {
        Self {
            store,
            cursor: None,
            out,
            page_size: DEFAULT_PAGE_SIZE,
            should_exit: false,
        }
    }

    /// Sets the number of entries printed per scan page. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Writes `data` followed by a newline.
    pub fn output(&mut self, data: &[u8]) -> Result<()> {
        self.out.write_all(data)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    /// Runs `work` in a read-only transaction, released whatever the outcome.
    pub fn within_read<T>(&self, work: impl FnOnce(&dyn ReadTxn) -> Result<T>) -> Result<T> {
        let txn = self.store.begin_read()?;
        work(txn.as_ref())
    }

    /// Runs `work` in a read-write transaction.
    ///
    /// The transaction commits when `work` succeeds and is aborted otherwise;
    /// the error from `work` is returned unchanged.
    pub fn within_write<T>(
        &self,
        work: impl FnOnce(&mut dyn WriteTxn) -> Result<T>,
    ) -> Result<T> {
        let mut txn = self.store.begin_write()?;
        match work(txn.as_mut()) {
            Ok(value) => {
                txn.commit()?;
                debug!("write transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "failed to abort write transaction");
                }
                debug!(error = %e, "write transaction aborted");
                Err(e)
            }
        }
    }

    /// Opens a new scan, replacing any cursor that is still open.
    pub fn prepare_cursor(&mut self, prefix: Option<Vec<u8>>, include_values: bool) {
        debug!(
            prefix = ?prefix.as_deref().map(String::from_utf8_lossy),
            include_values,
            "cursor opened"
        );
        self.cursor = Some(Cursor::new(prefix, include_values));
    }

    /// Closes the open cursor, if any. Closing twice is harmless.
    pub fn close_cursor(&mut self) {
        if self.cursor.take().is_some() {
            debug!("cursor closed");
        }
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    /// Prints the next page of the open cursor.
    ///
    /// Does nothing without an open cursor. The cursor is closed when the scan
    /// runs out of entries or when the store or the output fails; a full page
    /// leaves it open and ends with [`SCAN_MORE`].
    pub fn iterate(&mut self, page_size: usize) -> Result<()> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(());
        };
        let include_values = cursor.include_values();
        let page = self
            .store
            .begin_read()
            .map(|txn| cursor.fill_page(txn.as_ref(), page_size));
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                self.close_cursor();
                return Err(e.into());
            }
        };

        // The cursor already points past the whole page.
        if let Err(e) = self.print_entries(&page.entries, include_values) {
            self.close_cursor();
            return Err(e);
        }

        match page.end {
            PageEnd::Full => self.output(SCAN_MORE),
            PageEnd::Exhausted => {
                self.close_cursor();
                Ok(())
            }
            PageEnd::Failed(e) => {
                self.close_cursor();
                Err(e.into())
            }
        }
    }

    fn print_entries(&mut self, entries: &[Entry], include_values: bool) -> Result<()> {
        for entry in entries {
            self.output(&entry.key)?;
            if include_values {
                self.output(&entry.value)?;
                self.output(b"")?;
            }
        }
        Ok(())
    }
}

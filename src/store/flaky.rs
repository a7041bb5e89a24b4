//! A store wrapper that fails on request, for exercising error paths.

use super::{Entry, MemStore, ReadTxn, Store, StoreError, StoreStat, WriteTxn};
use std::cell::Cell;
use std::ops::Bound;

/// Wraps a [`MemStore`] and fails writes or seeks on request.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub inner: MemStore,
    /// Every `put` and `delete` fails after touching the staged data.
    pub fail_writes: bool,
    /// Number of seeks that succeed before every further seek fails.
    pub seeks_before_failure: Cell<Option<usize>>,
}

struct FlakyRead<'a> {
    inner: Box<dyn ReadTxn + 'a>,
    store: &'a FlakyStore,
}

impl ReadTxn for FlakyRead<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        match self.store.seeks_before_failure.get() {
            Some(0) => Err(StoreError::Other("injected seek failure".into())),
            Some(n) => {
                self.store.seeks_before_failure.set(Some(n - 1));
                self.inner.seek(from)
            }
            None => self.inner.seek(from),
        }
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        self.inner.stat()
    }
}

struct FlakyWrite<'a> {
    inner: Box<dyn WriteTxn + 'a>,
}

impl ReadTxn for FlakyWrite<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        self.inner.seek(from)
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        self.inner.stat()
    }
}

impl WriteTxn for FlakyWrite<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner.put(key, value)?;
        Err(StoreError::Other("injected put failure".into()))
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        self.inner.delete(key)?;
        Err(StoreError::Other("injected delete failure".into()))
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn abort(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.abort()
    }
}

impl Store for FlakyStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        Ok(Box::new(FlakyRead {
            inner: self.inner.begin_read()?,
            store: self,
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        let inner = self.inner.begin_write()?;
        if self.fail_writes {
            Ok(Box::new(FlakyWrite { inner }))
        } else {
            Ok(inner)
        }
    }
}

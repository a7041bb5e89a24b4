use super::{Entry, EntryIter, ReadTxn, Store, StoreError, StoreStat, WriteTxn};
use redb::{
    Database, ReadOnlyTable, ReadTransaction, ReadableTable, ReadableTableMetadata,
    TableDefinition, TableError, WriteTransaction,
};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use tracing::info;

/// The default database every console command operates on.
const DEFAULT_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("default");

/// On-disk store backed by a single redb database file.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
    read_only: bool,
}

impl RedbStore {
    /// Opens the database file at `path`, creating it unless `read_only`.
    ///
    /// `size_hint` is handed to the engine as its page cache budget. In
    /// read-only mode a missing file is an error and every write transaction
    /// is refused.
    pub fn open(path: &Path, size_hint: u64, read_only: bool) -> Result<Self, StoreError> {
        let cache_size = usize::try_from(size_hint).unwrap_or(usize::MAX);
        let mut builder = Database::builder();
        builder.set_cache_size(cache_size);
        let db = if read_only {
            builder.open(path)?
        } else {
            builder.create(path)?
        };

        if !read_only {
            // Make sure the default table exists so readers never see it missing.
            let txn = db.begin_write()?;
            txn.open_table(DEFAULT_TABLE)?;
            txn.commit()?;
        }

        info!(path = %path.display(), size_hint, read_only, "opened store");
        Ok(Self {
            db,
            path: path.to_path_buf(),
            read_only,
        })
    }
}

impl Store for RedbStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        Ok(Box::new(RedbReadTxn {
            txn: self.db.begin_read()?,
            path: &self.path,
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(Box::new(RedbWriteTxn {
            txn: self.db.begin_write()?,
            path: &self.path,
        }))
    }
}

struct RedbReadTxn<'a> {
    txn: ReadTransaction,
    path: &'a Path,
}

impl RedbReadTxn<'_> {
    /// `None` when the default table was never created.
    fn table(&self) -> Result<Option<ReadOnlyTable<&'static [u8], &'static [u8]>>, StoreError> {
        match self.txn.open_table(DEFAULT_TABLE) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ReadTxn for RedbReadTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.table()? {
            Some(table) => get_from(&table, key),
            None => Ok(None),
        }
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        match self.table()? {
            Some(table) => seek_in(&table, from),
            None => Ok(None),
        }
    }

    // A read-only table hands out ranges that outlive it.
    fn range_from<'t>(&'t self, from: Bound<&[u8]>) -> Result<EntryIter<'t>, StoreError> {
        let Some(table) = self.table()? else {
            return Ok(Box::new(std::iter::empty()));
        };
        let range = table.range::<&[u8]>((from, Bound::Unbounded))?;
        Ok(Box::new(range.map(|item| -> Result<Entry, StoreError> {
            let (key, value) = item?;
            Ok(Entry::new(key.value(), value.value()))
        })))
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        let file_bytes = std::fs::metadata(self.path)?.len();
        match self.table()? {
            Some(table) => stat_of(&table, file_bytes),
            None => Ok(StoreStat {
                file_bytes: Some(file_bytes),
                ..StoreStat::default()
            }),
        }
    }
}

// A write transaction reopens the table per operation: the table handle
// borrows the transaction and cannot be stored next to it.
struct RedbWriteTxn<'a> {
    txn: WriteTransaction,
    path: &'a Path,
}

impl ReadTxn for RedbWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let table = self.txn.open_table(DEFAULT_TABLE)?;
        get_from(&table, key)
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        let table = self.txn.open_table(DEFAULT_TABLE)?;
        seek_in(&table, from)
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        let file_bytes = std::fs::metadata(self.path)?.len();
        let table = self.txn.open_table(DEFAULT_TABLE)?;
        stat_of(&table, file_bytes)
    }
}

impl WriteTxn for RedbWriteTxn<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut table = self.txn.open_table(DEFAULT_TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        let mut table = self.txn.open_table(DEFAULT_TABLE)?;
        let removed = table.remove(key)?;
        Ok(removed.is_some())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit()?;
        Ok(())
    }

    fn abort(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.abort()?;
        Ok(())
    }
}

fn get_from<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
}

fn seek_in<T>(table: &T, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut range = table.range::<&[u8]>((from, Bound::Unbounded))?;
    match range.next() {
        Some(item) => {
            let (key, value) = item?;
            Ok(Some(Entry::new(key.value(), value.value())))
        }
        None => Ok(None),
    }
}

fn stat_of<T>(table: &T, file_bytes: u64) -> Result<StoreStat, StoreError>
where
    T: ReadableTableMetadata,
{
    let stats = table.stats()?;
    Ok(StoreStat {
        entries: table.len()?,
        tree_height: Some(stats.tree_height()),
        stored_bytes: Some(stats.stored_bytes()),
        file_bytes: Some(file_bytes),
    })
}

use super::{Entry, EntryIter, ReadTxn, Store, StoreError, StoreStat, WriteTxn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile store keeping everything in an ordered map.
///
/// Readers share the committed map and see the state at the time they began.
/// A writer copies the map on its first change and its copy replaces the
/// shared map on commit.
#[derive(Debug, Default)]
pub struct MemStore {
    data: RefCell<Rc<Map>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let data: Map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RefCell::new(Rc::new(data)),
        }
    }

    fn snapshot(&self) -> Rc<Map> {
        Rc::clone(&self.data.borrow())
    }
}

impl Store for MemStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        Ok(Box::new(MemReadTxn {
            snapshot: self.snapshot(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        Ok(Box::new(MemWriteTxn {
            store: self,
            staged: self.snapshot(),
        }))
    }
}

struct MemReadTxn {
    snapshot: Rc<Map>,
}

impl ReadTxn for MemReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.snapshot.get(key).cloned())
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        Ok(seek_in(&self.snapshot, from))
    }

    fn range_from<'t>(&'t self, from: Bound<&[u8]>) -> Result<EntryIter<'t>, StoreError> {
        Ok(range_in(&self.snapshot, from))
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        Ok(stat_of(&self.snapshot))
    }
}

struct MemWriteTxn<'a> {
    store: &'a MemStore,
    staged: Rc<Map>,
}

impl ReadTxn for MemWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.staged.get(key).cloned())
    }

    fn seek(&self, from: Bound<&[u8]>) -> Result<Option<Entry>, StoreError> {
        Ok(seek_in(&self.staged, from))
    }

    fn range_from<'t>(&'t self, from: Bound<&[u8]>) -> Result<EntryIter<'t>, StoreError> {
        Ok(range_in(&self.staged, from))
    }

    fn stat(&self) -> Result<StoreStat, StoreError> {
        Ok(stat_of(&self.staged))
    }
}

impl WriteTxn for MemWriteTxn<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Rc::make_mut(&mut self.staged).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        if !self.staged.contains_key(key) {
            return Ok(false);
        }
        Ok(Rc::make_mut(&mut self.staged).remove(key).is_some())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        *self.store.data.borrow_mut() = self.staged;
        Ok(())
    }

    fn abort(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

fn seek_in(map: &Map, from: Bound<&[u8]>) -> Option<Entry> {
    map.range::<[u8], _>((from, Bound::Unbounded))
        .next()
        .map(|(k, v)| Entry::new(k.clone(), v.clone()))
}

fn range_in<'t>(map: &'t Map, from: Bound<&[u8]>) -> EntryIter<'t> {
    Box::new(
        map.range::<[u8], _>((from, Bound::Unbounded))
            .map(|(k, v)| Ok::<_, StoreError>(Entry::new(k.clone(), v.clone()))),
    )
}

fn stat_of(map: &Map) -> StoreStat {
    StoreStat {
        entries: map.len() as u64,
        ..StoreStat::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let store = MemStore::with_entries([("k", "old")]);
        let reader = store.begin_read().unwrap();

        let mut writer = store.begin_write().unwrap();
        writer.put(b"k", b"new").unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.get(b"k").unwrap(), Some(b"old".to_vec()));
        let fresh = store.begin_read().unwrap();
        assert_eq!(fresh.get(b"k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_abort_discards_staged_changes() {
        let store = MemStore::with_entries([("k", "v")]);

        let mut writer = store.begin_write().unwrap();
        assert!(writer.delete(b"k").unwrap());
        assert_eq!(writer.get(b"k").unwrap(), None);
        writer.abort().unwrap();

        let reader = store.begin_read().unwrap();
        assert_eq!(reader.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_seek_positions() {
        let store = MemStore::with_entries([("a1", "x"), ("a2", "y"), ("b1", "z")]);
        let txn = store.begin_read().unwrap();

        assert_eq!(txn.seek(Bound::Unbounded).unwrap().unwrap().key, b"a1");
        assert_eq!(
            txn.seek(Bound::Included(&b"a"[..])).unwrap().unwrap().key,
            b"a1"
        );
        assert_eq!(
            txn.seek(Bound::Excluded(&b"a2"[..])).unwrap().unwrap().key,
            b"b1"
        );
        assert!(txn.seek(Bound::Included(&b"c"[..])).unwrap().is_none());
        assert_eq!(txn.stat().unwrap().entries, 3);
    }

    #[test]
    fn test_range_from_walks_in_order() {
        let store = MemStore::with_entries([("a1", "x"), ("a2", "y"), ("b1", "z")]);
        let txn = store.begin_read().unwrap();

        let keys: Vec<Vec<u8>> = txn
            .range_from(Bound::Excluded(&b"a1"[..]))
            .unwrap()
            .map(|entry| entry.unwrap().key)
            .collect();
        assert_eq!(keys, vec![b"a2".to_vec(), b"b1".to_vec()]);
    }

    #[test]
    fn test_readers_share_the_committed_map() {
        let store = MemStore::with_entries([("k", "v")]);
        let before = store.snapshot();
        let _reader = store.begin_read().unwrap();
        assert!(Rc::ptr_eq(&before, &store.snapshot()));

        let mut writer = store.begin_write().unwrap();
        writer.put(b"k", b"w").unwrap();
        writer.commit().unwrap();
        assert!(!Rc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(before.get(&b"k"[..]), Some(&b"v".to_vec()));
    }
}

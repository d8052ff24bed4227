//! The key-value store contract the bitmap operations write through.
//!
//! A store only has to offer point reads and atomic batched writes. Every
//! mutation is one [`WriteBatch`] holding a log-data marker (consumed by
//! replication) followed by the key puts. [`MemoryStorage`] is a thread-safe
//! in-memory implementation of the contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::codec::RedisType;

/// Errors reported by a [`Storage`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store no longer accepts reads or writes
    #[error("Store is closed")]
    Closed,

    /// The store failed to persist or read data
    #[error("I/O error: {0}")]
    Io(String),
}

/// Column family a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// Default column family.
    Default,
    /// Metadata column family, home of string values.
    Metadata,
}

/// Options applied to a batched write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Wait for the write to reach durable storage before acknowledging.
    pub sync: bool,
}

/// Replication marker describing the mutation carried by a batch.
///
/// Encoded as the decimal type id followed by space separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogData {
    kind: RedisType,
    args: Vec<String>,
}

impl LogData {
    /// Marker for a mutation of a value of type `kind`.
    pub fn new(kind: RedisType) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    /// Marker with extra arguments.
    pub fn with_args<I, A>(kind: RedisType, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Type of the mutated value.
    pub fn kind(&self) -> RedisType {
        self.kind
    }

    /// Serializes the marker.
    ///
    /// # Examples
    /// ```
    /// use bitmap_string::{LogData, RedisType};
    ///
    /// assert_eq!(LogData::new(RedisType::String).encode(), b"1".to_vec());
    /// assert_eq!(
    ///     LogData::with_args(RedisType::List, ["lpush", "3"]).encode(),
    ///     b"3 lpush 3".to_vec()
    /// );
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut out = (self.kind as u8).to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out.into_bytes()
    }
}

/// One entry of a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    /// Log-only blob, not stored under any key.
    LogData(Vec<u8>),
    /// Key to value assignment.
    Put {
        /// Target column family.
        cf: ColumnFamily,
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
}

/// Ordered set of entries applied atomically by [`Storage::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    entries: Vec<BatchEntry>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a replication marker.
    pub fn put_log_data(&mut self, log_data: &LogData) {
        self.entries.push(BatchEntry::LogData(log_data.encode()));
    }

    /// Appends a put of `key` to `value` in `cf`.
    pub fn put(&mut self, cf: ColumnFamily, key: &[u8], value: &[u8]) {
        self.entries.push(BatchEntry::Put {
            cf,
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the batch holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point reads plus atomic batched writes.
pub trait Storage {
    /// Reads the value stored under `key` in `cf`.
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Applies all entries of `batch` atomically.
    ///
    /// Returns once the store acknowledged the batch. On error nothing of the
    /// batch is visible.
    fn write(&self, options: &WriteOptions, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(cf, key)
    }

    fn write(&self, options: &WriteOptions, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).write(options, batch)
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(cf, key)
    }

    fn write(&self, options: &WriteOptions, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).write(options, batch)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: HashMap<(ColumnFamily, Vec<u8>), Vec<u8>>,
    log: Vec<Vec<u8>>,
    sequence: u64,
    closed: bool,
    fail_next_write: Option<String>,
}

/// In-memory [`Storage`].
///
/// Batches are applied under a single write lock, so readers never observe
/// half of a batch. Log-data entries are kept in order for inspection.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` outside of any batch.
    pub fn insert(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) {
        self.inner
            .write()
            .data
            .insert((cf, key.to_vec()), value.to_vec());
    }

    /// Rejects every subsequent read and write with [`StoreError::Closed`].
    pub fn close(&self) {
        self.inner.write().closed = true;
    }

    /// Makes the next write fail with [`StoreError::Io`] carrying `message`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.inner.write().fail_next_write = Some(message.into());
    }

    /// Number of batches applied so far.
    pub fn sequence(&self) -> u64 {
        self.inner.read().sequence
    }

    /// Log-data entries of all applied batches, oldest first.
    pub fn log_data(&self) -> Vec<Vec<u8>> {
        self.inner.read().log.clone()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner.data.get(&(cf, key.to_vec())).cloned())
    }

    fn write(&self, options: &WriteOptions, batch: WriteBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        if let Some(message) = inner.fail_next_write.take() {
            return Err(StoreError::Io(message));
        }
        for entry in batch.entries {
            match entry {
                BatchEntry::LogData(blob) => inner.log.push(blob),
                BatchEntry::Put { cf, key, value } => {
                    inner.data.insert((cf, key), value);
                }
            }
        }
        inner.sequence += 1;
        tracing::trace!(
            sequence = inner.sequence,
            sync = options.sync,
            "applied write batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_applies_all_entries() {
        let store = MemoryStorage::new();
        let mut batch = WriteBatch::new();
        batch.put_log_data(&LogData::new(RedisType::String));
        batch.put(ColumnFamily::Metadata, b"a", b"1");
        batch.put(ColumnFamily::Default, b"a", b"2");
        assert_eq!(batch.len(), 3);

        store.write(&WriteOptions::default(), batch).unwrap();
        assert_eq!(store.sequence(), 1);
        assert_eq!(store.log_data(), vec![b"1".to_vec()]);
        assert_eq!(
            store.get(ColumnFamily::Metadata, b"a").unwrap(),
            Some(b"1".to_vec())
        );
        assert_eq!(
            store.get(ColumnFamily::Default, b"a").unwrap(),
            Some(b"2".to_vec())
        );
        assert_eq!(store.get(ColumnFamily::Default, b"b").unwrap(), None);
    }

    #[test]
    fn test_failed_write_applies_nothing() {
        let store = MemoryStorage::new();
        store.insert(ColumnFamily::Metadata, b"k", b"old");
        store.fail_next_write("disk full");

        let mut batch = WriteBatch::new();
        batch.put_log_data(&LogData::new(RedisType::String));
        batch.put(ColumnFamily::Metadata, b"k", b"new");
        assert_eq!(
            store.write(&WriteOptions { sync: true }, batch.clone()),
            Err(StoreError::Io("disk full".into()))
        );
        assert_eq!(
            store.get(ColumnFamily::Metadata, b"k").unwrap(),
            Some(b"old".to_vec())
        );
        assert!(store.log_data().is_empty());

        // Only the next write fails.
        store.write(&WriteOptions::default(), batch).unwrap();
        assert_eq!(
            store.get(ColumnFamily::Metadata, b"k").unwrap(),
            Some(b"new".to_vec())
        );
    }

    #[test]
    fn test_closed_store() {
        let store = MemoryStorage::new();
        store.close();
        assert_eq!(
            store.get(ColumnFamily::Default, b"k"),
            Err(StoreError::Closed)
        );
        assert_eq!(
            store.write(&WriteOptions::default(), WriteBatch::new()),
            Err(StoreError::Closed)
        );
    }

    #[test]
    fn test_shared_through_arc() {
        let store = Arc::new(MemoryStorage::new());
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut batch = WriteBatch::new();
                    batch.put(ColumnFamily::Metadata, &[i], &[i]);
                    store.write(&WriteOptions::default(), batch).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.sequence(), 4);
        assert_eq!(
            Storage::get(&store, ColumnFamily::Metadata, &[3]).unwrap(),
            Some(vec![3])
        );
    }
}

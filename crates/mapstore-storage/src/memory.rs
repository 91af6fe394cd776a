//! In-memory transactional store.
//!
//! Readers pin an immutable snapshot; the single writer mutates a private copy
//! that replaces the published snapshot on commit.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::kv::{Bucket, Cursor, KvStore, Tx};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;
type Snapshot = BTreeMap<Vec<u8>, Entries>;

/// In-memory store with snapshot reads and serialized writes.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    published: Arc<RwLock<Arc<Snapshot>>>,
    writer: Arc<Mutex<()>>,
    closed: Arc<AtomicBool>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.read())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn create_bucket(&self, name: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let _guard = self.writer.lock().await;
        if self.current().contains_key(name) {
            return Ok(());
        }
        let mut next = (*self.current()).clone();
        next.insert(name.to_vec(), Entries::new());
        *self.published.write() = Arc::new(next);
        debug!(bucket = %String::from_utf8_lossy(name), "bucket created");
        Ok(())
    }

    async fn begin(&self, writable: bool) -> Result<Box<dyn Tx>> {
        self.ensure_open()?;
        if !writable {
            return Ok(Box::new(MemoryTx::Read {
                snapshot: self.current(),
            }));
        }

        let guard = Arc::clone(&self.writer).lock_owned().await;
        // Closed while waiting for the writer lock.
        self.ensure_open()?;
        let working = (*self.current()).clone();
        Ok(Box::new(MemoryTx::Write(WriteTx {
            published: Arc::clone(&self.published),
            working,
            _guard: guard,
        })))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        debug!("memory store closed");
    }
}

struct WriteTx {
    published: Arc<RwLock<Arc<Snapshot>>>,
    working: Snapshot,
    _guard: OwnedMutexGuard<()>,
}

enum MemoryTx {
    Read { snapshot: Arc<Snapshot> },
    Write(WriteTx),
}

impl Tx for MemoryTx {
    fn writable(&self) -> bool {
        matches!(self, MemoryTx::Write(_))
    }

    fn bucket(&mut self, name: &[u8]) -> Result<Box<dyn Bucket + '_>> {
        let bucket: MemoryBucket<'_> = match self {
            MemoryTx::Read { snapshot } => snapshot
                .get(name)
                .map(MemoryBucket::Read)
                .ok_or_else(|| StorageError::bucket_not_found(name))?,
            MemoryTx::Write(write) => write
                .working
                .get_mut(name)
                .map(MemoryBucket::Write)
                .ok_or_else(|| StorageError::bucket_not_found(name))?,
        };
        Ok(Box::new(NamedBucket {
            name: name.to_vec(),
            inner: bucket,
        }))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        match *self {
            MemoryTx::Read { .. } => Err(StorageError::ReadOnlyTransaction),
            MemoryTx::Write(write) => {
                *write.published.write() = Arc::new(write.working);
                Ok(())
            }
        }
    }

    fn rollback(self: Box<Self>) {}
}

enum MemoryBucket<'a> {
    Read(&'a Entries),
    Write(&'a mut Entries),
}

struct NamedBucket<'a> {
    name: Vec<u8>,
    inner: MemoryBucket<'a>,
}

impl NamedBucket<'_> {
    fn entries(&self) -> &Entries {
        match &self.inner {
            MemoryBucket::Read(entries) => entries,
            MemoryBucket::Write(entries) => &**entries,
        }
    }

    fn entries_mut(&mut self) -> Result<&mut Entries> {
        match &mut self.inner {
            MemoryBucket::Read(_) => Err(StorageError::ReadOnlyTransaction),
            MemoryBucket::Write(entries) => Ok(&mut **entries),
        }
    }
}

impl Bucket for NamedBucket<'_> {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.entries()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::key_not_found(&self.name, key))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries_mut()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.entries_mut()?.remove(key);
        Ok(())
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(MemoryCursor {
            entries: self.entries(),
            iter: None,
        })
    }
}

struct MemoryCursor<'a> {
    entries: &'a Entries,
    iter: Option<btree_map::Iter<'a, Vec<u8>, Vec<u8>>>,
}

impl Cursor for MemoryCursor<'_> {
    fn first(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.iter = Some(self.entries.iter());
        self.next()
    }

    fn next(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        let entries = self.entries;
        self.iter
            .get_or_insert_with(|| entries.iter())
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::StoreExt;
    use mapstore_core::{CoreError, ErrorCode};
    use std::time::Duration;

    const BUCKET: &[u8] = b"test";

    async fn store() -> MemoryKvStore {
        let store = MemoryKvStore::new();
        store.create_bucket(BUCKET).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_bucket_is_idempotent() {
        let store = store().await;
        store
            .update(|tx| Ok(tx.bucket(BUCKET)?.put(b"k", b"v")?))
            .await
            .unwrap();

        store.create_bucket(BUCKET).await.unwrap();

        let value = store.view(|tx| Ok(tx.bucket(BUCKET)?.get(b"k")?)).await.unwrap();
        assert_eq!(value, b"v");
    }

    #[tokio::test]
    async fn test_unknown_bucket() {
        let store = store().await;
        let err = store
            .view(|tx| Ok(tx.bucket(b"missing")?.get(b"k")?))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = store().await;
        let mut tx = store.begin(false).await.unwrap();
        let err = tx.bucket(BUCKET).unwrap().get(b"nope").unwrap_err();
        assert!(err.is_key_not_found());
    }

    #[tokio::test]
    async fn test_read_transaction_rejects_writes() {
        let store = store().await;
        let mut tx = store.begin(false).await.unwrap();
        assert!(!tx.writable());
        {
            let mut bucket = tx.bucket(BUCKET).unwrap();
            assert_eq!(
                bucket.put(b"k", b"v").unwrap_err(),
                StorageError::ReadOnlyTransaction
            );
        }
        assert_eq!(tx.commit().unwrap_err(), StorageError::ReadOnlyTransaction);
    }

    #[tokio::test]
    async fn test_rollback_on_error_discards_writes() {
        let store = store().await;
        let result: std::result::Result<(), CoreError> = store
            .update(|tx| {
                tx.bucket(BUCKET)?.put(b"k", b"v")?;
                Err(CoreError::invalid("abort"))
            })
            .await;
        assert!(result.is_err());

        let mut tx = store.begin(false).await.unwrap();
        assert!(tx.bucket(BUCKET).unwrap().get(b"k").is_err());
    }

    #[tokio::test]
    async fn test_dropped_write_transaction_releases_writer() {
        let store = store().await;
        {
            let mut tx = store.begin(true).await.unwrap();
            tx.bucket(BUCKET).unwrap().put(b"k", b"v").unwrap();
        }

        let next = tokio::time::timeout(Duration::from_secs(1), store.begin(true)).await;
        assert!(next.is_ok(), "writer lock must be released on drop");

        let mut tx = store.begin(false).await.unwrap();
        assert!(tx.bucket(BUCKET).unwrap().get(b"k").is_err());
    }

    #[tokio::test]
    async fn test_reader_sees_stable_snapshot() {
        let store = store().await;
        store
            .update(|tx| Ok(tx.bucket(BUCKET)?.put(b"a", b"1")?))
            .await
            .unwrap();

        let mut reader = store.begin(false).await.unwrap();

        store
            .update(|tx| {
                let mut bucket = tx.bucket(BUCKET)?;
                bucket.put(b"a", b"2")?;
                bucket.put(b"b", b"2")?;
                Ok(())
            })
            .await
            .unwrap();

        let bucket = reader.bucket(BUCKET).unwrap();
        assert_eq!(bucket.get(b"a").unwrap(), b"1");
        assert!(bucket.get(b"b").is_err());
    }

    #[tokio::test]
    async fn test_writers_are_serialized() {
        let store = store().await;
        let first = store.begin(true).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), store.begin(true)).await;
        assert!(blocked.is_err(), "second writer must wait");

        first.rollback();
        assert!(store.begin(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_cursor_walks_in_key_order() {
        let store = store().await;
        store
            .update(|tx| {
                let mut bucket = tx.bucket(BUCKET)?;
                for key in [b"c", b"a", b"b"] {
                    bucket.put(key, key)?;
                }
                Ok(())
            })
            .await
            .unwrap();

        let keys = store
            .view(|tx| {
                let bucket = tx.bucket(BUCKET)?;
                let mut cursor = bucket.cursor();
                let mut keys = Vec::new();
                let mut entry = cursor.first();
                while let Some((k, _)) = entry {
                    keys.push(k);
                    entry = cursor.next();
                }
                Ok(keys)
            })
            .await
            .unwrap();

        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[tokio::test]
    async fn test_closed_store_refuses_transactions() {
        let store = store().await;
        store.close();
        assert_eq!(store.begin(false).await.err(), Some(StorageError::Closed));
        assert_eq!(store.begin(true).await.err(), Some(StorageError::Closed));
    }
}

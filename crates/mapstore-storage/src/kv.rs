//! Transactional key-value store abstraction.
//!
//! A store hands out read-only or read-write transactions. Inside a
//! transaction, data lives in named buckets of byte keys; every change made
//! through one transaction becomes visible atomically on commit.

use async_trait::async_trait;
use tracing::debug;

use mapstore_core::metrics::STORE_TRANSACTIONS;
use mapstore_core::CoreResult;

use crate::error::Result;

/// Entry point to a transactional key-value engine.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Creates a bucket if it does not exist yet.
    async fn create_bucket(&self, name: &[u8]) -> Result<()>;

    /// Opens a transaction. Read-write transactions are serialized: this waits
    /// until no other writer is open.
    async fn begin(&self, writable: bool) -> Result<Box<dyn Tx>>;

    /// Refuses new transactions from now on.
    fn close(&self) {}
}

/// An open transaction. Dropping it without commit rolls it back.
pub trait Tx: Send {
    fn writable(&self) -> bool;

    /// Borrows a bucket for the rest of the caller's scope.
    fn bucket(&mut self, name: &[u8]) -> Result<Box<dyn Bucket + '_>>;

    /// Publishes every change made through this transaction.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every change made through this transaction.
    fn rollback(self: Box<Self>);
}

/// Byte-keyed map inside a transaction.
pub trait Bucket {
    /// Fails with `KeyNotFound` when the key is absent.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Forward cursor in ascending key order.
    fn cursor(&self) -> Box<dyn Cursor + '_>;
}

/// Forward iteration over a bucket.
pub trait Cursor {
    /// Rewinds to the smallest key and returns its entry.
    fn first(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;

    /// Advances and returns the next entry; `None` ends the scan.
    fn next(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
}

fn record(kind: &str, outcome: &str) {
    STORE_TRANSACTIONS.with_label_values(&[kind, outcome]).inc();
}

/// Closure-scoped transactions on top of any [`KvStore`].
#[async_trait]
pub trait StoreExt: KvStore {
    /// Runs `f` inside a read-only transaction.
    async fn view<T, F>(&self, f: F) -> CoreResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn Tx) -> CoreResult<T> + Send;

    /// Runs `f` inside a read-write transaction, committing on `Ok` and
    /// rolling back on `Err`.
    async fn update<T, F>(&self, f: F) -> CoreResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn Tx) -> CoreResult<T> + Send;
}

#[async_trait]
impl<S> StoreExt for S
where
    S: KvStore + ?Sized,
{
    async fn view<T, F>(&self, f: F) -> CoreResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn Tx) -> CoreResult<T> + Send,
    {
        let mut tx = self.begin(false).await.map_err(|err| {
            record("view", "error");
            err
        })?;
        let result = f(tx.as_mut());
        tx.rollback();
        record("view", if result.is_ok() { "ok" } else { "error" });
        result
    }

    async fn update<T, F>(&self, f: F) -> CoreResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn Tx) -> CoreResult<T> + Send,
    {
        let mut tx = self.begin(true).await.map_err(|err| {
            record("update", "error");
            err
        })?;
        match f(tx.as_mut()) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    record("update", "error");
                    err
                })?;
                record("update", "commit");
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                record("update", "rollback");
                debug!(error = %err, "write transaction rolled back");
                Err(err)
            }
        }
    }
}

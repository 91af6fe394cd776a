//! Transactional key-value storage for mapstore records.

pub mod error;
pub mod kv;
pub mod memory;

pub use error::{Result, StorageError};
pub use kv::{Bucket, Cursor, KvStore, StoreExt, Tx};
pub use memory::MemoryKvStore;

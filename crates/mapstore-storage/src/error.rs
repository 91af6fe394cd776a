use mapstore_core::CoreError;
use thiserror::Error;

/// Failures raised by a key-value store or one of its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),

    #[error("key `{key}` not found in bucket `{bucket}`")]
    KeyNotFound { bucket: String, key: String },

    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    #[error("store is closed")]
    Closed,
}

impl StorageError {
    pub(crate) fn key_not_found(bucket: &[u8], key: &[u8]) -> Self {
        Self::KeyNotFound {
            bucket: String::from_utf8_lossy(bucket).into_owned(),
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }

    pub(crate) fn bucket_not_found(bucket: &[u8]) -> Self {
        Self::BucketNotFound(String::from_utf8_lossy(bucket).into_owned())
    }

    /// Returns `true` for a missing key.
    #[must_use]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::KeyNotFound { key, .. } => CoreError::not_found("key", key),
            other => CoreError::internal_with("store failure", other),
        }
    }
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

//! Generic CRUD over one record kind stored in a transactional bucket.

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use mapstore_core::{
    CoreError, CoreResult, CrudService, FindOptions, IndexEntry, Record, RecordId,
    RequestContext, ID_ENCODED_LEN,
};
use mapstore_storage::{KvStore, StoreExt, Tx};

use crate::generator::IdGenerator;

type Key = [u8; ID_ENCODED_LEN];

/// Stores records of kind `R` as JSON under their encoded ID.
///
/// Uniqueness is a read-before-write: the ID is looked up before a write
/// transaction is opened, and looked up again inside it. Write transactions
/// are serialized by the store, so two creators of one ID cannot both win.
pub struct KvCrudService<R> {
    store: Arc<dyn KvStore>,
    ids: Arc<dyn IdGenerator>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for KvCrudService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ids: Arc::clone(&self.ids),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for KvCrudService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvCrudService")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl<R: Record> KvCrudService<R> {
    /// Creates the record bucket and its index buckets if missing.
    pub async fn new(store: Arc<dyn KvStore>, ids: Arc<dyn IdGenerator>) -> CoreResult<Self> {
        store.create_bucket(R::BUCKET).await?;
        for bucket in R::INDEX_BUCKETS {
            store.create_bucket(bucket).await?;
        }
        Ok(Self {
            store,
            ids,
            _record: PhantomData,
        })
    }

    /// The store backing this service.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    fn encode_id(id: R::Id) -> CoreResult<Key> {
        Ok(id.encode()?)
    }

    fn decode(bytes: &[u8]) -> CoreResult<R> {
        serde_json::from_slice(bytes).map_err(|err| {
            CoreError::internal_with(format!("failed to decode {}", R::ENTITY), err)
        })
    }

    fn read(tx: &mut dyn Tx, key: &[u8]) -> CoreResult<Option<R>> {
        let bucket = tx.bucket(R::BUCKET)?;
        match bucket.get(key) {
            Ok(bytes) => Self::decode(&bytes).map(Some),
            Err(err) if err.is_key_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Looks up a record through a secondary index.
    pub(crate) fn read_indexed(
        tx: &mut dyn Tx,
        index: &'static [u8],
        index_key: &[u8],
    ) -> CoreResult<Option<R>> {
        let owner = {
            let bucket = tx.bucket(index)?;
            match bucket.get(index_key) {
                Ok(owner) => owner,
                Err(err) if err.is_key_not_found() => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        };
        Self::read(tx, &owner)
    }

    fn ensure_index_free(tx: &mut dyn Tx, entries: &[IndexEntry], key: &Key) -> CoreResult<()> {
        for entry in entries {
            let bucket = tx.bucket(entry.bucket)?;
            match bucket.get(&entry.key) {
                Ok(owner) if owner != key.as_slice() => {
                    return Err(CoreError::conflict(format!(
                        "{} index entry is already taken",
                        R::ENTITY
                    )));
                }
                Ok(_) => {}
                Err(err) if err.is_key_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn put_index(tx: &mut dyn Tx, entries: &[IndexEntry], key: &Key) -> CoreResult<()> {
        for entry in entries {
            tx.bucket(entry.bucket)?.put(&entry.key, key)?;
        }
        Ok(())
    }

    fn remove_index(tx: &mut dyn Tx, entries: &[IndexEntry], key: &Key) -> CoreResult<()> {
        for entry in entries {
            let mut bucket = tx.bucket(entry.bucket)?;
            match bucket.get(&entry.key) {
                Ok(owner) if owner == key.as_slice() => bucket.delete(&entry.key)?,
                Ok(_) => {}
                Err(err) if err.is_key_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> CrudService<R> for KvCrudService<R> {
    async fn find_by_id(&self, _ctx: &RequestContext, id: R::Id) -> CoreResult<R> {
        let key = Self::encode_id(id)?;
        self.store
            .view(move |tx| {
                Self::read(tx, &key)?.ok_or_else(|| CoreError::not_found(R::ENTITY, id))
            })
            .await
    }

    async fn find_many(
        &self,
        _ctx: &RequestContext,
        filter: &R::Filter,
        opts: FindOptions,
    ) -> CoreResult<(Vec<R>, usize)> {
        let matched = self
            .store
            .view(|tx| {
                let bucket = tx.bucket(R::BUCKET)?;
                let mut cursor = bucket.cursor();
                let mut matched = Vec::new();
                let mut entry = cursor.first();
                while let Some((_, value)) = entry {
                    let record = Self::decode(&value)?;
                    if record.matches(filter) {
                        matched.push(record);
                    }
                    entry = cursor.next();
                }
                Ok(matched)
            })
            .await?;

        let count = matched.len();
        tracing::debug!(entity = R::ENTITY, count, "scanned bucket");
        Ok((opts.apply(matched), count))
    }

    async fn create(&self, ctx: &RequestContext, record: &mut R) -> CoreResult<()> {
        if !record.id().is_valid() {
            record.set_id(self.ids.id().into());
        }
        let id = record.id();
        let key = Self::encode_id(id)?;
        record.validate()?;

        match self.find_by_id(ctx, id).await {
            Ok(_) => return Err(CoreError::already_exists(R::ENTITY, id)),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let value = serde_json::to_vec(&*record)?;
        let entries = record.index_entries();
        self.store
            .update(move |tx| {
                if Self::read(tx, &key)?.is_some() {
                    return Err(CoreError::already_exists(R::ENTITY, id));
                }
                Self::ensure_index_free(tx, &entries, &key)?;
                tx.bucket(R::BUCKET)?.put(&key, &value)?;
                Self::put_index(tx, &entries, &key)
            })
            .await?;

        tracing::info!(entity = R::ENTITY, id = %id, "record created");
        Ok(())
    }

    async fn update(&self, ctx: &RequestContext, record: &R) -> CoreResult<R> {
        let id = record.id();
        let key = Self::encode_id(id)?;
        record.validate()?;
        self.find_by_id(ctx, id).await?;

        let value = serde_json::to_vec(record)?;
        let entries = record.index_entries();
        self.store
            .update(move |tx| {
                let current =
                    Self::read(tx, &key)?.ok_or_else(|| CoreError::not_found(R::ENTITY, id))?;
                Self::remove_index(tx, &current.index_entries(), &key)?;
                Self::ensure_index_free(tx, &entries, &key)?;
                tx.bucket(R::BUCKET)?.put(&key, &value)?;
                Self::put_index(tx, &entries, &key)
            })
            .await?;

        tracing::info!(entity = R::ENTITY, id = %id, "record updated");
        Ok(record.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: R::Id) -> CoreResult<()> {
        let key = Self::encode_id(id)?;
        let existed = self
            .store
            .update(move |tx| {
                let current = Self::read(tx, &key)?;
                if let Some(current) = &current {
                    Self::remove_index(tx, &current.index_entries(), &key)?;
                }
                tx.bucket(R::BUCKET)?.delete(&key)?;
                Ok(current.is_some())
            })
            .await?;

        tracing::info!(entity = R::ENTITY, id = %id, existed, "record deleted");
        Ok(())
    }
}

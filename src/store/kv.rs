//! Key/value backed repo with a transaction overlay

use super::{EntityKind, Ref, Repo};
use crate::config::{BackendKind, StorageConfig};
use crate::error::StorageError;
use crate::graph::{Commit, Node};
use crate::store::{MemoryBackend, SledBackend};
use crate::types::Chunk;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Raw ordered key/value storage
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Keys starting with `prefix`, at or after `start`, at most `limit`
    fn scan(&self, prefix: &[u8], start: &[u8], limit: usize) -> Result<Vec<Vec<u8>>, StorageError>;

    /// Apply all writes atomically
    fn apply(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StorageError>;

    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// [`Repo`] over a [`KvBackend`], encoding entities with bincode.
///
/// Writes made while a transaction is open are buffered; reads see the
/// buffer first. Ending the transaction with `commit = true` hands the whole
/// buffer to the backend as one atomic batch. Outside a transaction every
/// write is applied immediately.
pub struct Store {
    backend: Box<dyn KvBackend>,
    pending: Mutex<Option<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl Store {
    pub fn new(backend: Box<dyn KvBackend>) -> Self {
        Self {
            backend,
            pending: Mutex::new(None),
        }
    }

    /// Store backed by a fresh in-memory map
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Open the backend selected by `config`
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend {
            BackendKind::Memory => Ok(Self::memory()),
            BackendKind::Sled => Ok(Self::new(Box::new(SledBackend::new(&config.path)?))),
        }
    }

    fn key(kind: EntityKind, id: &str) -> Vec<u8> {
        let prefix = kind.prefix();
        let mut key = Vec::with_capacity(prefix.len() + id.len());
        key.extend_from_slice(prefix.as_bytes());
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn read<T: DeserializeOwned>(&self, kind: EntityKind, id: &str) -> Result<Option<T>, StorageError> {
        let key = Self::key(kind, id);
        let buffered = self
            .pending
            .lock()
            .as_ref()
            .and_then(|writes| writes.get(&key).cloned());
        let bytes = match buffered {
            Some(bytes) => Some(bytes),
            None => self.backend.get(&key)?,
        };
        match bytes {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(
        &self,
        kind: EntityKind,
        id: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let key = Self::key(kind, id);
        let bytes = bincode::serialize(value)?;
        {
            let mut pending = self.pending.lock();
            if let Some(writes) = pending.as_mut() {
                writes.insert(key, bytes);
                return Ok(());
            }
        }
        self.backend.apply(vec![(key, bytes)])
    }
}

impl Repo for Store {
    fn get_ref(&self, key: &str) -> Result<Option<Ref>, StorageError> {
        self.read(EntityKind::Ref, key)
    }

    fn put_ref(&self, key: &str, record: &Ref) -> Result<(), StorageError> {
        self.write(EntityKind::Ref, key, record)
    }

    fn get_node(&self, head: &str) -> Result<Option<Node>, StorageError> {
        self.read(EntityKind::Node, head)
    }

    fn put_node(&self, node: &Node) -> Result<(), StorageError> {
        self.write(EntityKind::Node, &node.head, node)
    }

    fn get_content(&self, key: &str) -> Result<Option<Vec<Chunk>>, StorageError> {
        self.read(EntityKind::Content, key)
    }

    fn put_content(&self, key: &str, chunks: &[Chunk]) -> Result<(), StorageError> {
        self.write(EntityKind::Content, key, chunks)
    }

    fn get_commit(&self, hash: &str) -> Result<Option<Commit>, StorageError> {
        self.read(EntityKind::Commit, hash)
    }

    fn put_commit(&self, commit: &Commit) -> Result<(), StorageError> {
        self.write(EntityKind::Commit, &commit.hash, commit)
    }

    fn start_transaction(&self) -> Result<(), StorageError> {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return Err(StorageError::TransactionActive);
        }
        *pending = Some(BTreeMap::new());
        trace!("Transaction started");
        Ok(())
    }

    fn end_transaction(&self, commit: bool) -> Result<(), StorageError> {
        let writes = self
            .pending
            .lock()
            .take()
            .ok_or(StorageError::NoTransaction)?;
        if commit {
            debug!(writes = writes.len(), "Committing transaction");
            self.backend.apply(writes.into_iter().collect())
        } else {
            debug!(discarded = writes.len(), "Rolling back transaction");
            Ok(())
        }
    }

    fn list_keys(
        &self,
        kind: EntityKind,
        from: &str,
        limit: usize,
    ) -> Result<Vec<String>, StorageError> {
        let prefix = kind.prefix().as_bytes();
        let start = Self::key(kind, from);

        let mut keys: Vec<Vec<u8>> = self.backend.scan(prefix, &start, limit)?;
        if let Some(writes) = self.pending.lock().as_ref() {
            keys.extend(
                writes
                    .range(start.clone()..)
                    .map(|(key, _)| key)
                    .take_while(|key| key.starts_with(prefix))
                    .take(limit)
                    .cloned(),
            );
        }
        keys.sort();
        keys.dedup();
        keys.truncate(limit);

        keys.into_iter()
            .map(|key| {
                String::from_utf8(key[prefix.len()..].to_vec())
                    .map_err(|e| StorageError::Encoding(format!("non-UTF8 key: {}", e)))
            })
            .collect()
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.backend.flush()
    }
}

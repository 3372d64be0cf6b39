//! Repo capability
//!
//! The graph engine is written against [`Repo`]: hash-keyed get/put for refs,
//! nodes, content blobs and commits, plus a scoped transaction. [`Store`]
//! implements it over any raw key/value [`KvBackend`] (in-memory or sled).

pub mod kv;
pub mod memory;
pub mod persistence;

pub use kv::{KvBackend, Store};
pub use memory::MemoryBackend;
pub use persistence::SledBackend;

use crate::error::{GraphError, StorageError};
use crate::graph::{Commit, Node};
use crate::types::{Chunk, Hash};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Entity kinds held by a repo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ref,
    Node,
    Content,
    Commit,
}

impl EntityKind {
    /// Key prefix used by key/value backends
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Ref => "ref/",
            EntityKind::Node => "node/",
            EntityKind::Content => "content/",
            EntityKind::Commit => "commit/",
        }
    }
}

/// Ref-table record: the boundaries of the node that currently owns a head
/// or tail hash. Stored under both keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub head: Hash,
    pub tail: Hash,
}

/// Storage boundary consumed by the engine
pub trait Repo {
    fn get_ref(&self, key: &str) -> Result<Option<Ref>, StorageError>;
    fn put_ref(&self, key: &str, record: &Ref) -> Result<(), StorageError>;

    fn get_node(&self, head: &str) -> Result<Option<Node>, StorageError>;
    fn put_node(&self, node: &Node) -> Result<(), StorageError>;

    fn get_content(&self, key: &str) -> Result<Option<Vec<Chunk>>, StorageError>;
    fn put_content(&self, key: &str, chunks: &[Chunk]) -> Result<(), StorageError>;

    fn get_commit(&self, hash: &str) -> Result<Option<Commit>, StorageError>;
    fn put_commit(&self, commit: &Commit) -> Result<(), StorageError>;

    /// Open a transaction; fails if one is already open
    fn start_transaction(&self) -> Result<(), StorageError>;

    /// Close the open transaction, applying its writes when `commit` is true
    fn end_transaction(&self, commit: bool) -> Result<(), StorageError>;

    /// Keys of `kind` at or after `from`, in order, at most `limit` of them
    fn list_keys(
        &self,
        kind: EntityKind,
        from: &str,
        limit: usize,
    ) -> Result<Vec<String>, StorageError>;

    /// Persist pending backend writes
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Run `f` inside a transaction on `repo`: committed on `Ok`, rolled back on
/// `Err`. Transactions do not nest. A failed rollback is logged and the
/// error from `f` is returned.
pub fn with_transaction<R, T, F>(repo: &R, f: F) -> Result<T, GraphError>
where
    R: Repo + ?Sized,
    F: FnOnce() -> Result<T, GraphError>,
{
    repo.start_transaction()?;
    match f() {
        Ok(value) => {
            repo.end_transaction(true)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = repo.end_transaction(false) {
                warn!(error = %rollback, cause = %err, "Rollback failed");
            }
            Err(err)
        }
    }
}

//! Graph engine
//!
//! [`Graph`] binds a [`Repo`] to a [`HashAlgorithm`] and exposes the
//! mutating operations (node splitting, commit application) and the read
//! side (verges, file reads, conflict scans).

pub mod ancestry;
pub mod apply;
pub mod reader;
pub mod split;

pub use ancestry::{Ancestry, AncestryFrontier};
pub use reader::ConflictRegion;
pub use split::SplitPoint;

use crate::config::StrandConfig;
use crate::error::GraphError;
use crate::graph::{Commit, Node};
use crate::hashing::{algorithm_from_name, Blake3, HashAlgorithm};
use crate::store::{Ref, Repo, Store};
use crate::types::{Chunk, Hash};
use crate::verge::Verge;
use std::sync::Arc;

/// The line graph over one repo
pub struct Graph<R: Repo> {
    repo: R,
    hasher: Arc<dyn HashAlgorithm>,
}

impl Graph<Store> {
    /// Open a store-backed graph as described by `config`
    pub fn open(config: &StrandConfig) -> Result<Self, GraphError> {
        config.validate()?;
        let hasher = algorithm_from_name(&config.hashing.algorithm)?;
        let store = Store::open(&config.storage)?;
        Ok(Self::new(store, hasher))
    }
}

impl<R: Repo> Graph<R> {
    pub fn new(repo: R, hasher: Arc<dyn HashAlgorithm>) -> Self {
        Self { repo, hasher }
    }

    /// Graph using the default BLAKE3 algorithm
    pub fn with_default_hasher(repo: R) -> Self {
        Self::new(repo, Arc::new(Blake3))
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn hasher(&self) -> &dyn HashAlgorithm {
        self.hasher.as_ref()
    }

    /// Fetch a node by head hash
    pub fn node(&self, head: &str) -> Result<Node, GraphError> {
        self.repo
            .get_node(head)?
            .ok_or_else(|| GraphError::NodeNotFound(head.to_string()))
    }

    /// Fetch a recorded commit
    pub fn commit(&self, hash: &str) -> Result<Commit, GraphError> {
        self.repo
            .get_commit(hash)?
            .ok_or_else(|| GraphError::CommitNotFound(hash.to_string()))
    }

    /// Whether `hash` names an applied commit
    pub fn is_applied(&self, hash: &str) -> Result<bool, GraphError> {
        Ok(self.repo.get_commit(hash)?.is_some())
    }

    /// Stored chunk sequence of a text node
    pub fn content(&self, node: &Node) -> Result<Vec<Chunk>, GraphError> {
        let key = node
            .content
            .as_deref()
            .ok_or(GraphError::UnsupportedForm(node.form))?;
        self.repo
            .get_content(key)?
            .ok_or_else(|| GraphError::ContentNotFound(key.to_string()))
    }

    /// The node whose tail is currently `tail`
    pub fn node_by_tail(&self, tail: &str) -> Result<Node, GraphError> {
        let record = self
            .repo
            .get_ref(tail)?
            .ok_or_else(|| GraphError::RefNotFound(tail.to_string()))?;
        let node = self.node(&record.head)?;
        if node.tail != tail {
            return Err(GraphError::Malformed(format!(
                "ref for {} points at node {} ending in {}",
                tail, node.head, node.tail
            )));
        }
        Ok(node)
    }

    /// A verge positioned at the start of `path`
    pub fn verge(&self, path: &str) -> Result<Verge<'_, R>, GraphError> {
        Verge::new(&self.repo, path)
    }

    /// Store a node and point the ref table at its boundaries
    pub(crate) fn record_node(&self, node: &Node) -> Result<(), GraphError> {
        node.check_shape()?;
        self.repo.put_node(node)?;
        link_span(&self.repo, &node.head, &node.tail)
    }
}

/// Record `head`/`tail` as one node's boundaries, keyed both ways
pub(crate) fn link_span<R: Repo + ?Sized>(repo: &R, head: &Hash, tail: &Hash) -> Result<(), GraphError> {
    let record = Ref {
        head: head.clone(),
        tail: tail.clone(),
    };
    repo.put_ref(head, &record)?;
    if tail != head {
        repo.put_ref(tail, &record)?;
    }
    Ok(())
}

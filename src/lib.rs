//! Strand: a content-addressed line-graph engine for version control
//!
//! File history is kept as a persistent graph of immutable line runs threaded
//! together by commits. Commits split and re-link runs without rewriting
//! history; frontiers select which commits a reader observes, and verges walk
//! the graph to find where concurrent edits conflict.

pub mod chunk;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hashing;
pub mod logging;
pub mod store;
pub mod types;
pub mod verge;

pub use config::{ConfigLoader, StrandConfig};
pub use engine::{Ancestry, AncestryFrontier, ConflictRegion, Graph, SplitPoint};
pub use error::{ConfigError, GraphError, StorageError};
pub use graph::{
    Commit, CommitSet, Edge, EdgeRef, Everything, Form, Frontier, NewContent, Node, NodeRef,
    Target,
};
pub use hashing::{Blake3, HashAlgorithm, Sha256};
pub use store::{Repo, Store};
pub use types::{Chunk, Hash, END_OF_FILE};
pub use verge::Verge;

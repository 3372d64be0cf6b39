//! Graph data model
//!
//! File history is a graph of immutable line runs ([`Node`]) linked by
//! commit-attributed [`Edge`]s. Nodes are keyed by their permanent head hash;
//! all pointer chasing is a lookup through the [`Repo`](crate::store::Repo).

pub mod commit;
pub mod frontier;
pub mod node;

pub use commit::{Commit, EdgeRef, NewContent, NodeRef, Target};
pub use frontier::{CommitSet, Everything, Frontier};
pub use node::{Edge, Form, Node};

//! Verge: a movable cut across one file's node graph
//!
//! The cut is the set of edges currently crossed by the verge, keyed by
//! commit. `forward` maps each cut commit to the node on the far side of its
//! edge and `backward` to the node on the near side. A node may only be
//! crossed once every edge leading into it (or, walking backward, out of it)
//! is on the cut, which keeps the walk topological through diverged and
//! rejoined history.
//!
//! Alongside the cut the verge keeps a reverse-dependency map over the cut
//! commits. Commits on the cut that no other visible cut commit depends on
//! are the dominators; more than one dominator means the file is ambiguous
//! at this cut.

use crate::engine::Ancestry;
use crate::error::GraphError;
use crate::graph::{Frontier, Node};
use crate::store::Repo;
use crate::types::{short, source_identity, Hash, END_OF_FILE};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

pub struct Verge<'r, R: Repo + ?Sized> {
    repo: &'r R,
    position: Hash,
    forward: BTreeMap<Hash, Hash>,
    backward: BTreeMap<Hash, Hash>,
    /// ancestor -> cut commits that depend on it
    rdeps: HashMap<Hash, BTreeSet<Hash>>,
    ancestry: Ancestry<'r, R>,
}

impl<'r, R: Repo + ?Sized> Verge<'r, R> {
    /// Position a verge just past the start sentinel of `path`
    pub fn new(repo: &'r R, path: &str) -> Result<Self, GraphError> {
        let identity = source_identity(path);
        let start = repo
            .get_node(&identity)?
            .ok_or_else(|| GraphError::NodeNotFound(identity.clone()))?;

        let mut verge = Self {
            repo,
            position: start.head.clone(),
            forward: BTreeMap::new(),
            backward: BTreeMap::new(),
            rdeps: HashMap::new(),
            ancestry: Ancestry::new(repo),
        };
        for edge in &start.outs {
            verge.cut(&edge.commit, &edge.target, &start.head)?;
        }
        Ok(verge)
    }

    /// Head of the node most recently moved across, in either direction.
    ///
    /// After [`Verge::advance`] the cut lies just past this node; after
    /// [`Verge::retract`] it lies just before it.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Cut commits and the node each one leads to
    pub fn forward(&self) -> &BTreeMap<Hash, Hash> {
        &self.forward
    }

    /// Cut commits and the node each one leads from
    pub fn backward(&self) -> &BTreeMap<Hash, Hash> {
        &self.backward
    }

    /// Move the cut forward across `node`
    pub fn advance(&mut self, node: &Node) -> Result<(), GraphError> {
        for edge in &node.ins {
            if self.forward.get(&edge.commit) != Some(&node.head) {
                return Err(GraphError::InvalidTraversal {
                    node: node.head.clone(),
                    reason: format!("incoming edge of {} is not on the cut", edge.commit),
                });
            }
        }
        for edge in &node.ins {
            self.uncut(&edge.commit)?;
        }
        for edge in &node.outs {
            self.cut(&edge.commit, &edge.target, &node.head)?;
        }

        trace!(node = %short(&node.head), cut = self.forward.len(), "Advanced verge");
        self.position = node.head.clone();
        Ok(())
    }

    /// Move the cut backward across `node`
    pub fn retract(&mut self, node: &Node) -> Result<(), GraphError> {
        for edge in &node.outs {
            if self.backward.get(&edge.commit) != Some(&node.head) {
                return Err(GraphError::InvalidTraversal {
                    node: node.head.clone(),
                    reason: format!("outgoing edge of {} is not on the cut", edge.commit),
                });
            }
        }
        for edge in &node.outs {
            self.uncut(&edge.commit)?;
        }
        for edge in &node.ins {
            let source = self
                .repo
                .get_ref(&edge.target)?
                .ok_or_else(|| GraphError::RefNotFound(edge.target.clone()))?;
            self.cut(&edge.commit, &node.head, &source.head)?;
        }

        trace!(node = %short(&node.head), cut = self.backward.len(), "Retracted verge");
        self.position = node.head.clone();
        Ok(())
    }

    /// The first node ahead of the cut whose incoming edges are all cut
    pub fn next(&self) -> Result<Option<Node>, GraphError> {
        for head in distinct(self.forward.values()) {
            if head == END_OF_FILE {
                continue;
            }
            let node = self.load(head)?;
            if node
                .ins
                .iter()
                .all(|edge| self.forward.get(&edge.commit) == Some(&node.head))
            {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// The first node behind the cut whose outgoing edges are all cut
    pub fn prev(&self) -> Result<Option<Node>, GraphError> {
        for head in distinct(self.backward.values()) {
            let node = self.load(head)?;
            if node
                .outs
                .iter()
                .all(|edge| self.backward.get(&edge.commit) == Some(&node.head))
            {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Visible cut commits that no other visible cut commit depends on,
    /// in hash order
    pub fn dominators<F: Frontier + ?Sized>(&self, frontier: &F) -> Vec<Hash> {
        let visible: BTreeSet<&Hash> = self
            .forward
            .keys()
            .filter(|commit| frontier.observes(commit))
            .collect();

        visible
            .iter()
            .filter(|commit| {
                self.rdeps
                    .get(commit.as_str())
                    .map_or(true, |dependents| {
                        !dependents.iter().any(|d| visible.contains(d))
                    })
            })
            .map(|commit| (*commit).clone())
            .collect()
    }

    /// Conflicting commits at this cut; empty when the cut is unambiguous
    pub fn conflicts<F: Frontier + ?Sized>(&self, frontier: &F) -> Vec<Hash> {
        let dominators = self.dominators(frontier);
        if dominators.len() > 1 {
            dominators
        } else {
            Vec::new()
        }
    }

    fn load(&self, head: &str) -> Result<Node, GraphError> {
        self.repo
            .get_node(head)?
            .ok_or_else(|| GraphError::NodeNotFound(head.to_string()))
    }

    fn cut(&mut self, commit: &str, ahead: &str, behind: &str) -> Result<(), GraphError> {
        self.forward.insert(commit.to_string(), ahead.to_string());
        self.backward.insert(commit.to_string(), behind.to_string());
        for ancestor in self.ancestry.ancestors(commit)? {
            self.rdeps
                .entry(ancestor.clone())
                .or_default()
                .insert(commit.to_string());
        }
        Ok(())
    }

    fn uncut(&mut self, commit: &str) -> Result<(), GraphError> {
        self.forward.remove(commit);
        self.backward.remove(commit);
        for ancestor in self.ancestry.ancestors(commit)? {
            if let Some(dependents) = self.rdeps.get_mut(ancestor) {
                dependents.remove(commit);
                if dependents.is_empty() {
                    self.rdeps.remove(ancestor);
                }
            }
        }
        Ok(())
    }
}

/// Values in first-seen order, without repeats
fn distinct<'a>(values: impl Iterator<Item = &'a Hash>) -> Vec<&'a Hash> {
    let mut seen = BTreeSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

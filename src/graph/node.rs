//! Nodes and edges of the line graph

use crate::error::GraphError;
use crate::types::Hash;
use serde::{Deserialize, Serialize};

/// Content kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Form {
    /// Plain text lines
    Text,
    /// Start-of-file sentinel
    FileSrc,
    /// End-of-file sentinel
    FileSnk,
}

impl Form {
    /// Domain tag mixed into unit and commit hashes
    pub fn tag(self) -> &'static [u8] {
        match self {
            Form::Text => b"text",
            Form::FileSrc => b"src",
            Form::FileSnk => b"snk",
        }
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, Form::FileSrc | Form::FileSnk)
    }
}

/// A commit-attributed link between two node boundaries.
///
/// On a node's `outs`, `target` is the destination head (or
/// [`END_OF_FILE`](crate::types::END_OF_FILE)); on `ins` it is the source tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub commit: Hash,
    pub target: Hash,
    /// False for continuation edges exposed by a split
    pub primary: bool,
}

impl Edge {
    pub fn primary(commit: &str, target: &str) -> Self {
        Self {
            commit: commit.to_string(),
            target: target.to_string(),
            primary: true,
        }
    }

    pub fn continuation(commit: &str, target: &str) -> Self {
        Self {
            commit: commit.to_string(),
            target: target.to_string(),
            primary: false,
        }
    }
}

/// A run of consecutive units at one logical position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub head: Hash,
    pub tail: Hash,
    pub form: Form,
    /// Content key of the stored chunk sequence; `None` for sentinels
    pub content: Option<Hash>,
    pub count: u64,
    pub ins: Vec<Edge>,
    pub outs: Vec<Edge>,
    /// For each `outs[i]`, the indices of the other out edges whose commits
    /// `outs[i]`'s commit depends on
    pub out_deps: Vec<Vec<usize>>,
}

impl Node {
    /// A one-unit sentinel node whose head and tail are `identity`
    pub fn sentinel(form: Form, identity: &str) -> Self {
        Self {
            head: identity.to_string(),
            tail: identity.to_string(),
            form,
            content: None,
            count: 1,
            ins: Vec::new(),
            outs: Vec::new(),
            out_deps: Vec::new(),
        }
    }

    /// A freshly materialized text node with no edges yet
    pub fn text(head: Hash, tail: Hash, content: Hash, count: u64) -> Self {
        Self {
            head,
            tail,
            form: Form::Text,
            content: Some(content),
            count,
            ins: Vec::new(),
            outs: Vec::new(),
            out_deps: Vec::new(),
        }
    }

    /// The split continuation to the next physical piece of the same run
    pub fn continuation(&self) -> Option<&Edge> {
        self.outs.iter().find(|edge| !edge.primary)
    }

    /// `(commit, predecessor)` that seeded this node's hash chain
    pub fn seed(&self) -> Result<(&str, &str), GraphError> {
        self.ins
            .first()
            .map(|edge| (edge.commit.as_str(), edge.target.as_str()))
            .ok_or_else(|| {
                GraphError::Malformed(format!("node {} has no originating edge", self.head))
            })
    }

    /// Check the count/identity invariants for this node's form
    pub fn check_shape(&self) -> Result<(), GraphError> {
        if self.count == 0 {
            return Err(GraphError::Malformed(format!(
                "node {} has zero units",
                self.head
            )));
        }
        let single = self.head == self.tail;
        let consistent = if self.form.is_sentinel() {
            single && self.count == 1 && self.content.is_none()
        } else {
            single == (self.count == 1) && self.content.is_some()
        };
        if consistent {
            Ok(())
        } else {
            Err(GraphError::Malformed(format!(
                "node {} violates {:?} shape (count {})",
                self.head, self.form, self.count
            )))
        }
    }
}

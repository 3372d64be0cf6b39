//! Commits: immutable, content-addressed structural changes

use crate::error::GraphError;
use crate::graph::Form;
use crate::hashing::{HashAlgorithm, Preimage};
use crate::types::{Chunk, Hash};
use serde::{Deserialize, Serialize};

/// A split point inside an existing node's logical run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Head of the node as seen by the commit's author
    pub node: Hash,
    /// Units from the start of the run (1-based)
    pub depth: u64,
}

/// Content introduced by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContent {
    pub form: Form,
    /// Set for file sentinels
    pub path: Option<String>,
    pub chunks: Vec<Chunk>,
}

impl NewContent {
    pub fn text(chunks: Vec<Chunk>) -> Self {
        Self {
            form: Form::Text,
            path: None,
            chunks,
        }
    }

    pub fn file_src(path: &str) -> Self {
        Self {
            form: Form::FileSrc,
            path: Some(path.to_string()),
            chunks: Vec::new(),
        }
    }

    pub fn file_snk(path: &str) -> Self {
        Self {
            form: Form::FileSnk,
            path: Some(path.to_string()),
            chunks: Vec::new(),
        }
    }
}

/// Destination of an edge reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Index into `node_refs ++ contents`
    Index(usize),
    EndOfFile,
}

/// A structural edit: link `src` to `dst`.
///
/// `src` indexes `node_refs ++ contents`. A node-ref source names the unit
/// after which the link starts; a node-ref destination names the unit before
/// which it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub src: usize,
    pub dst: Target,
}

impl EdgeRef {
    pub fn new(src: usize, dst: usize) -> Self {
        Self {
            src,
            dst: Target::Index(dst),
        }
    }

    pub fn to_end(src: usize) -> Self {
        Self {
            src,
            dst: Target::EndOfFile,
        }
    }
}

/// One atomic change to the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub deps: Vec<Hash>,
    pub node_refs: Vec<NodeRef>,
    pub contents: Vec<NewContent>,
    pub edge_refs: Vec<EdgeRef>,
    pub hash: Hash,
}

/// What an index into `node_refs ++ contents` names
#[derive(Debug, Clone, Copy)]
pub(crate) enum Endpoint<'a> {
    Existing(&'a NodeRef),
    Created(usize, &'a NewContent),
}

impl Commit {
    /// Build a commit and compute its identity
    pub fn new(
        deps: Vec<Hash>,
        node_refs: Vec<NodeRef>,
        contents: Vec<NewContent>,
        edge_refs: Vec<EdgeRef>,
        alg: &dyn HashAlgorithm,
    ) -> Self {
        let mut commit = Self {
            deps,
            node_refs,
            contents,
            edge_refs,
            hash: String::new(),
        };
        commit.hash = commit.compute_hash(alg);
        commit
    }

    /// Structural digest over all fields except `hash`, in order
    pub fn compute_hash(&self, alg: &dyn HashAlgorithm) -> Hash {
        let mut preimage = Preimage::new("commit");

        preimage.number(self.deps.len() as u64);
        for dep in &self.deps {
            preimage.field(dep.as_bytes());
        }

        preimage.number(self.node_refs.len() as u64);
        for node_ref in &self.node_refs {
            preimage.field(node_ref.node.as_bytes()).number(node_ref.depth);
        }

        preimage.number(self.contents.len() as u64);
        for content in &self.contents {
            preimage.field(content.form.tag());
            match &content.path {
                Some(path) => preimage.number(1).field(path.as_bytes()),
                None => preimage.number(0),
            };
            preimage.number(content.chunks.len() as u64);
            for chunk in &content.chunks {
                preimage.field(chunk);
            }
        }

        preimage.number(self.edge_refs.len() as u64);
        for edge in &self.edge_refs {
            preimage.number(edge.src as u64);
            match edge.dst {
                Target::Index(i) => preimage.number(1).number(i as u64),
                Target::EndOfFile => preimage.number(0),
            };
        }

        preimage.finish(alg)
    }

    /// Number of addressable endpoints (`node_refs ++ contents`)
    pub fn endpoint_count(&self) -> usize {
        self.node_refs.len() + self.contents.len()
    }

    pub(crate) fn endpoint(&self, index: usize) -> Result<Endpoint<'_>, GraphError> {
        if let Some(node_ref) = self.node_refs.get(index) {
            return Ok(Endpoint::Existing(node_ref));
        }
        let offset = index - self.node_refs.len();
        self.contents
            .get(offset)
            .map(|content| Endpoint::Created(offset, content))
            .ok_or_else(|| {
                GraphError::Malformed(format!(
                    "edge endpoint {} out of range ({} endpoints)",
                    index,
                    self.endpoint_count()
                ))
            })
    }

    /// Reject structurally invalid commits before anything is mutated
    pub fn validate(&self, alg: &dyn HashAlgorithm) -> Result<(), GraphError> {
        let actual = self.compute_hash(alg);
        if actual != self.hash {
            return Err(GraphError::HashMismatch {
                expected: self.hash.clone(),
                actual,
            });
        }

        for node_ref in &self.node_refs {
            if node_ref.depth == 0 {
                return Err(GraphError::Malformed(format!(
                    "node ref into {} has depth 0",
                    node_ref.node
                )));
            }
        }

        for (i, content) in self.contents.iter().enumerate() {
            match content.form {
                Form::Text if content.chunks.is_empty() => {
                    return Err(GraphError::Malformed(format!("content {} is empty", i)));
                }
                Form::Text => {}
                Form::FileSrc | Form::FileSnk => {
                    if content.path.is_none() || !content.chunks.is_empty() {
                        return Err(GraphError::Malformed(format!(
                            "sentinel content {} needs a path and no chunks",
                            i
                        )));
                    }
                }
            }
        }

        for edge in &self.edge_refs {
            if let Endpoint::Created(_, content) = self.endpoint(edge.src)? {
                if content.form == Form::FileSnk {
                    return Err(GraphError::Malformed(
                        "an end-of-file sentinel cannot be an edge source".to_string(),
                    ));
                }
            }
            if let Target::Index(dst) = edge.dst {
                if let Endpoint::Created(_, content) = self.endpoint(dst)? {
                    if content.form == Form::FileSrc {
                        return Err(GraphError::Malformed(
                            "a start-of-file sentinel cannot be an edge destination".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Serialize to the JSON interchange format
    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::Malformed(format!("failed to encode commit: {}", e)))
    }

    /// Parse the JSON interchange format
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json)
            .map_err(|e| GraphError::Malformed(format!("failed to decode commit: {}", e)))
    }
}

//! Commit application
//!
//! Applying a commit runs inside one repo transaction: every node the commit
//! references is split first, new content is materialized next, and edges
//! are wired last. Any failure rolls the whole commit back, splits included.

use super::{Ancestry, Graph};
use crate::error::GraphError;
use crate::graph::commit::Endpoint;
use crate::graph::{Commit, Edge, Form, Node, NodeRef, Target};
use crate::hashing::{chain_span, content_key, Span};
use crate::store::{with_transaction, Repo};
use crate::types::{short, sink_identity, source_identity, Hash, END_OF_FILE};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Boundaries resolved while applying one commit, indexed like the commit
struct Resolution {
    /// Tail of the unit after which each node-ref source links
    ref_tails: Vec<Option<Hash>>,
    /// Head of the unit before which each node-ref destination lands
    ref_heads: Vec<Option<Hash>>,
    /// Head/tail of each materialized content entry
    created: Vec<Option<Span>>,
}

impl<R: Repo> Graph<R> {
    /// Apply `commit`, or fail leaving the graph unchanged
    #[instrument(skip(self, commit), fields(commit = %short(&commit.hash)))]
    pub fn apply(&self, commit: &Commit) -> Result<(), GraphError> {
        let result = with_transaction(&self.repo, || self.apply_within(commit));
        match &result {
            Ok(()) => info!(
                contents = commit.contents.len(),
                edges = commit.edge_refs.len(),
                "Applied commit"
            ),
            Err(err) => warn!(error = %err, "Rejected commit"),
        }
        result
    }

    fn apply_within(&self, commit: &Commit) -> Result<(), GraphError> {
        if self.is_applied(&commit.hash)? {
            return Err(GraphError::AlreadyApplied(commit.hash.clone()));
        }
        for dep in &commit.deps {
            if !self.is_applied(dep)? {
                return Err(GraphError::MissingDependency {
                    commit: commit.hash.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        commit.validate(self.hasher())?;

        let mut resolution = Resolution {
            ref_tails: vec![None; commit.node_refs.len()],
            ref_heads: vec![None; commit.node_refs.len()],
            created: vec![None; commit.contents.len()],
        };

        self.presplit(commit, &mut resolution)?;
        self.materialize(commit, &mut resolution)?;
        self.wire(commit, &resolution)?;

        self.repo.put_commit(commit)?;
        Ok(())
    }

    /// Split every referenced node before any content is created
    fn presplit(&self, commit: &Commit, resolution: &mut Resolution) -> Result<(), GraphError> {
        for edge in &commit.edge_refs {
            if let Endpoint::Existing(node_ref) = commit.endpoint(edge.src)? {
                let point = self.split_within(&node_ref.node, node_ref.depth)?;
                resolution.ref_tails[edge.src] = Some(point.left_tail);
            }
            if let Target::Index(dst) = edge.dst {
                if let Endpoint::Existing(node_ref) = commit.endpoint(dst)? {
                    resolution.ref_heads[dst] = Some(self.entry_head(node_ref)?);
                }
            }
        }
        Ok(())
    }

    /// Head of the unit a destination ref names
    fn entry_head(&self, node_ref: &NodeRef) -> Result<Hash, GraphError> {
        if node_ref.depth == 1 {
            return Ok(self.node(&node_ref.node)?.head);
        }
        self.split_within(&node_ref.node, node_ref.depth - 1)?
            .right_head
            .ok_or_else(|| {
                GraphError::Malformed(format!(
                    "destination depth {} runs past the end of {}",
                    node_ref.depth, node_ref.node
                ))
            })
    }

    fn materialize(&self, commit: &Commit, resolution: &mut Resolution) -> Result<(), GraphError> {
        for (i, content) in commit.contents.iter().enumerate() {
            let identity = match (content.form, content.path.as_deref()) {
                (Form::FileSrc, Some(path)) => source_identity(path),
                (Form::FileSnk, Some(path)) => sink_identity(path),
                _ => continue,
            };
            if self.repo.get_node(&identity)?.is_some() {
                return Err(GraphError::Malformed(format!(
                    "sentinel {} already exists",
                    identity
                )));
            }
            self.record_node(&Node::sentinel(content.form, &identity))?;
            resolution.created[i] = Some(Span {
                head: identity.clone(),
                tail: identity,
            });
        }

        let mut visiting = BTreeSet::new();
        for (i, content) in commit.contents.iter().enumerate() {
            if content.form == Form::Text {
                self.create_text(commit, i, resolution, &mut visiting)?;
            }
        }
        Ok(())
    }

    /// Materialize text content `index`, creating its predecessor first when
    /// that is also new in this commit
    fn create_text(
        &self,
        commit: &Commit,
        index: usize,
        resolution: &mut Resolution,
        visiting: &mut BTreeSet<usize>,
    ) -> Result<Span, GraphError> {
        if let Some(span) = &resolution.created[index] {
            return Ok(span.clone());
        }
        if !visiting.insert(index) {
            return Err(GraphError::Malformed(format!(
                "content {} is its own predecessor",
                index
            )));
        }

        let endpoint = commit.node_refs.len() + index;
        let incoming = commit
            .edge_refs
            .iter()
            .find(|edge| edge.dst == Target::Index(endpoint))
            .ok_or_else(|| {
                GraphError::Malformed(format!("content {} has no predecessor", index))
            })?;
        let prev = match commit.endpoint(incoming.src)? {
            Endpoint::Existing(_) => source_tail(resolution, incoming.src)?,
            Endpoint::Created(src, _) => self.create_text(commit, src, resolution, visiting)?.tail,
        };

        let chunks = &commit.contents[index].chunks;
        let alg = self.hasher();
        let span = chain_span(alg, &commit.hash, &prev, Form::Text, chunks)?;
        let key = content_key(alg, chunks);
        self.repo.put_content(&key, chunks)?;
        self.record_node(&Node::text(
            span.head.clone(),
            span.tail.clone(),
            key,
            chunks.len() as u64,
        ))?;

        debug!(
            head = %short(&span.head),
            prev = %short(&prev),
            units = chunks.len(),
            "Materialized content"
        );
        resolution.created[index] = Some(span.clone());
        Ok(span)
    }

    fn wire(&self, commit: &Commit, resolution: &Resolution) -> Result<(), GraphError> {
        let mut ancestry = Ancestry::new(&self.repo);
        ancestry.register(commit);

        for edge in &commit.edge_refs {
            let src_tail = match commit.endpoint(edge.src)? {
                Endpoint::Existing(_) => source_tail(resolution, edge.src)?,
                Endpoint::Created(i, _) => created_span(resolution, i)?.tail.clone(),
            };
            let dst_head = match edge.dst {
                Target::EndOfFile => END_OF_FILE.to_string(),
                Target::Index(dst) => match commit.endpoint(dst)? {
                    Endpoint::Existing(_) => resolution.ref_heads[dst].clone().ok_or_else(|| {
                        GraphError::Malformed(format!("destination {} was not resolved", dst))
                    })?,
                    Endpoint::Created(i, _) => created_span(resolution, i)?.head.clone(),
                },
            };

            let mut source = self.node_by_tail(&src_tail)?;
            if source.form == Form::FileSnk {
                return Err(GraphError::Malformed(format!(
                    "{} cannot be an edge source",
                    source.head
                )));
            }
            source.outs.push(Edge::primary(&commit.hash, &dst_head));
            source.out_deps = out_deps(&source.outs, &mut ancestry)?;
            self.repo.put_node(&source)?;

            if dst_head != END_OF_FILE {
                let mut dest = self.node(&dst_head)?;
                if dest.form == Form::FileSrc {
                    return Err(GraphError::Malformed(format!(
                        "{} cannot be an edge destination",
                        dest.head
                    )));
                }
                dest.ins.push(Edge::primary(&commit.hash, &src_tail));
                self.repo.put_node(&dest)?;
            }

            debug!(from = %short(&src_tail), to = %short(&dst_head), "Wired edge");
        }
        Ok(())
    }
}

fn source_tail(resolution: &Resolution, index: usize) -> Result<Hash, GraphError> {
    resolution.ref_tails[index]
        .clone()
        .ok_or_else(|| GraphError::Malformed(format!("source {} was not resolved", index)))
}

fn created_span(resolution: &Resolution, index: usize) -> Result<&Span, GraphError> {
    resolution.created[index]
        .as_ref()
        .ok_or_else(|| GraphError::Malformed(format!("content {} was not materialized", index)))
}

/// For each out edge, the other out edges whose commits it transitively
/// depends on
fn out_deps<R: Repo + ?Sized>(
    outs: &[Edge],
    ancestry: &mut Ancestry<'_, R>,
) -> Result<Vec<Vec<usize>>, GraphError> {
    let mut deps = Vec::with_capacity(outs.len());
    for (i, edge) in outs.iter().enumerate() {
        let ancestors = ancestry.ancestors(&edge.commit)?;
        deps.push(
            outs.iter()
                .enumerate()
                .filter(|(j, other)| *j != i && ancestors.contains(&other.commit))
                .map(|(j, _)| j)
                .collect(),
        );
    }
    Ok(deps)
}

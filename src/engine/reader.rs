//! Reading files back out of the graph

use super::Graph;
use crate::chunk::join_lines;
use crate::error::GraphError;
use crate::graph::{Form, Frontier, Node};
use crate::store::Repo;
use crate::types::{short, source_identity, Chunk, Hash, END_OF_FILE};
use std::collections::HashSet;
use tracing::debug;

/// A run of consecutive cuts sharing one conflicting commit set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRegion {
    /// Node crossed when the conflict first appeared
    pub start: Hash,
    /// Last node crossed while it persisted
    pub end: Hash,
    pub commits: Vec<Hash>,
}

impl<R: Repo> Graph<R> {
    /// Units of `path` as seen by `frontier`.
    ///
    /// A verge is walked across the whole file while the reader follows the
    /// visible continuation out of each live node. Fails with
    /// [`GraphError::Conflict`] at the first cut with more than one
    /// dominating commit, even when that cut lies beside the followed path.
    pub fn read_file<F: Frontier + ?Sized>(
        &self,
        path: &str,
        frontier: &F,
    ) -> Result<Vec<Chunk>, GraphError> {
        let mut verge = self.verge(path)?;
        let mut units = Vec::new();
        let mut crossed = HashSet::new();
        let mut live = successor(&self.node(&source_identity(path))?, frontier)?;

        loop {
            let commits = verge.conflicts(frontier);
            if !commits.is_empty() {
                debug!(
                    node = %short(verge.position()),
                    count = commits.len(),
                    "Conflicting cut"
                );
                return Err(GraphError::Conflict {
                    node: verge.position().to_string(),
                    commits,
                });
            }

            let target = match live {
                Some(ref head) if head != END_OF_FILE => head.clone(),
                _ => break,
            };
            let node = verge.next()?.ok_or_else(|| {
                GraphError::Malformed(format!(
                    "{} is unreachable while reading {}",
                    target, path
                ))
            })?;
            if !crossed.insert(node.head.clone()) {
                return Err(GraphError::Malformed(format!(
                    "cycle through {} while reading {}",
                    node.head, path
                )));
            }

            if node.head == target {
                match node.form {
                    Form::Text => units.extend(self.content(&node)?),
                    Form::FileSnk => break,
                    Form::FileSrc => {}
                }
                live = successor(&node, frontier)?;
            }
            verge.advance(&node)?;
        }

        debug!(path, units = units.len(), "Read file");
        Ok(units)
    }

    /// [`Graph::read_file`] joined with line breaks
    pub fn read_text<F: Frontier + ?Sized>(
        &self,
        path: &str,
        frontier: &F,
    ) -> Result<Vec<u8>, GraphError> {
        Ok(join_lines(&self.read_file(path, frontier)?))
    }

    /// Walk a verge across the whole of `path` and report where the cut is
    /// ambiguous under `frontier`
    pub fn scan_conflicts<F: Frontier + ?Sized>(
        &self,
        path: &str,
        frontier: &F,
    ) -> Result<Vec<ConflictRegion>, GraphError> {
        let mut verge = self.verge(path)?;
        let mut regions: Vec<ConflictRegion> = Vec::new();
        let mut extending = false;

        loop {
            let commits = verge.conflicts(frontier);
            if commits.is_empty() {
                extending = false;
            } else {
                let position = verge.position().to_string();
                match regions.last_mut() {
                    Some(region) if extending && region.commits == commits => {
                        region.end = position;
                    }
                    _ => regions.push(ConflictRegion {
                        start: position.clone(),
                        end: position,
                        commits,
                    }),
                }
                extending = true;
            }

            match verge.next()? {
                Some(node) => verge.advance(&node)?,
                None => break,
            }
        }

        debug!(path, regions = regions.len(), "Scanned for conflicts");
        Ok(regions)
    }
}

/// Target of the single visible out edge not subsumed by another visible one
fn successor<F: Frontier + ?Sized>(node: &Node, frontier: &F) -> Result<Option<Hash>, GraphError> {
    let visible: Vec<usize> = (0..node.outs.len())
        .filter(|&i| frontier.observes(&node.outs[i].commit))
        .collect();
    let live: Vec<usize> = visible
        .iter()
        .copied()
        .filter(|&i| {
            !visible.iter().any(|&j| {
                j != i
                    && node
                        .out_deps
                        .get(j)
                        .map_or(false, |subsumed| subsumed.contains(&i))
            })
        })
        .collect();

    match live.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(node.outs[*only].target.clone())),
        _ => {
            let mut commits: Vec<Hash> = live.iter().map(|&i| node.outs[i].commit.clone()).collect();
            commits.sort();
            commits.dedup();
            debug!(node = %short(&node.head), count = commits.len(), "Conflicting continuations");
            Err(GraphError::Conflict {
                node: node.head.clone(),
                commits,
            })
        }
    }
}

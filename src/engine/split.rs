//! Node splitting
//!
//! A node's logical run may already span several physical nodes linked by
//! non-primary continuation edges. Splitting at `depth` walks that chain,
//! and either reports an existing boundary or cuts one node in two. The left
//! piece keeps the original head and incoming edges; the right piece keeps
//! the original tail and outgoing edges. Both halves' hash chains are
//! re-derived from stored content and must reproduce the original ends.

use super::{link_span, Graph};
use crate::error::GraphError;
use crate::graph::{Edge, Form, Node};
use crate::hashing::{chain_span, content_key};
use crate::store::{with_transaction, Repo};
use crate::types::{short, Hash, END_OF_FILE};
use tracing::{debug, instrument};

/// Result of splitting a run at a unit boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPoint {
    /// Tail of the piece ending at the boundary
    pub left_tail: Hash,
    /// Head of the piece starting after the boundary, when the run continues
    pub right_head: Option<Hash>,
}

impl<R: Repo> Graph<R> {
    /// Split the run starting at `head` after `depth` units, atomically.
    ///
    /// Splitting at an existing boundary changes nothing and returns that
    /// boundary.
    #[instrument(skip(self, head), fields(head = %short(head)))]
    pub fn split_node(&self, head: &str, depth: u64) -> Result<SplitPoint, GraphError> {
        with_transaction(&self.repo, || self.split_within(head, depth))
    }

    /// Split without opening a transaction; the caller owns it.
    pub(crate) fn split_within(&self, head: &str, depth: u64) -> Result<SplitPoint, GraphError> {
        if depth == 0 {
            return Err(GraphError::Malformed(format!(
                "split depth must be positive (node {})",
                head
            )));
        }

        let mut node = self.node(head)?;
        let mut remaining = depth;
        loop {
            if node.form.is_sentinel() {
                if remaining == 1 {
                    let right_head = sentinel_successor(&node);
                    return Ok(SplitPoint {
                        left_tail: node.tail,
                        right_head,
                    });
                }
                break;
            }
            if remaining == node.count {
                let right_head = node.continuation().map(|edge| edge.target.clone());
                return Ok(SplitPoint {
                    left_tail: node.tail,
                    right_head,
                });
            }
            if remaining < node.count {
                return self.cut(node, remaining);
            }
            remaining -= node.count;
            match node.continuation() {
                Some(edge) => {
                    let next = edge.target.clone();
                    node = self.node(&next)?;
                }
                None => break,
            }
        }

        Err(GraphError::Malformed(format!(
            "split depth {} exceeds the run starting at {}",
            depth, head
        )))
    }

    /// Physically cut `node` after `at` units (0 < at < count)
    fn cut(&self, node: Node, at: u64) -> Result<SplitPoint, GraphError> {
        if node.form != Form::Text {
            return Err(GraphError::UnsupportedForm(node.form));
        }

        let chunks = self.content(&node)?;
        if chunks.len() as u64 != node.count {
            return Err(GraphError::Malformed(format!(
                "node {} claims {} units but stores {}",
                node.head,
                node.count,
                chunks.len()
            )));
        }

        let (commit, prev) = node.seed()?;
        let (left_chunks, right_chunks) = chunks.split_at(at as usize);
        let alg = self.hasher();
        let left = chain_span(alg, commit, prev, Form::Text, left_chunks)?;
        let right = chain_span(alg, commit, &left.tail, Form::Text, right_chunks)?;

        if left.head != node.head {
            return Err(GraphError::HashMismatch {
                expected: node.head.clone(),
                actual: left.head,
            });
        }
        if right.tail != node.tail {
            return Err(GraphError::HashMismatch {
                expected: node.tail.clone(),
                actual: right.tail,
            });
        }

        let left_key = content_key(alg, left_chunks);
        let right_key = content_key(alg, right_chunks);
        self.repo.put_content(&left_key, left_chunks)?;
        self.repo.put_content(&right_key, right_chunks)?;

        let commit = commit.to_string();
        let Node {
            head,
            tail,
            count,
            ins,
            outs,
            out_deps,
            ..
        } = node;

        let left_node = Node {
            head,
            tail: left.tail.clone(),
            form: Form::Text,
            content: Some(left_key),
            count: at,
            ins,
            outs: vec![Edge::continuation(&commit, &right.head)],
            out_deps: vec![Vec::new()],
        };
        let right_node = Node {
            head: right.head.clone(),
            tail,
            form: Form::Text,
            content: Some(right_key),
            count: count - at,
            ins: vec![Edge::continuation(&commit, &left.tail)],
            outs,
            out_deps,
        };

        self.repo.put_node(&left_node)?;
        self.repo.put_node(&right_node)?;
        link_span(&self.repo, &left_node.head, &left_node.tail)?;
        link_span(&self.repo, &right_node.head, &right_node.tail)?;

        debug!(
            left = %short(&left_node.head),
            right = %short(&right_node.head),
            left_count = left_node.count,
            right_count = right_node.count,
            "Split node"
        );

        Ok(SplitPoint {
            left_tail: left.tail,
            right_head: Some(right.head),
        })
    }
}

/// Destination of a sentinel's only outgoing edge.
///
/// Once a second edge leaves the sentinel the unit after it depends on the
/// frontier, so there is no single answer.
fn sentinel_successor(node: &Node) -> Option<Hash> {
    match node.outs.as_slice() {
        [only] if only.target != END_OF_FILE => Some(only.target.clone()),
        _ => None,
    }
}

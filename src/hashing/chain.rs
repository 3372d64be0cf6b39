//! Chained unit hashing and content addressing
//!
//! unit_hash = H("unit" || commit || prev || form || bytes)
//!
//! Each field is length-prefixed (8 bytes, big-endian) so that no two
//! distinct field tuples share a preimage. Folding `unit_hash` across a chunk
//! sequence yields the head (first unit) and tail (last unit) of a run. The
//! same edit made by two different commits produces disjoint chains, and the
//! chain of any stored run can be re-derived from its content, its commit and
//! its predecessor.

use super::HashAlgorithm;
use crate::error::GraphError;
use crate::graph::Form;
use crate::types::{Chunk, Hash};

/// Head and tail hashes of a run of units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub head: Hash,
    pub tail: Hash,
}

/// Length-prefixed, domain-tagged preimage builder
#[derive(Debug, Default)]
pub struct Preimage {
    buf: Vec<u8>,
}

impl Preimage {
    pub fn new(domain: &str) -> Self {
        let mut preimage = Self { buf: Vec::new() };
        preimage.field(domain.as_bytes());
        preimage
    }

    /// Append a length-prefixed field
    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a fixed-width integer
    pub fn number(&mut self, n: u64) -> &mut Self {
        self.buf.extend_from_slice(&n.to_be_bytes());
        self
    }

    pub fn finish(&self, alg: &dyn HashAlgorithm) -> Hash {
        alg.digest(&self.buf)
    }
}

/// Hash of a single unit given its commit and predecessor
pub fn unit_hash(
    alg: &dyn HashAlgorithm,
    commit: &str,
    prev: &str,
    form: Form,
    chunk: &[u8],
) -> Hash {
    Preimage::new("unit")
        .field(commit.as_bytes())
        .field(prev.as_bytes())
        .field(form.tag())
        .field(chunk)
        .finish(alg)
}

/// Fold `unit_hash` across `chunks`, seeded by `commit` and `prev`
pub fn chain_span(
    alg: &dyn HashAlgorithm,
    commit: &str,
    prev: &str,
    form: Form,
    chunks: &[Chunk],
) -> Result<Span, GraphError> {
    let (first, rest) = chunks
        .split_first()
        .ok_or_else(|| GraphError::Malformed("cannot hash an empty chunk sequence".to_string()))?;

    let head = unit_hash(alg, commit, prev, form, first);
    let mut tail = head.clone();
    for chunk in rest {
        tail = unit_hash(alg, commit, &tail, form, chunk);
    }

    Ok(Span { head, tail })
}

/// Content-addressing key of a chunk sequence (independent of any commit)
pub fn content_key(alg: &dyn HashAlgorithm, chunks: &[Chunk]) -> Hash {
    let mut preimage = Preimage::new("content");
    preimage.number(chunks.len() as u64);
    for chunk in chunks {
        preimage.field(chunk);
    }
    preimage.finish(alg)
}

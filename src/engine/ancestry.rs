//! Transitive commit dependencies

use crate::error::GraphError;
use crate::graph::{Commit, Frontier};
use crate::store::Repo;
use crate::types::Hash;
use std::collections::{BTreeSet, HashMap};

/// Memoized ancestor sets over a repo's commits.
///
/// A commit not yet recorded can be registered with [`Ancestry::register`]
/// so that in-flight applies see their own dependencies.
pub struct Ancestry<'r, R: Repo + ?Sized> {
    repo: &'r R,
    deps: HashMap<Hash, Vec<Hash>>,
    cache: HashMap<Hash, BTreeSet<Hash>>,
}

impl<'r, R: Repo + ?Sized> Ancestry<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self {
            repo,
            deps: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Make `commit`'s declared dependencies known without reading the repo
    pub fn register(&mut self, commit: &Commit) {
        self.deps.insert(commit.hash.clone(), commit.deps.clone());
    }

    /// Declared (direct) dependencies of `commit`
    pub fn deps(&mut self, commit: &str) -> Result<&[Hash], GraphError> {
        if !self.deps.contains_key(commit) {
            let record = self
                .repo
                .get_commit(commit)?
                .ok_or_else(|| GraphError::CommitNotFound(commit.to_string()))?;
            self.deps.insert(commit.to_string(), record.deps);
        }
        Ok(self.deps.get(commit).map(Vec::as_slice).unwrap_or_default())
    }

    /// All transitive dependencies of `commit`, excluding itself
    pub fn ancestors(&mut self, commit: &str) -> Result<&BTreeSet<Hash>, GraphError> {
        if !self.cache.contains_key(commit) {
            let mut seen = BTreeSet::new();
            let mut stack: Vec<Hash> = self.deps(commit)?.to_vec();
            while let Some(next) = stack.pop() {
                if let Some(known) = self.cache.get(&next) {
                    seen.extend(known.iter().cloned());
                    seen.insert(next);
                    continue;
                }
                if seen.insert(next.clone()) {
                    stack.extend(self.deps(&next)?.iter().cloned());
                }
            }
            self.cache.insert(commit.to_string(), seen);
        }
        self.cache
            .get(commit)
            .ok_or_else(|| GraphError::CommitNotFound(commit.to_string()))
    }

    /// Whether `descendant` transitively depends on `ancestor`
    pub fn depends_on(&mut self, descendant: &str, ancestor: &str) -> Result<bool, GraphError> {
        Ok(self.ancestors(descendant)?.contains(ancestor))
    }
}

/// Observes a set of head commits and everything they depend on
#[derive(Debug, Clone, Default)]
pub struct AncestryFrontier {
    observed: BTreeSet<Hash>,
}

impl AncestryFrontier {
    pub fn new<R: Repo + ?Sized>(repo: &R, heads: &[Hash]) -> Result<Self, GraphError> {
        let mut ancestry = Ancestry::new(repo);
        let mut observed = BTreeSet::new();
        for head in heads {
            observed.extend(ancestry.ancestors(head)?.iter().cloned());
            observed.insert(head.clone());
        }
        Ok(Self { observed })
    }

    pub fn commits(&self) -> &BTreeSet<Hash> {
        &self.observed
    }
}

impl Frontier for AncestryFrontier {
    fn observes(&self, commit: &str) -> bool {
        self.observed.contains(commit)
    }
}

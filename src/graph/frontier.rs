//! Frontiers: views over the set of applied commits

use crate::types::Hash;
use std::collections::HashSet;

/// Membership predicate over commits. The engine never enumerates a
/// frontier, it only asks whether a commit is observed.
pub trait Frontier {
    fn observes(&self, commit: &str) -> bool;
}

impl<F> Frontier for F
where
    F: Fn(&str) -> bool,
{
    fn observes(&self, commit: &str) -> bool {
        self(commit)
    }
}

/// Observes every commit
#[derive(Debug, Clone, Copy, Default)]
pub struct Everything;

impl Frontier for Everything {
    fn observes(&self, _commit: &str) -> bool {
        true
    }
}

/// Observes an explicit set of commits
#[derive(Debug, Clone, Default)]
pub struct CommitSet {
    commits: HashSet<Hash>,
}

impl CommitSet {
    pub fn new<I, S>(commits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Hash>,
    {
        Self {
            commits: commits.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, commit: &str) {
        self.commits.insert(commit.to_string());
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

impl Frontier for CommitSet {
    fn observes(&self, commit: &str) -> bool {
        self.commits.contains(commit)
    }
}

//! Error types for the strand graph engine.

use crate::graph::Form;
use crate::types::Hash;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("A transaction is already active")]
    TransactionActive,

    #[error("No transaction is active")]
    NoTransaction,

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Errors surfaced by graph operations (split, apply, verge traversal, reads)
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Commit already applied: {0}")]
    AlreadyApplied(Hash),

    #[error("Commit {commit} depends on unrecorded commit {dependency}")]
    MissingDependency { commit: Hash, dependency: Hash },

    #[error("Node not found: {0}")]
    NodeNotFound(Hash),

    #[error("Content not found: {0}")]
    ContentNotFound(Hash),

    #[error("Commit not found: {0}")]
    CommitNotFound(Hash),

    #[error("No ref recorded for {0}")]
    RefNotFound(Hash),

    #[error("Malformed: {0}")]
    Malformed(String),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("Unsupported form for this operation: {0:?}")]
    UnsupportedForm(Form),

    #[error("Invalid traversal at node {node}: {reason}")]
    InvalidTraversal { node: Hash, reason: String },

    #[error("Conflicting commits at node {node}: {commits:?}")]
    Conflict { node: Hash, commits: Vec<Hash> },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

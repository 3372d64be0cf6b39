//! Hash algorithm capability
//!
//! The engine never calls a hash function directly; it is handed a
//! [`HashAlgorithm`] so that the digest can be swapped (and tested) without
//! touching the graph code. BLAKE3 is the default.

pub mod chain;

pub use chain::{chain_span, content_key, unit_hash, Preimage, Span};

use crate::error::ConfigError;
use crate::types::Hash;
use sha2::{Digest, Sha256 as Sha256Hasher};
use std::sync::Arc;

/// A cryptographic digest producing lowercase hex identities
pub trait HashAlgorithm: Send + Sync {
    /// Name used in configuration (`blake3`, `sha256`)
    fn name(&self) -> &'static str;

    /// Digest arbitrary bytes
    fn digest(&self, data: &[u8]) -> Hash;
}

/// BLAKE3 digest (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl HashAlgorithm for Blake3 {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn digest(&self, data: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        hex::encode(hasher.finalize().as_bytes())
    }
}

/// SHA-256 digest
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl HashAlgorithm for Sha256 {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn digest(&self, data: &[u8]) -> Hash {
        let mut hasher = Sha256Hasher::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

/// Resolve a configured algorithm name
pub fn algorithm_from_name(name: &str) -> Result<Arc<dyn HashAlgorithm>, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "blake3" => Ok(Arc::new(Blake3)),
        "sha256" => Ok(Arc::new(Sha256)),
        other => Err(ConfigError::Invalid(format!(
            "Unknown hash algorithm: {} (must be 'blake3' or 'sha256')",
            other
        ))),
    }
}

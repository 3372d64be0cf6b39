//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.backend", "sled")?
        .set_default("storage.path", ".strand/store")?
        .set_default("hashing.algorithm", "blake3")
}

/// Environment source: `STRAND_STORAGE__BACKEND=memory` overrides `storage.backend`.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("STRAND")
        .prefix_separator("_")
        .separator("__")
}

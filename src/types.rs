//! Shared identity types and reserved identities.

/// Hex digest or sentinel identity naming a unit, node, commit or content blob
pub type Hash = String;

/// One atomic unit of content (a line, without its terminator)
pub type Chunk = Vec<u8>;

/// Edge target meaning "end of file"; stored verbatim, never resolved to a node
pub const END_OF_FILE: &str = "eof";

/// Identity of the start-of-file sentinel node for `path`
pub fn source_identity(path: &str) -> Hash {
    format!("src:{}", path)
}

/// Identity of the end-of-file sentinel node for `path`
pub fn sink_identity(path: &str) -> Hash {
    format!("snk:{}", path)
}

/// Abbreviate a hash for log output
pub fn short(hash: &str) -> &str {
    match hash.char_indices().nth(12) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

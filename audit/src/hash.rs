//! Canonical hashing of JSON-serializable values.
//!
//! Digests are computed over the compact `serde_json` encoding. Struct field
//! order in the serialized output follows declaration order, which makes the
//! encoding deterministic as long as hashed payloads contain no maps; the
//! chain types are all plain structs and vectors for exactly this reason.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over the compact JSON encoding of `value`, as lowercase hex.
pub fn canonical_json_sha256<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(hex::encode(hasher.finalize()))
}

//! SHA-256 fingerprints (lowercase hex).
//!
//! - `sha256_canonical(..)` for JSON values/structs (goes through canonical_json);
//! - `sha256_hex(..)` for raw bytes.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes;
use crate::IoResult;

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

/// Short form for logs and report headers.
pub fn short(hex64: &str) -> &str {
    hex64.get(..12).unwrap_or(hex64)
}

//! Content digests for cache validity checks.
//!
//! A digest is a pure function of the input bytes: equal content always
//! produces the same digest, and any differing byte produces a different one
//! with overwhelming probability. Digests carry no ordering guarantees.

use xxhash_rust::xxh3::xxh3_128;

/// Computes the content digest as a fixed-length (32 char) lowercase hex string.
pub fn digest(content: &[u8]) -> String {
    format!("{:032x}", xxh3_128(content))
}

//! Test fixtures for generating test data.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Generate deterministic test data based on a seed.
#[allow(dead_code)]
pub fn seeded_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        // Simple LCG for deterministic data
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    data
}

/// Compute SHA-256 hash of data as hex string.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A distinct valid OID per index.
#[allow(dead_code)]
pub fn oid(index: usize) -> String {
    sha256_hash(&seeded_bytes(index as u64 + 1, 64))
}

/// Storage key the server derives for an object in the default test repo.
#[allow(dead_code)]
pub fn object_key(oid: &str) -> String {
    format!("test-org/test-repo/{}/{}/{}", &oid[..2], &oid[2..4], oid)
}

/// Build a batch request body.
#[allow(dead_code)]
pub fn batch_body(operation: &str, objects: &[(&str, u64)]) -> Value {
    let objects: Vec<Value> = objects
        .iter()
        .map(|(oid, size)| json!({"oid": oid, "size": size}))
        .collect();
    json!({
        "operation": operation,
        "transfers": ["basic"],
        "objects": objects,
    })
}

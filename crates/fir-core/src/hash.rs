//! Deterministic cryptographic content hash of a value.
//!
//! `hash(Blob(b))  = SHA256("blob <len>\0" ++ b)`
//! `hash(List(xs)) = SHA256("list <len>\0" ++ concat(hash(x) for x in xs))`
//!
//! where `<len>` is the decimal byte count of a blob or element count of a
//! list. Used by external collaborators as a cache and storage key.

use sha2::{Digest, Sha256};

use crate::value::Value;

pub const CONTENT_HASH_LEN: usize = 32;

/// Compute the content hash of a value. Total and pure: equal values
/// always hash equal.
pub fn compute_hash(value: &Value) -> [u8; CONTENT_HASH_LEN] {
    match value {
        Value::Blob(blob) => hash_tagged(b"blob", blob.bytes().len(), blob.bytes()),
        Value::List(list) => {
            let items = list.items();
            let mut child_hashes = Vec::with_capacity(items.len() * CONTENT_HASH_LEN);
            for item in items {
                child_hashes.extend_from_slice(&compute_hash(item));
            }
            hash_tagged(b"list", items.len(), &child_hashes)
        }
    }
}

/// Content hash rendered as a lowercase hexadecimal string.
pub fn compute_hash_hex(value: &Value) -> String {
    to_hex_lower(&compute_hash(value))
}

fn hash_tagged(tag: &[u8], count: usize, payload: &[u8]) -> [u8; CONTENT_HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(b" ");
    hasher.update(count.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(payload);
    hasher.finalize().into()
}

pub fn to_hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256(bytes: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.finalize().into()
    }

    #[test]
    fn blob_hash_uses_length_prefix() {
        let value = Value::blob(vec![0, 1, 2]);
        let mut expected_input = b"blob 3\0".to_vec();
        expected_input.extend_from_slice(&[0, 1, 2]);
        assert_eq!(compute_hash(&value), sha256(&expected_input));
    }

    #[test]
    fn list_hash_concatenates_child_hashes() {
        let a = Value::blob(vec![10]);
        let b = Value::blob(vec![20, 21]);
        let value = Value::list(vec![a.clone(), b.clone()]);

        let mut expected_input = b"list 2\0".to_vec();
        expected_input.extend_from_slice(&compute_hash(&a));
        expected_input.extend_from_slice(&compute_hash(&b));
        assert_eq!(compute_hash(&value), sha256(&expected_input));
    }

    #[test]
    fn empty_blob_and_empty_list_hash_differently() {
        assert_ne!(
            compute_hash(&Value::empty_blob()),
            compute_hash(&Value::empty_list())
        );
    }

    #[test]
    fn equal_values_hash_equal() {
        let a = Value::list(vec![Value::blob(vec![1, 2]), Value::empty_list()]);
        let b = Value::list(vec![Value::blob(vec![1, 2]), Value::empty_list()]);
        assert_eq!(compute_hash(&a), compute_hash(&b));
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(to_hex_lower(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(compute_hash_hex(&Value::empty_blob()).len(), 64);
    }
}

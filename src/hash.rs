//! Byte equality and seeded hashing.
//!
//! Both look only at the flattened bytes, so two ropes with different tree
//! shapes compare and hash the same. The `PartialEq` and `Hash` impls on
//! [`Rope`] also take the encoding into account.

use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use crate::node::Rope;

impl Rope {
    /// Whether both ropes hold the same bytes. Encodings are not compared.
    pub fn bytes_eq(&self, other: &Rope) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.byte_len() != other.byte_len() {
            return false;
        }
        return self.bytes() == other.bytes();
    }

    /// blake3 of `seed` followed by the bytes, truncated to 64 bits.
    ///
    /// The hash is not cached: callers hash the same bytes under different
    /// seeds.
    pub fn hash_with(&self, seed: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(self.bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        return u64::from_le_bytes(head);
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Rope) -> bool {
        return self.encoding() == other.encoding() && self.bytes_eq(other);
    }
}

impl Eq for Rope {}

impl Hash for Rope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoding().hash(state);
        self.bytes().hash(state);
    }
}

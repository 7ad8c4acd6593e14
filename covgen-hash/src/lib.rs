//! Hashing primitives shared by the covgen crates.
//!
//! All digests are lowercase hex SHA-256.

use sha2::{Digest, Sha256};

/// Incremental fingerprint over a sequence of typed fields.
///
/// Every field is tagged and length-prefixed, so `("ab", "c")` and `("a", "bc")` never collide.
#[derive(Clone)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Start a fingerprint in its own domain; different domains never share digests.
    pub fn new(domain: &str) -> Self {
        let mut fp = Self {
            hasher: Sha256::new(),
        };
        fp.push(b'd', domain.as_bytes());
        fp
    }

    pub fn str(mut self, value: &str) -> Self {
        self.push(b's', value.as_bytes());
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.push(b'b', value);
        self
    }

    pub fn flag(mut self, value: bool) -> Self {
        self.push(b'f', &[value as u8]);
        self
    }

    pub fn byte(mut self, value: u8) -> Self {
        self.push(b'u', &[value]);
        self
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    fn push(&mut self, tag: u8, value: &[u8]) {
        self.hasher.update([tag]);
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value);
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fingerprint").finish_non_exhaustive()
    }
}

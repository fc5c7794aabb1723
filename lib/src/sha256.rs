use crate::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 256-bit digest, represented as a big-endian unsigned integer for
/// target comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(U256);

impl Hash {
    /// Hash anything that can be canonically serialized.
    ///
    /// Serialization failures here would mean a type in this crate is not
    /// CBOR-representable, which is a programming error, not a runtime
    /// condition callers should need to handle.
    pub fn hash<T: serde::Serialize>(data: &T) -> Self {
        let mut bytes = Vec::new();
        ciborium::into_writer(data, &mut bytes).expect("failed to serialize data for hashing");
        let digest = sha256::digest(&bytes);
        let raw = hex::decode(digest).expect("sha256 digest is not valid hex");
        Hash(U256::from_big_endian(&raw))
    }

    pub fn matches_target(&self, target: U256) -> bool {
        self.0 <= target
    }

    pub fn zero() -> Self {
        Hash(U256::zero())
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_little_endian(&mut bytes);
        bytes
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

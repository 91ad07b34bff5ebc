//! Pluggable hash functions for ring placement.

use serde::{Deserialize, Serialize};

/// Maps an arbitrary byte sequence to a position on the ring.
///
/// Any `Fn(&[u8]) -> u32` closure or function is a `KeyHasher`, so custom
/// hashes can be passed directly to [`HashRing::with_hasher`].
///
/// [`HashRing::with_hasher`]: crate::hashing::HashRing::with_hasher
pub trait KeyHasher: Send + Sync {
    /// Hash `data` to a 32-bit ring position.
    fn hash(&self, data: &[u8]) -> u32;
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u32 + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> u32 {
        self(data)
    }
}

/// CRC-32 (IEEE) checksum. This is the default ring hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32;

impl KeyHasher for Crc32 {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// CRC-32C (Castagnoli) checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32c;

impl KeyHasher for Crc32c {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32c::crc32c(data)
    }
}

/// Hash function selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// CRC-32 (IEEE).
    #[default]
    Crc32,
    /// CRC-32C (Castagnoli).
    Crc32c,
}

impl KeyHasher for HashAlgorithm {
    fn hash(&self, data: &[u8]) -> u32 {
        match self {
            HashAlgorithm::Crc32 => Crc32.hash(data),
            HashAlgorithm::Crc32c => Crc32c.hash(data),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Crc32 => write!(f, "crc32"),
            HashAlgorithm::Crc32c => write!(f, "crc32c"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        // Standard check value for CRC-32/ISO-HDLC.
        assert_eq!(Crc32.hash(b"123456789"), 0xCBF4_3926);
        assert_eq!(Crc32.hash(b"hello"), 907_060_870);
        assert_eq!(Crc32.hash(b""), 0);
    }

    #[test]
    fn test_crc32c_known_value() {
        // Standard check value for CRC-32C.
        assert_eq!(Crc32c.hash(b"123456789"), 0xE306_9283);
    }

    #[test]
    fn test_algorithm_dispatch() {
        assert_eq!(HashAlgorithm::Crc32.hash(b"key"), Crc32.hash(b"key"));
        assert_eq!(HashAlgorithm::Crc32c.hash(b"key"), Crc32c.hash(b"key"));
        assert_ne!(HashAlgorithm::Crc32.hash(b"key"), HashAlgorithm::Crc32c.hash(b"key"));
    }

    #[test]
    fn test_closure_is_hasher() {
        let len_hash = |data: &[u8]| data.len() as u32;
        assert_eq!(len_hash.hash(b"abcd"), 4);
    }

    #[test]
    fn test_algorithm_display() {
        assert_eq!(HashAlgorithm::Crc32.to_string(), "crc32");
        assert_eq!(HashAlgorithm::Crc32c.to_string(), "crc32c");
    }
}

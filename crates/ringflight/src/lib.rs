//! # Ringflight
//!
//! Building blocks for a distributed in-memory cache client: a consistent
//! hash ring that decides which peer owns a key, and call groups that make
//! concurrent loads of the same key share one execution.

pub mod flight;
pub mod hashing;
pub mod router;
pub mod types;

pub use flight::{AsyncCallGroup, CallGroup};
pub use hashing::{Crc32, Crc32c, HashAlgorithm, HashRing, KeyHasher, SharedRing};
pub use router::{PeerRouter, Route};
pub use types::*;

//! # hashsweep-core
//!
//! Core infrastructure for hashsweep.
//!
//! Provides shared abstractions for:
//! - Hash schemes (MD5, SHA-512, SHA-512-crypt) and prepared per-worker hashers
//! - The search-space data model (bounds, partitions, target, outcome)
//! - Errors

pub mod crypt;
pub mod error;
pub mod hashing;
pub mod types;

pub use error::{HashsweepError, Result};
pub use hashing::{HashScheme, PreparedHasher};
pub use types::{Partition, SearchOutcome, SearchSpace, TargetDigest};

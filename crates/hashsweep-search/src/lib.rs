//! # hashsweep-search
//!
//! Distributed brute-force search for a string whose digest matches a
//! target.
//!
//! The alphabet's first characters are split across a fixed pool of
//! workers. Each worker enumerates its share, hashes every candidate and
//! stops as soon as any worker reports a match.
//!
//! ## Quick Start
//!
//! ```rust
//! use hashsweep_core::{HashScheme, SearchSpace};
//! use hashsweep_search::{ClusterConfig, Coordinator, SearchConfig};
//!
//! let target = hex::encode(HashScheme::Md5.digest(b"abca", b""));
//! let config = SearchConfig::from_target_str(HashScheme::Md5, &target)
//!     .unwrap()
//!     .with_space(SearchSpace::new(4, 4, b'a', b'c'));
//!
//! let report = Coordinator::new(config, ClusterConfig::with_workers(3))
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(report.outcome.winning_candidate.as_deref(), Some("abca"));
//! ```
//!
//! ## Modules
//!
//! - [`generator`] - Candidate enumeration with suffix deduplication
//! - [`partition`] - First-character work split
//! - [`benchmark`] - Running-time estimation
//! - [`distributed`] - Workers, cancellation and the coordinator

pub mod benchmark;
pub mod config;
pub mod distributed;
pub mod generator;
pub mod partition;

pub use benchmark::{BenchmarkEstimator, Estimate};
pub use config::SearchConfig;
pub use distributed::{ClusterConfig, Coordinator, SearchReport};
pub use generator::{CandidateGenerator, Step};
pub use partition::partition;

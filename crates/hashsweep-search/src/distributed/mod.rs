//! Distributed search with a root rank and peer workers.
//!
//! Workers share no search state. They coordinate through a
//! [`Communicator`]: one scatter of partitions from the root, point-to-point
//! cancellation notices, and barriers.
//!
//! ## Protocol
//!
//! ```text
//!   rank 0 ── partition() ──scatter──▶ every rank
//!                                          │
//!                               (optional benchmark + barrier)
//!                                          │
//!   each rank: sweep partition, poll mailbox at checkpoints
//!                                          │
//!   finder ──notice──▶ every other rank ───┤
//!                                          │
//!                      barrier, final poll, rank 0 reports
//! ```
//!
//! A rank that fails or panics aborts the cluster, which releases every
//! peer from its barrier or mailbox poll with an error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hashsweep_search::distributed::{ClusterConfig, Coordinator};
//!
//! let coordinator = Coordinator::new(config, ClusterConfig::with_workers(4))?;
//! let report = coordinator.run()?;
//! ```

mod cancellation;
mod comm;
mod coordinator;
mod messages;
mod worker;

pub use cancellation::{CancellationChannel, SearchState};
pub use comm::{AbortHandle, Communicator, LocalCluster, LocalComm};
pub use coordinator::{ClusterConfig, Coordinator, SearchReport};
pub use messages::{FoundNotice, Rank, WorkerStats, ROOT};
pub use worker::{Worker, WorkerReport};

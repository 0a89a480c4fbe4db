//! Worker for distributed search.
//!
//! A worker receives its partition, optionally takes part in the benchmark,
//! sweeps its partition and meets every other worker at the final barrier.

use super::cancellation::{CancellationChannel, SearchState};
use super::comm::Communicator;
use super::messages::{WorkerStats, ROOT};
use crate::benchmark::{BenchmarkEstimator, Estimate};
use crate::config::SearchConfig;
use crate::generator::{CandidateGenerator, Step};
use crate::partition::partition;
use hashsweep_core::{Partition, PreparedHasher, Result, SearchOutcome};
use std::hint::black_box;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What one worker knows once the search is over.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Outcome as observed by this worker after the final barrier.
    pub outcome: SearchOutcome,
    /// Search statistics.
    pub stats: WorkerStats,
    /// Running-time estimate; only the root computes one.
    pub estimate: Option<Estimate>,
}

/// One rank of the search.
pub struct Worker<'a, C: Communicator> {
    config: &'a SearchConfig,
    comm: C,
    hasher: PreparedHasher,
}

impl<'a, C: Communicator> Worker<'a, C> {
    /// Create a worker with its own hasher.
    #[must_use]
    pub fn new(config: &'a SearchConfig, comm: C) -> Self {
        let hasher = config.hasher();
        Self {
            config,
            comm,
            hasher,
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// Run the whole protocol for this rank.
    ///
    /// If this rank fails or panics, the cluster is aborted so that its
    /// peers return [`HashsweepError::PeerAborted`] instead of blocking.
    ///
    /// [`HashsweepError::PeerAborted`]: hashsweep_core::HashsweepError::PeerAborted
    pub fn run(self) -> Result<WorkerReport> {
        let guard = AbortGuard::new(&self.comm);
        let report = self.run_protocol()?;
        guard.disarm();
        Ok(report)
    }

    fn run_protocol(&self) -> Result<WorkerReport> {
        let rank = self.comm.rank();
        let partitions = if rank == ROOT {
            Some(partition(self.comm.size(), &self.config.space)?)
        } else {
            None
        };
        let part = self.comm.scatter(partitions)?;
        debug!(rank, first_chars = ?part.first_chars, "received partition");

        let estimate = if self.config.benchmark {
            self.benchmark(&part)?
        } else {
            None
        };
        self.comm.barrier()?;

        let start = Instant::now();
        let channel = CancellationChannel::new(&self.comm);
        let mut state = SearchState::new();
        let mut stats = WorkerStats::new(&part);
        stats.candidates_tested = self.search(&part, &channel, &mut state)?;

        debug!(rank, tested = stats.candidates_tested, "waiting at final barrier");
        self.comm.barrier()?;
        channel.poll(&mut state)?;
        stats.elapsed_secs = start.elapsed().as_secs_f64();

        Ok(WorkerReport {
            outcome: state.into_outcome(),
            stats,
            estimate,
        })
    }

    /// Sweep `part`, polling for cancellation at every checkpoint.
    ///
    /// Returns the number of candidates hashed.
    fn search(
        &self,
        part: &Partition,
        channel: &CancellationChannel<'_, C>,
        state: &mut SearchState,
    ) -> Result<u64> {
        let mut tested = 0u64;
        let mut generator = CandidateGenerator::new(self.config.space, part);
        while let Some(step) = generator.next_step() {
            if state.is_stopped() {
                break;
            }
            match step {
                Step::Probe(offset) => {
                    let candidate = generator.candidate(offset);
                    tested += 1;
                    if self.hasher.matches(candidate) {
                        let candidate = String::from_utf8_lossy(candidate).into_owned();
                        channel.notify_all(state, &candidate)?;
                    }
                }
                Step::Checkpoint => {
                    channel.poll(state)?;
                }
            }
        }
        Ok(tested)
    }

    /// Time a sample sweep of `part` across the cluster.
    ///
    /// The sample never sends notices. Elapsed time includes the barrier, so
    /// it covers the slowest worker.
    fn benchmark(&self, part: &Partition) -> Result<Option<Estimate>> {
        let estimator = BenchmarkEstimator::new(self.config.space, self.config.scheme);
        let start = Instant::now();

        let mut generator = CandidateGenerator::new(estimator.sample_space(), part);
        while let Some(step) = generator.next_step() {
            if let Step::Probe(offset) = step {
                black_box(self.hasher.matches(generator.candidate(offset)));
            }
        }
        self.comm.barrier()?;

        let elapsed = start.elapsed();
        if self.comm.rank() != ROOT {
            return Ok(None);
        }
        let estimate = estimator.estimate(elapsed);
        info!(elapsed_secs = elapsed.as_secs_f64(), %estimate, "benchmark finished");
        Ok(Some(estimate))
    }
}

/// Aborts the cluster when dropped while armed, which covers both early
/// returns and unwinding.
struct AbortGuard<'c, C: Communicator> {
    comm: &'c C,
    armed: bool,
}

impl<'c, C: Communicator> AbortGuard<'c, C> {
    fn new(comm: &'c C) -> Self {
        Self { comm, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C: Communicator> Drop for AbortGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            warn!(rank = self.comm.rank(), "worker failed, aborting search");
            self.comm.abort();
        }
    }
}

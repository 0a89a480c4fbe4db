//! Coordinator for distributed search.
//!
//! The coordinator starts one worker per rank on a [`LocalCluster`], waits
//! for all of them and reports the root's view of the outcome.

use super::comm::{Communicator, LocalCluster, LocalComm};
use super::messages::{WorkerStats, ROOT};
use super::worker::{Worker, WorkerReport};
use crate::benchmark::Estimate;
use crate::config::SearchConfig;
use hashsweep_core::{HashsweepError, Result, SearchOutcome};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Instant;
use tracing::{info, warn};

/// Configuration for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of workers; fixed for the whole run.
    pub workers: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus(),
        }
    }
}

impl ClusterConfig {
    /// Create config with an explicit worker count.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }
}

/// Final result of a distributed search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// Outcome as known to the root after the final barrier.
    pub outcome: SearchOutcome,
    /// Running-time estimate, when the benchmark ran.
    pub estimate: Option<Estimate>,
    /// Per-worker statistics in rank order.
    pub workers: Vec<WorkerStats>,
    /// Total wall-clock time in seconds.
    pub elapsed_secs: f64,
}

impl SearchReport {
    /// Candidates hashed across all workers.
    #[must_use]
    pub fn candidates_tested(&self) -> u64 {
        self.workers.iter().map(|w| w.candidates_tested).sum()
    }
}

/// Runs a search across a pool of workers.
pub struct Coordinator {
    config: SearchConfig,
    cluster: ClusterConfig,
}

impl Coordinator {
    /// Validate `config` and create a coordinator.
    pub fn new(config: SearchConfig, cluster: ClusterConfig) -> Result<Self> {
        config.validate()?;
        if cluster.workers == 0 {
            return Err(HashsweepError::Config(
                "at least one worker is required".into(),
            ));
        }
        if cluster.workers > config.space.span() {
            warn!(
                workers = cluster.workers,
                span = config.space.span(),
                "more workers than characters; some workers will be idle"
            );
        }
        Ok(Self { config, cluster })
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search to completion.
    pub fn run(&self) -> Result<SearchReport> {
        let start = Instant::now();
        info!(
            workers = self.cluster.workers,
            scheme = %self.config.scheme,
            "starting search"
        );

        let mut reports = self.run_workers()?.into_iter();
        let root = reports
            .next()
            .ok_or_else(|| HashsweepError::Communication(format!("rank {ROOT} did not report")))?;

        let report = SearchReport {
            outcome: root.outcome,
            estimate: root.estimate,
            workers: std::iter::once(root.stats)
                .chain(reports.map(|r| r.stats))
                .collect(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            found = report.outcome.found,
            candidates = report.candidates_tested(),
            elapsed_secs = report.elapsed_secs,
            "search finished"
        );
        Ok(report)
    }

    /// Run the search and return every worker's outcome in rank order.
    pub fn run_all(&self) -> Result<Vec<SearchOutcome>> {
        Ok(self
            .run_workers()?
            .into_iter()
            .map(|report| report.outcome)
            .collect())
    }

    /// Start one thread per rank and collect their reports in rank order.
    fn run_workers(&self) -> Result<Vec<WorkerReport>> {
        let comms = LocalCluster::new(self.cluster.workers)?;
        let abort = comms.first().map(LocalComm::abort_handle);
        let config = &self.config;

        let results = thread::scope(|s| {
            let mut handles = Vec::with_capacity(comms.len());
            for comm in comms {
                let rank = comm.rank();
                let spawned = thread::Builder::new()
                    .name(format!("hashsweep-worker-{rank}"))
                    .spawn_scoped(s, move || Worker::new(config, comm).run());
                match spawned {
                    Ok(handle) => handles.push((rank, Some(handle))),
                    Err(e) => {
                        warn!(rank, error = %e, "failed to start worker");
                        if let Some(ref abort) = abort {
                            abort.abort(rank);
                        }
                        handles.push((rank, None));
                    }
                }
            }

            handles
                .into_iter()
                .map(|(rank, handle)| match handle {
                    Some(handle) => handle
                        .join()
                        .unwrap_or(Err(HashsweepError::WorkerPanicked(rank))),
                    None => Err(HashsweepError::Communication(format!(
                        "failed to start worker {rank}"
                    ))),
                })
                .collect::<Vec<_>>()
        });
        collect_reports(results)
    }
}

/// Gather per-rank results, reporting the failure that caused an abort
/// rather than the peers it released.
fn collect_reports(results: Vec<Result<WorkerReport>>) -> Result<Vec<WorkerReport>> {
    let mut reports = Vec::with_capacity(results.len());
    let mut cause = None;
    let mut aborted = None;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e @ HashsweepError::PeerAborted(_)) => {
                if aborted.is_none() {
                    aborted = Some(e);
                }
            }
            Err(e) => {
                if cause.is_none() {
                    cause = Some(e);
                }
            }
        }
    }
    match cause.or(aborted) {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}

/// Get number of CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

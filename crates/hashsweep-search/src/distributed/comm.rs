//! Message-passing substrate.
//!
//! [`Communicator`] is the small set of point-to-point and collective
//! operations the search protocol needs. [`LocalCluster`] provides it for
//! workers running as threads in one process: each rank owns its mailboxes
//! and all coordination goes through channels and a barrier, never through
//! shared search state.
//!
//! Any rank may abort the cluster. Once aborted, every pending and future
//! barrier and notice poll fails with [`HashsweepError::PeerAborted`], so a
//! failed worker cannot leave its peers blocked.

use super::messages::{FoundNotice, Rank, ROOT};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use hashsweep_core::{HashsweepError, Partition, Result};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Operations one worker can perform on the cluster.
pub trait Communicator: Send {
    /// This worker's rank.
    fn rank(&self) -> Rank;

    /// Number of workers.
    fn size(&self) -> usize;

    /// Collective: [`ROOT`] supplies one partition per rank, every rank
    /// (root included) receives its own. Blocks until the partition arrives.
    fn scatter(&self, partitions: Option<Vec<Partition>>) -> Result<Partition>;

    /// Deliver `notice` to `dest`'s cancellation mailbox.
    ///
    /// Returns once the notice has been accepted by the peer's pre-posted
    /// receive.
    fn send_notice(&self, dest: Rank, notice: &FoundNotice) -> Result<()>;

    /// Non-blocking check of this worker's cancellation mailbox.
    ///
    /// Fails once the cluster has been aborted.
    fn try_recv_notice(&self) -> Result<Option<FoundNotice>>;

    /// Collective: block until every rank has called `barrier`, or until
    /// the cluster is aborted.
    fn barrier(&self) -> Result<()>;

    /// Release every peer blocked in, or later entering, a collective.
    fn abort(&self);
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted_by: Option<Rank>,
}

/// Reusable barrier that any rank can abort.
#[derive(Debug)]
struct AbortableBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    cv: Condvar,
}

impl AbortableBarrier {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(BarrierState::default()),
            cv: Condvar::new(),
        }
    }

    /// Lock with poison recovery; a panicking rank must still be able to
    /// abort.
    fn lock_or_recover(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self) -> Result<()> {
        let mut state = self.lock_or_recover();
        if let Some(rank) = state.aborted_by {
            return Err(HashsweepError::PeerAborted(rank));
        }

        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cv.notify_all();
            return Ok(());
        }

        let generation = state.generation;
        while state.generation == generation && state.aborted_by.is_none() {
            state = self.cv.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        // a completed generation wins over a later abort
        match state.aborted_by {
            Some(rank) if state.generation == generation => Err(HashsweepError::PeerAborted(rank)),
            _ => Ok(()),
        }
    }

    fn abort(&self, rank: Rank) {
        let mut state = self.lock_or_recover();
        if state.aborted_by.is_none() {
            state.aborted_by = Some(rank);
        }
        self.cv.notify_all();
    }

    fn aborted_by(&self) -> Option<Rank> {
        self.lock_or_recover().aborted_by
    }
}

/// Aborts a [`LocalCluster`] from outside any worker, e.g. when a worker
/// thread could not be started.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    barrier: Arc<AbortableBarrier>,
}

impl AbortHandle {
    /// Abort the cluster on behalf of `rank`.
    pub fn abort(&self, rank: Rank) {
        self.barrier.abort(rank);
    }
}

/// In-process cluster of `size` communicators.
pub struct LocalCluster;

impl LocalCluster {
    /// Wire up `size` communicators, returned in rank order.
    pub fn new(size: usize) -> Result<Vec<LocalComm>> {
        if size == 0 {
            return Err(HashsweepError::Config(
                "cluster needs at least one worker".into(),
            ));
        }

        let (scatter_tx, scatter_rx): (Vec<_>, Vec<_>) =
            (0..size).map(|_| unbounded::<Partition>()).unzip();
        let (notice_tx, notice_rx): (Vec<_>, Vec<_>) =
            (0..size).map(|_| unbounded::<FoundNotice>()).unzip();
        let barrier = Arc::new(AbortableBarrier::new(size));

        // Only the root holds scatter senders, so a root that exits early
        // disconnects everyone's scatter receive instead of hanging it.
        let mut root_scatter = Some(scatter_tx);
        let comms = scatter_rx
            .into_iter()
            .zip(notice_rx)
            .enumerate()
            .map(|(rank, (scatter_rx, notice_rx))| LocalComm {
                rank,
                size,
                scatter_tx: if rank == ROOT {
                    root_scatter.take().unwrap_or_default()
                } else {
                    Vec::new()
                },
                scatter_rx,
                notice_tx: notice_tx.clone(),
                notice_rx,
                barrier: Arc::clone(&barrier),
            })
            .collect();
        Ok(comms)
    }
}

/// One rank's endpoint in a [`LocalCluster`].
pub struct LocalComm {
    rank: Rank,
    size: usize,
    scatter_tx: Vec<Sender<Partition>>,
    scatter_rx: Receiver<Partition>,
    notice_tx: Vec<Sender<FoundNotice>>,
    notice_rx: Receiver<FoundNotice>,
    barrier: Arc<AbortableBarrier>,
}

impl LocalComm {
    /// Handle that aborts this endpoint's cluster.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            barrier: Arc::clone(&self.barrier),
        }
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scatter(&self, partitions: Option<Vec<Partition>>) -> Result<Partition> {
        if self.rank == ROOT {
            let partitions = partitions.ok_or_else(|| {
                HashsweepError::Communication("root must supply partitions to scatter".into())
            })?;
            if partitions.len() != self.size || self.scatter_tx.len() != self.size {
                return Err(HashsweepError::Communication(format!(
                    "scatter of {} partitions to {} ranks",
                    partitions.len(),
                    self.size
                )));
            }
            for (dest, (tx, part)) in self.scatter_tx.iter().zip(partitions).enumerate() {
                tx.send(part).map_err(|_| {
                    HashsweepError::Communication(format!("rank {dest} left before scatter"))
                })?;
            }
        }

        self.scatter_rx.recv().map_err(|_| {
            HashsweepError::Communication(format!(
                "rank {} lost the root before receiving its partition",
                self.rank
            ))
        })
    }

    fn send_notice(&self, dest: Rank, notice: &FoundNotice) -> Result<()> {
        let tx = self.notice_tx.get(dest).ok_or_else(|| {
            HashsweepError::Communication(format!("no rank {dest} in a cluster of {}", self.size))
        })?;
        tx.send(notice.clone()).map_err(|_| {
            HashsweepError::Communication(format!("rank {dest} is no longer receiving"))
        })
    }

    fn try_recv_notice(&self) -> Result<Option<FoundNotice>> {
        if let Some(rank) = self.barrier.aborted_by() {
            return Err(HashsweepError::PeerAborted(rank));
        }
        match self.notice_rx.try_recv() {
            Ok(notice) => Ok(Some(notice)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HashsweepError::Communication(format!(
                "cancellation mailbox of rank {} disconnected",
                self.rank
            ))),
        }
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait()
    }

    fn abort(&self) {
        self.barrier.abort(self.rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cluster_ranks() {
        let comms = LocalCluster::new(3).unwrap();
        let ranks: Vec<_> = comms.iter().map(|c| (c.rank(), c.size())).collect();
        assert_eq!(ranks, vec![(0, 3), (1, 3), (2, 3)]);
        assert!(LocalCluster::new(0).is_err());
    }

    #[test]
    fn test_scatter_delivers_own_partition() {
        let comms = LocalCluster::new(3).unwrap();
        let parts = vec![
            Partition::new(0, b'a', b'b'),
            Partition::new(1, b'c', b'c'),
            Partition::empty(2),
        ];

        let received: Vec<Partition> = thread::scope(|s| {
            let handles: Vec<_> = comms
                .iter()
                .map(|comm| {
                    let parts = (comm.rank() == ROOT).then(|| parts.clone());
                    s.spawn(move || comm.scatter(parts).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(received, parts);
    }

    #[test]
    fn test_scatter_fails_when_root_leaves() {
        let mut comms = LocalCluster::new(2).unwrap();
        let worker = comms.pop().unwrap();
        drop(comms);
        assert!(matches!(
            worker.scatter(None),
            Err(HashsweepError::Communication(_))
        ));
    }

    #[test]
    fn test_notice_delivery() {
        let comms = LocalCluster::new(2).unwrap();
        let notice = FoundNotice {
            candidate: "abc".into(),
            finder: 0,
        };

        assert_eq!(comms[1].try_recv_notice().unwrap(), None);
        comms[0].send_notice(1, &notice).unwrap();
        assert_eq!(comms[1].try_recv_notice().unwrap(), Some(notice.clone()));
        assert_eq!(comms[1].try_recv_notice().unwrap(), None);
        assert!(comms[0].send_notice(7, &notice).is_err());
    }

    #[test]
    fn test_barrier_releases_all() {
        let comms = LocalCluster::new(4).unwrap();
        thread::scope(|s| {
            for comm in &comms {
                s.spawn(move || {
                    comm.barrier().unwrap();
                    comm.barrier().unwrap();
                });
            }
        });
    }

    #[test]
    fn test_abort_releases_waiting_ranks() {
        let comms = LocalCluster::new(3).unwrap();
        let results: Vec<Result<()>> = thread::scope(|s| {
            let waiters: Vec<_> = comms[1..]
                .iter()
                .map(|comm| s.spawn(move || comm.barrier()))
                .collect();
            comms[0].abort();
            waiters.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in results {
            assert!(matches!(result, Err(HashsweepError::PeerAborted(0))));
        }
    }

    #[test]
    fn test_abort_fails_later_collectives() {
        let comms = LocalCluster::new(2).unwrap();
        comms[1].abort_handle().abort(1);

        assert!(matches!(
            comms[0].barrier(),
            Err(HashsweepError::PeerAborted(1))
        ));
        assert!(matches!(
            comms[0].try_recv_notice(),
            Err(HashsweepError::PeerAborted(1))
        ));
    }
}

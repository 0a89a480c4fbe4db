//! Cross-worker cancellation.
//!
//! Every worker's cancellation mailbox exists before the search starts, so a
//! notice sent at any point is held until the receiver polls. The finder
//! fans the notice out to each peer in turn; the post-search barrier then
//! guarantees every notice has been delivered before outcomes are read.

use super::comm::Communicator;
use super::messages::FoundNotice;
use hashsweep_core::{Result, SearchOutcome};
use tracing::{debug, info};

/// Mutable per-worker search state: the stop flag and the outcome.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    stopped: bool,
    outcome: SearchOutcome,
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the search should stop at the next step.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[must_use]
    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    #[must_use]
    pub fn into_outcome(self) -> SearchOutcome {
        self.outcome
    }

    /// Stop and record `candidate` as found by `finder`, unless an outcome
    /// is already recorded. Returns whether the outcome was written.
    pub fn record(&mut self, candidate: &str, finder: usize) -> bool {
        self.stopped = true;
        if self.outcome.found {
            return false;
        }
        self.outcome = SearchOutcome::found(candidate, finder);
        true
    }
}

/// Cancellation protocol over a [`Communicator`].
pub struct CancellationChannel<'a, C: Communicator> {
    comm: &'a C,
}

impl<'a, C: Communicator> CancellationChannel<'a, C> {
    #[must_use]
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }

    /// Non-blocking poll. Drains pending notices into `state`; the first
    /// one wins. Returns whether the worker is now stopped.
    pub fn poll(&self, state: &mut SearchState) -> Result<bool> {
        while let Some(notice) = self.comm.try_recv_notice()? {
            if state.record(&notice.candidate, notice.finder) {
                debug!(
                    rank = self.comm.rank(),
                    finder = notice.finder,
                    "received cancellation notice"
                );
            }
        }
        Ok(state.is_stopped())
    }

    /// Record a local match and send the notice to every other rank.
    ///
    /// A worker that already holds a peer's notice keeps that outcome but
    /// still alerts its peers.
    pub fn notify_all(&self, state: &mut SearchState, candidate: &str) -> Result<()> {
        let rank = self.comm.rank();
        state.record(candidate, rank);
        info!(rank, "match found, notifying {} peers", self.comm.size() - 1);

        let notice = FoundNotice {
            candidate: candidate.to_string(),
            finder: rank,
        };
        for dest in (0..self.comm.size()).filter(|&dest| dest != rank) {
            self.comm.send_notice(dest, &notice)?;
        }
        Ok(())
    }
}

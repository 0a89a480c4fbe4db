//! Message types exchanged between workers.

use hashsweep_core::Partition;
use serde::{Deserialize, Serialize};

/// Index of a worker within the cluster.
pub type Rank = usize;

/// Rank that computes and scatters partitions and reports the result.
pub const ROOT: Rank = 0;

/// Cancellation notice sent by the worker that found a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundNotice {
    /// The matching candidate, without salt.
    pub candidate: String,
    /// Rank of the sender.
    pub finder: Rank,
}

/// Statistics from one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Worker rank.
    pub rank: Rank,
    /// Inclusive first-character range, if the partition is non-empty.
    pub first_chars: Option<(u8, u8)>,
    /// Candidates hashed during the real search.
    pub candidates_tested: u64,
    /// Wall-clock time from partition receipt to the final barrier.
    pub elapsed_secs: f64,
}

impl WorkerStats {
    #[must_use]
    pub fn new(partition: &Partition) -> Self {
        Self {
            rank: partition.rank,
            first_chars: partition.first_chars,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_serialization() {
        let notice = FoundNotice {
            candidate: "abca".into(),
            finder: 2,
        };
        let json = serde_json::to_string(&notice).unwrap();
        let back: FoundNotice = serde_json::from_str(&json).unwrap();
        assert_eq!(notice, back);
    }

    #[test]
    fn test_worker_stats_from_partition() {
        let stats = WorkerStats::new(&Partition::new(1, b'm', b'z'));
        assert_eq!(stats.rank, 1);
        assert_eq!(stats.first_chars, Some((b'm', b'z')));
        assert_eq!(stats.candidates_tested, 0);
    }
}

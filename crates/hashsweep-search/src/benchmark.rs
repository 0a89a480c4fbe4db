//! Running-time estimation from a timed sample search.
//!
//! Workers run their real partitions at a short, scheme-dependent candidate
//! length and meet at a barrier. The sample size over the elapsed time gives
//! a cluster-wide hash rate, which is extrapolated to the configured space.

use hashsweep_core::{HashScheme, SearchSpace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const UNITS: [(u64, &str); 5] = [
    (31_536_000, "years"),
    (86_400, "days"),
    (3_600, "hours"),
    (60, "minutes"),
    (1, "seconds"),
];

/// Number of strings of exactly `length` characters over `span` symbols.
#[must_use]
pub fn iterations_for_length(span: usize, length: usize) -> Option<u64> {
    let span = u64::try_from(span).ok()?;
    let length = u32::try_from(length).ok()?;
    span.checked_pow(length)
}

/// Number of candidates in the whole space, or `None` on `u64` overflow.
#[must_use]
pub fn total_iterations(space: &SearchSpace) -> Option<u64> {
    (space.min_length..=space.max_length).try_fold(0u64, |total, length| {
        total.checked_add(iterations_for_length(space.span(), length)?)
    })
}

/// Render a number of seconds as `1 years 2 days 3 hours ...`.
///
/// Zero-valued units are left out.
#[must_use]
pub fn human_readable(seconds: u64) -> String {
    if seconds == 0 {
        return "very fast!".to_string();
    }
    let mut remaining = seconds;
    let mut parts = Vec::new();
    for (unit, name) in UNITS {
        let count = remaining / unit;
        if count > 0 {
            parts.push(format!("{count} {name}"));
        }
        remaining %= unit;
    }
    parts.join(" ")
}

/// Estimated running time of a full search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimate {
    /// Whole seconds.
    Seconds(u64),
    /// The candidate count does not fit in a `u64`.
    Inestimable,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(0) => write!(f, "Estimated running time: {}", human_readable(0)),
            Self::Seconds(secs) => write!(
                f,
                "Estimated running time: {}\nActual time could be faster if an answer is found",
                human_readable(*secs)
            ),
            Self::Inestimable => {
                write!(f, "Unable to estimate running time. Not in our lifetimes.")
            }
        }
    }
}

/// Sample sizing and extrapolation for one configured search.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkEstimator {
    space: SearchSpace,
    scheme: HashScheme,
}

impl BenchmarkEstimator {
    #[must_use]
    pub fn new(space: SearchSpace, scheme: HashScheme) -> Self {
        Self { space, scheme }
    }

    /// The reduced space the sample run enumerates.
    #[must_use]
    pub fn sample_space(&self) -> SearchSpace {
        self.space.with_fixed_length(self.scheme.benchmark_length())
    }

    /// Candidates hashed by the sample run across all workers.
    #[must_use]
    pub fn sample_iterations(&self) -> Option<u64> {
        iterations_for_length(self.space.span(), self.scheme.benchmark_length())
    }

    /// Extrapolate the time for the real space from a sample taking
    /// `elapsed`.
    #[must_use]
    pub fn estimate(&self, elapsed: Duration) -> Estimate {
        let (Some(sample), Some(total)) = (self.sample_iterations(), total_iterations(&self.space))
        else {
            return Estimate::Inestimable;
        };
        let secs = elapsed.as_secs_f64();
        if sample == 0 || secs <= 0.0 {
            return Estimate::Seconds(0);
        }
        let rate = sample as f64 / secs;
        // saturating float-to-int cast
        Estimate::Seconds((total as f64 / rate) as u64)
    }
}

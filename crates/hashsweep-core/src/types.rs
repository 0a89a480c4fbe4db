//! Common types for hashsweep.

use crate::error::{HashsweepError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Longest candidate the generator will build.
pub const MAX_CANDIDATE_LEN: usize = 64;

/// Bounds of the candidate space: lengths and a contiguous ASCII alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Shortest candidate length (inclusive).
    pub min_length: usize,
    /// Longest candidate length (inclusive).
    pub max_length: usize,
    /// Lowest character of the alphabet.
    pub char_low: u8,
    /// Highest character of the alphabet.
    pub char_high: u8,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            min_length: 4,
            max_length: 9,
            char_low: b' ',
            char_high: b'~',
        }
    }
}

impl SearchSpace {
    /// Create a search space. Call [`SearchSpace::validate`] before use.
    #[must_use]
    pub fn new(min_length: usize, max_length: usize, char_low: u8, char_high: u8) -> Self {
        Self {
            min_length,
            max_length,
            char_low,
            char_high,
        }
    }

    /// Same alphabet, both length bounds set to `length`.
    #[must_use]
    pub fn with_fixed_length(&self, length: usize) -> Self {
        Self {
            min_length: length,
            max_length: length,
            ..*self
        }
    }

    /// Check the space invariants.
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(HashsweepError::Config("min length must be >= 1".into()));
        }
        if self.max_length < self.min_length {
            return Err(HashsweepError::Config(format!(
                "max length ({}) must be >= min length ({})",
                self.max_length, self.min_length
            )));
        }
        if self.max_length > MAX_CANDIDATE_LEN {
            return Err(HashsweepError::Config(format!(
                "max length must be <= {MAX_CANDIDATE_LEN}"
            )));
        }
        if !self.char_low.is_ascii() || !self.char_high.is_ascii() {
            return Err(HashsweepError::Config(
                "character range must be ASCII".into(),
            ));
        }
        if self.char_low > self.char_high {
            return Err(HashsweepError::Config(format!(
                "ascii start ({:?}) must not be after ascii end ({:?})",
                char::from(self.char_low),
                char::from(self.char_high)
            )));
        }
        Ok(())
    }

    /// Number of characters in the alphabet.
    #[must_use]
    pub fn span(&self) -> usize {
        usize::from(self.char_high) - usize::from(self.char_low) + 1
    }

    /// The alphabet as a byte range.
    #[must_use]
    pub fn alphabet(&self) -> RangeInclusive<u8> {
        self.char_low..=self.char_high
    }
}

/// First-character slice of the alphabet owned by one worker rank.
///
/// `first_chars` is `None` when there are more workers than characters; such
/// a worker generates nothing but still takes part in synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Owning rank.
    pub rank: usize,
    /// Inclusive `(low, high)` first-character bounds.
    pub first_chars: Option<(u8, u8)>,
}

impl Partition {
    /// A partition covering `low..=high`.
    #[must_use]
    pub fn new(rank: usize, low: u8, high: u8) -> Self {
        Self {
            rank,
            first_chars: Some((low, high)),
        }
    }

    /// A partition with no first-character work.
    #[must_use]
    pub fn empty(rank: usize) -> Self {
        Self {
            rank,
            first_chars: None,
        }
    }

    #[must_use]
    pub fn first_char_low(&self) -> Option<u8> {
        self.first_chars.map(|(low, _)| low)
    }

    #[must_use]
    pub fn first_char_high(&self) -> Option<u8> {
        self.first_chars.map(|(_, high)| high)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_chars.is_none()
    }

    /// Number of first characters owned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.first_chars
            .map_or(0, |(low, high)| usize::from(high) - usize::from(low) + 1)
    }

    #[must_use]
    pub fn range(&self) -> Option<RangeInclusive<u8>> {
        self.first_chars.map(|(low, high)| low..=high)
    }
}

/// The digest being searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDigest {
    /// Raw digest bytes for fixed-length schemes.
    Bytes(Vec<u8>),
    /// Encoded digest field for the keyed scheme.
    Encoded(String),
}

impl TargetDigest {
    /// Bytes compared against each candidate's digest.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Encoded(field) => field.as_bytes(),
        }
    }
}

/// Result of a search as seen by one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Whether any worker found a matching candidate.
    pub found: bool,
    /// The matching candidate, without any salt prefix.
    pub winning_candidate: Option<String>,
    /// Rank of the worker that found it.
    pub finder_id: Option<usize>,
}

impl SearchOutcome {
    /// Outcome for an exhausted space.
    #[must_use]
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Outcome for a match found by `finder`.
    #[must_use]
    pub fn found(candidate: impl Into<String>, finder: usize) -> Self {
        Self {
            found: true,
            winning_candidate: Some(candidate.into()),
            finder_id: Some(finder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_space() {
        let space = SearchSpace::default();
        assert!(space.validate().is_ok());
        assert_eq!(space.span(), 95);
        assert_eq!((space.min_length, space.max_length), (4, 9));
    }

    #[test]
    fn test_space_validation() {
        assert!(SearchSpace::new(0, 3, b'a', b'z').validate().is_err());
        assert!(SearchSpace::new(4, 3, b'a', b'z').validate().is_err());
        assert!(SearchSpace::new(1, 3, b'z', b'a').validate().is_err());
        assert!(SearchSpace::new(1, 65, b'a', b'z').validate().is_err());
        assert!(SearchSpace::new(1, 3, b'a', 0xc3).validate().is_err());
        assert!(SearchSpace::new(2, 2, b'x', b'x').validate().is_ok());
    }

    #[test]
    fn test_fixed_length() {
        let space = SearchSpace::new(1, 8, b'0', b'9').with_fixed_length(3);
        assert_eq!((space.min_length, space.max_length), (3, 3));
        assert_eq!(space.span(), 10);
    }

    #[test]
    fn test_partition_accessors() {
        let part = Partition::new(2, b'a', b'c');
        assert_eq!(part.len(), 3);
        assert_eq!(part.first_char_low(), Some(b'a'));
        assert_eq!(part.range(), Some(b'a'..=b'c'));

        let empty = Partition::empty(5);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.range(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = SearchOutcome::found("abca", 1);
        let json = serde_json::to_string(&outcome).unwrap();
        let back: SearchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
        assert!(json.contains("\"finder_id\":1"));
        assert!(!SearchOutcome::not_found().found);
    }
}

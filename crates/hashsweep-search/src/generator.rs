//! Candidate enumeration for one partition.
//!
//! The generator walks every full-length string whose first character lies
//! in the partition, odometer style. Shorter candidates are probed as
//! suffixes of a full-length buffer, and only when every character dropped
//! from the front is the lowest character of the alphabet. A string of
//! length `k` is therefore reached exactly once across all partitions: as the
//! suffix of `char_low^(max_length - k) ++ s`, in the partition owning
//! `char_low`.
//!
//! Generation is driven by [`CandidateGenerator::next_step`], which yields
//! either a probe (an offset into the shared buffer) or a checkpoint. A
//! checkpoint is emitted each time a subtree of the enumeration is exhausted
//! and once more at the end; callers poll for cancellation there.

use hashsweep_core::{Partition, SearchSpace};

/// One unit of generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The candidate is `generator.candidate(offset)`.
    Probe(usize),
    /// A subtree has been exhausted.
    Checkpoint,
}

/// Lazy, finite, non-restartable enumeration of a partition's candidates.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    space: SearchSpace,
    first_high: u8,
    buf: Vec<u8>,
    next_offset: Option<usize>,
    done: bool,
}

impl CandidateGenerator {
    /// Create a generator over `partition`, bounded by `space`.
    ///
    /// An empty partition, or a space that fails
    /// [`SearchSpace::validate`], yields nothing.
    #[must_use]
    pub fn new(space: SearchSpace, partition: &Partition) -> Self {
        let first_chars = partition.first_chars.filter(|_| space.validate().is_ok());
        let (buf, first_high, done) = match first_chars {
            Some((low, high)) => {
                let mut buf = vec![space.char_low; space.max_length];
                buf[0] = low;
                (buf, high, false)
            }
            None => (Vec::new(), space.char_low, true),
        };
        Self {
            space,
            first_high,
            buf,
            next_offset: Some(0),
            done,
        }
    }

    /// The candidate for a probe at `offset`.
    #[must_use]
    pub fn candidate(&self, offset: usize) -> &[u8] {
        &self.buf[offset..]
    }

    /// Whether the enumeration has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance to the next probe or checkpoint.
    pub fn next_step(&mut self) -> Option<Step> {
        if self.done {
            return None;
        }

        if let Some(offset) = self.next_offset {
            self.next_offset = self.next_suffix(offset);
            return Some(Step::Probe(offset));
        }

        if self.advance() {
            Some(Step::Checkpoint)
        } else {
            self.next_step()
        }
    }

    /// Offset of the next suffix probe for the current buffer, if allowed.
    fn next_suffix(&self, offset: usize) -> Option<usize> {
        let next = offset + 1;
        let deepest = self.space.max_length - 1;
        let shortest = self.space.max_length - self.space.min_length;
        (next <= shortest && next <= deepest && self.buf[offset] == self.space.char_low)
            .then_some(next)
    }

    /// Move the odometer to the next full-length buffer.
    ///
    /// Returns true when a subtree was exhausted (a carry happened or the
    /// enumeration ended).
    fn advance(&mut self) -> bool {
        let mut pos = self.buf.len() - 1;
        let mut carried = false;
        loop {
            let high = if pos == 0 {
                self.first_high
            } else {
                self.space.char_high
            };
            if self.buf[pos] < high {
                self.buf[pos] += 1;
                self.next_offset = Some(0);
                return carried;
            }
            if pos == 0 {
                self.done = true;
                return true;
            }
            self.buf[pos] = self.space.char_low;
            carried = true;
            pos -= 1;
        }
    }

    /// Consume the generator, yielding each candidate as an owned string.
    #[must_use]
    pub fn into_strings(self) -> Strings {
        Strings { inner: self }
    }
}

/// Owned-string view over a [`CandidateGenerator`].
#[derive(Debug, Clone)]
pub struct Strings {
    inner: CandidateGenerator,
}

impl Iterator for Strings {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.inner.next_step()? {
                Step::Probe(offset) => {
                    return Some(String::from_utf8_lossy(self.inner.candidate(offset)).into_owned())
                }
                Step::Checkpoint => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn strings(space: SearchSpace, part: Partition) -> Vec<String> {
        CandidateGenerator::new(space, &part).into_strings().collect()
    }

    /// Every string over the alphabet with a length in bounds.
    fn expected(space: &SearchSpace) -> HashSet<String> {
        let mut out = HashSet::new();
        let mut layer = vec![String::new()];
        for len in 1..=space.max_length {
            layer = layer
                .iter()
                .flat_map(|prefix| {
                    space.alphabet().map(move |c| {
                        let mut s = prefix.clone();
                        s.push(char::from(c));
                        s
                    })
                })
                .collect();
            if len >= space.min_length {
                out.extend(layer.iter().cloned());
            }
        }
        out
    }

    #[test]
    fn test_single_length_order() {
        let space = SearchSpace::new(2, 2, b'a', b'b');
        let got = strings(space, Partition::new(0, b'a', b'b'));
        assert_eq!(got, vec!["aa", "ab", "ba", "bb"]);
    }

    #[test]
    fn test_suffixes_follow_leading_minimum() {
        let space = SearchSpace::new(1, 3, b'a', b'b');
        let got = strings(space, Partition::new(0, b'a', b'a'));
        assert_eq!(
            got,
            vec!["aaa", "aa", "a", "aab", "ab", "b", "aba", "ba", "abb", "bb"]
        );
    }

    #[test]
    fn test_partition_without_low_char_has_no_short_strings() {
        let space = SearchSpace::new(1, 3, b'a', b'c');
        let got = strings(space, Partition::new(1, b'b', b'c'));
        assert_eq!(got.len(), 2 * 3 * 3);
        assert!(got.iter().all(|s| s.len() == 3));
    }

    #[test]
    fn test_empty_partition_yields_nothing() {
        let space = SearchSpace::new(1, 2, b'a', b'c');
        let mut gen = CandidateGenerator::new(space, &Partition::empty(3));
        assert!(gen.is_done());
        assert_eq!(gen.next_step(), None);
    }

    #[test]
    fn test_invalid_space_yields_nothing() {
        let whole = Partition::new(0, b'a', b'c');
        for space in [
            SearchSpace::new(0, 0, b'a', b'c'),
            SearchSpace::new(3, 2, b'a', b'c'),
        ] {
            let mut gen = CandidateGenerator::new(space, &whole);
            assert!(gen.is_done());
            assert_eq!(gen.next_step(), None);
        }
    }

    #[test]
    fn test_checkpoints_at_subtree_ends() {
        let space = SearchSpace::new(2, 2, b'a', b'c');
        let mut gen = CandidateGenerator::new(space, &Partition::new(0, b'a', b'b'));
        let mut steps = Vec::new();
        while let Some(step) = gen.next_step() {
            steps.push(step);
        }

        let checkpoints = steps.iter().filter(|s| **s == Step::Checkpoint).count();
        let probes = steps.len() - checkpoints;
        assert_eq!(probes, 6);
        // one carry from "ac" to "ba", one at exhaustion
        assert_eq!(checkpoints, 2);
        assert_eq!(steps.last(), Some(&Step::Checkpoint));
        assert!(gen.is_done());
    }

    #[test]
    fn test_single_char_alphabet() {
        let space = SearchSpace::new(1, 4, b'x', b'x');
        let got = strings(space, Partition::new(0, b'x', b'x'));
        assert_eq!(got, vec!["xxxx", "xxx", "xx", "x"]);
    }

    #[test]
    fn test_abc_scenario_covers_target() {
        let space = SearchSpace::new(4, 4, b'a', b'c');
        for workers in 1..=3 {
            let hits: usize = partition(workers, &space)
                .unwrap()
                .into_iter()
                .map(|p| strings(space, p).iter().filter(|s| *s == "abca").count())
                .sum();
            assert_eq!(hits, 1, "workers = {workers}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn union_is_exact_without_duplicates(
            min in 1usize..=3,
            extra in 0usize..=2,
            low in b'a'..=b'e',
            width in 0u8..=3,
            workers in 1usize..=6,
        ) {
            let space = SearchSpace::new(min, min + extra, low, low + width);
            let mut seen = HashSet::new();
            let mut total = 0usize;
            for part in partition(workers, &space).unwrap() {
                for s in strings(space, part) {
                    total += 1;
                    prop_assert!(seen.insert(s.clone()), "duplicate candidate {}", s);
                }
            }
            prop_assert_eq!(total, seen.len());
            prop_assert_eq!(seen, expected(&space));
        }
    }
}

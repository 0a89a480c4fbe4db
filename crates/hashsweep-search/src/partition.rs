//! Splitting the first-character range across workers.

use hashsweep_core::{HashsweepError, Partition, Result, SearchSpace};

/// Split `space`'s alphabet into `num_workers` contiguous first-character
/// ranges, one per rank in increasing order.
///
/// The first `span % num_workers` ranks get one extra character. With more
/// workers than characters the trailing ranks receive an empty partition.
pub fn partition(num_workers: usize, space: &SearchSpace) -> Result<Vec<Partition>> {
    partition_range(num_workers, space.char_low, space.char_high)
}

/// [`partition`] over an explicit `char_low..=char_high` range.
pub fn partition_range(num_workers: usize, char_low: u8, char_high: u8) -> Result<Vec<Partition>> {
    if num_workers == 0 {
        return Err(HashsweepError::Config("at least one worker is required".into()));
    }
    if char_low > char_high {
        return Err(HashsweepError::Config(format!(
            "empty character range {char_low}..={char_high}"
        )));
    }

    let span = usize::from(char_high) - usize::from(char_low) + 1;
    let base = span / num_workers;
    let remainder = span % num_workers;

    let mut next = usize::from(char_low);
    let parts = (0..num_workers)
        .map(|rank| {
            let len = base + usize::from(rank < remainder);
            if len == 0 {
                return Partition::empty(rank);
            }
            let low = next;
            let high = next + len - 1;
            next += len;
            // low..=high lies within char_low..=char_high
            Partition::new(rank, low as u8, high as u8)
        })
        .collect();
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_split() {
        let parts = partition_range(2, b'a', b'd').unwrap();
        assert_eq!(
            parts,
            vec![Partition::new(0, b'a', b'b'), Partition::new(1, b'c', b'd')]
        );
    }

    #[test]
    fn test_remainder_goes_to_low_ranks() {
        let space = SearchSpace::default();
        let parts = partition(4, &space).unwrap();
        let lens: Vec<usize> = parts.iter().map(Partition::len).collect();
        assert_eq!(lens, vec![24, 24, 24, 23]);
        assert_eq!(parts[0].first_char_low(), Some(b' '));
        assert_eq!(parts[3].first_char_high(), Some(b'~'));
    }

    #[test]
    fn test_more_workers_than_characters() {
        let parts = partition_range(5, b'a', b'b').unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], Partition::new(0, b'a', b'a'));
        assert_eq!(parts[1], Partition::new(1, b'b', b'b'));
        assert!(parts[2..].iter().all(Partition::is_empty));
        assert_eq!(parts[4].rank, 4);
    }

    #[test]
    fn test_full_byte_range() {
        let parts = partition_range(3, 0, 127).unwrap();
        assert_eq!(parts[2].first_char_high(), Some(127));
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(partition_range(0, b'a', b'z').is_err());
    }

    proptest! {
        #[test]
        fn partitions_are_contiguous_and_covering(
            low in 0u8..=126,
            width in 0u8..=100,
            workers in 1usize..=200,
        ) {
            let high = low.saturating_add(width).min(127);
            let parts = partition_range(workers, low, high).unwrap();
            prop_assert_eq!(parts.len(), workers);

            let mut expected_next = usize::from(low);
            for (rank, part) in parts.iter().enumerate() {
                prop_assert_eq!(part.rank, rank);
                if let Some((lo, hi)) = part.first_chars {
                    prop_assert_eq!(usize::from(lo), expected_next);
                    prop_assert!(lo <= hi);
                    expected_next = usize::from(hi) + 1;
                }
            }
            prop_assert_eq!(expected_next, usize::from(high) + 1);

            let lens: Vec<usize> = parts.iter().map(Partition::len).collect();
            let max = lens.iter().copied().max().unwrap_or(0);
            let min = lens.iter().copied().min().unwrap_or(0);
            prop_assert!(max - min <= 1);
        }
    }
}

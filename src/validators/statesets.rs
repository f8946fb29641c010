//! Position bitsets
//!
//! A [`StateSet`] is a set of leaf positions. It is both the first/last/follow
//! set type of the position analysis and the identity of an automaton state:
//! two states are the same state iff their bitsets are equal.

use std::fmt;

/// Index of a positioned leaf, dense from 0
pub type Position = usize;

const WORD_BITS: usize = 64;

/// Fixed-capacity bitset over the position space
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct StateSet {
    words: Vec<u64>,
}

impl StateSet {
    /// Empty set able to hold positions `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
        }
    }

    /// Set holding a single position
    pub fn singleton(capacity: usize, position: Position) -> Self {
        let mut set = Self::with_capacity(capacity);
        set.insert(position);
        set
    }

    /// Add a position
    pub fn insert(&mut self, position: Position) {
        self.words[position / WORD_BITS] |= 1u64 << (position % WORD_BITS);
    }

    /// Check membership
    pub fn contains(&self, position: Position) -> bool {
        self.words
            .get(position / WORD_BITS)
            .is_some_and(|word| word & (1u64 << (position % WORD_BITS)) != 0)
    }

    /// In-place union
    pub fn union_with(&mut self, other: &StateSet) {
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word |= other;
        }
    }

    /// Check whether the two sets share a position
    pub fn intersects(&self, other: &StateSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Check whether the set has no positions
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Number of positions in the set
    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.words.iter().enumerate().flat_map(|(index, word)| {
            let mut bits = *word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(index * WORD_BITS + bit)
            })
        })
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = StateSet::with_capacity(130);
        assert!(set.is_empty());
        set.insert(0);
        set.insert(64);
        set.insert(129);
        assert!(set.contains(64));
        assert!(!set.contains(63));
        assert!(!set.contains(500));
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
    }

    #[test]
    fn test_union_and_intersects() {
        let mut a = StateSet::singleton(10, 1);
        let b = StateSet::singleton(10, 7);
        assert!(!a.intersects(&b));
        a.union_with(&b);
        assert!(a.intersects(&b));
        assert_eq!(format!("{:?}", a), "{1, 7}");
    }

    #[test]
    fn test_equality_is_structural() {
        let mut a = StateSet::with_capacity(70);
        let mut b = StateSet::with_capacity(70);
        a.insert(3);
        a.insert(66);
        b.insert(66);
        b.insert(3);
        assert_eq!(a, b);

        let mut seen = std::collections::HashMap::new();
        seen.insert(a, 0);
        assert_eq!(seen.get(&b), Some(&0));
    }

    #[test]
    fn test_zero_capacity() {
        let set = StateSet::with_capacity(0);
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the randomness used for question selection and phrasing.
///
/// Swappable so tests can drive the engine with a known sequence.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..upper`. `upper` is never zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// Picks `count` distinct indices from `0..len` (partial Fisher-Yates).
pub fn sample_indices(rng: &mut dyn RandomSource, len: usize, count: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..len).collect();
    let count = count.min(len);
    for i in 0..count {
        let j = i + rng.next_index(len - i);
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}

pub fn shuffle<T>(rng: &mut dyn RandomSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

pub fn choose<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.next_index(items.len()))
}

#[derive(Debug)]
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed cycle of values, each reduced modulo the requested bound.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<usize>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, pos: 0 }
    }

    /// Always returns 0: samples keep catalog order, shuffles are a fixed permutation.
    pub fn zeros() -> Self {
        Self::new(vec![0])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_indices_are_distinct_and_in_range() {
        let mut rng = ThreadRandom::seeded(7);
        for _ in 0..50 {
            let picked = sample_indices(&mut rng, 12, 8);
            assert_eq!(picked.len(), 8);
            let unique: HashSet<_> = picked.iter().copied().collect();
            assert_eq!(unique.len(), 8);
            assert!(picked.iter().all(|i| *i < 12));
        }
    }

    #[test]
    fn sample_caps_count_at_len() {
        let mut rng = ScriptedRandom::zeros();
        assert_eq!(sample_indices(&mut rng, 3, 10), vec![0, 1, 2]);
    }

    #[test]
    fn shuffle_keeps_every_item() {
        let mut rng = ThreadRandom::seeded(42);
        let mut items: Vec<u32> = (0..10).collect();
        shuffle(&mut rng, &mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn scripted_cycles_values() {
        let mut rng = ScriptedRandom::new(vec![1, 5]);
        assert_eq!(rng.next_index(4), 1);
        assert_eq!(rng.next_index(4), 1);
        assert_eq!(rng.next_index(10), 1);
        assert_eq!(choose(&mut rng, &["a", "b", "c"]), Some(&"c"));
        let empty: [&str; 0] = [];
        assert_eq!(choose(&mut rng, &empty), None);
    }
}

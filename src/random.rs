//! Injected randomness.
//!
//! The engine only needs "next float in [0, 1)": tie-break jitter and the
//! visitation order of unassigned members. Production code wraps a
//! `rand` generator; tests can pin exact outputs with [`SequenceSource`].

use rand::rngs::{SmallRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Adapter from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<ThreadRng> {
    /// Process-wide thread-local generator, no seeding contract.
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl RngSource<SmallRng> {
    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Replays a fixed list of values, cycling when exhausted.
///
/// An empty list behaves as a constant `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// Creates a source from the given values (each clamped into `[0, 1)`).
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect(),
            cursor: 0,
        }
    }

    /// A source that always returns `0.0`.
    pub fn zeros() -> Self {
        Self::default()
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

/// In-place Fisher–Yates shuffle driven by `rng`.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = ((rng.next_unit() * (i + 1) as f64) as usize).min(i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RngSource::seeded(7);
        let mut b = RngSource::seeded(7);
        for _ in 0..16 {
            let x = a.next_unit();
            assert_eq!(x, b.next_unit());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_sequence_source_cycles() {
        let mut s = SequenceSource::new([0.25, 0.5]);
        assert_eq!(s.next_unit(), 0.25);
        assert_eq!(s.next_unit(), 0.5);
        assert_eq!(s.next_unit(), 0.25);

        let mut z = SequenceSource::zeros();
        assert_eq!(z.next_unit(), 0.0);
    }

    #[test]
    fn test_sequence_source_clamps() {
        let mut s = SequenceSource::new([1.5, -1.0]);
        assert!(s.next_unit() < 1.0);
        assert_eq!(s.next_unit(), 0.0);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut items = vec![1, 2, 3, 4, 5];
        let mut rng = RngSource::seeded(42);
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_shuffle_with_zeros_rotates_deterministically() {
        // j is always 0: each step swaps the tail element to the front.
        let mut items = vec!['a', 'b', 'c'];
        shuffle(&mut items, &mut SequenceSource::zeros());
        assert_eq!(items, vec!['b', 'c', 'a']);
    }
}

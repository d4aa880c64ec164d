use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

/// Thread-local RNG; the default for real play.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible RNG for a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, then repeats the last one.
///
/// Draws are clamped into `[0, 1)`.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    draws: VecDeque<f64>,
    last: f64,
}

impl SequenceRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            last: 0.0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if let Some(draw) = self.draws.pop_front() {
            self.last = draw.clamp(0.0, 1.0 - f64::EPSILON);
        }
        self.last
    }
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub fn pick_index(rng: &mut dyn RandomSource, len: usize) -> usize {
    let index = (rng.next_f64() * len as f64) as usize;
    index.min(len.saturating_sub(1))
}

/// True with probability `p`.
pub fn chance(rng: &mut dyn RandomSource, p: f64) -> bool {
    rng.next_f64() < p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_replays_then_sticks() {
        let mut rng = SequenceRandom::new([0.25, 0.5]);
        assert_eq!(rng.next_f64(), 0.25);
        assert_eq!(rng.next_f64(), 0.5);
        assert_eq!(rng.next_f64(), 0.5);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_pick_index_bounds() {
        let mut rng = SequenceRandom::new([0.0, 0.999_999, 1.0, 0.5]);
        assert_eq!(pick_index(&mut rng, 6), 0);
        assert_eq!(pick_index(&mut rng, 6), 5);
        assert_eq!(pick_index(&mut rng, 6), 5);
        assert_eq!(pick_index(&mut rng, 6), 3);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        for _ in 0..10 {
            let draw = a.next_f64();
            assert!((0.0..1.0).contains(&draw));
            assert_eq!(draw, b.next_f64());
        }
    }
}

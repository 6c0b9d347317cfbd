//! Randomness for percentage bucket draws.

use rand::Rng;

/// Source of the uniform draw used for a first bucket assignment.
pub trait RandomSource: Send + Sync {
    /// A uniformly distributed value in `[0, 100)`.
    fn roll_percent(&self) -> f64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll_percent(&self) -> f64 {
        rand::rng().random_range(0.0..100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..1_000 {
            let r = random.roll_percent();
            assert!((0.0..100.0).contains(&r));
        }
    }
}

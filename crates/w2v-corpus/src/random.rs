use std::fmt;

use rand::SeedableRng;
use rand::distr::uniform::SampleUniform;
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use thiserror::Error;

pub const DEFAULT_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, Error, Eq, PartialEq)]
pub enum RandomError {
    #[error("lower bound exceeds upper bound")]
    InvertedBounds,
    #[error("buffer size must be positive")]
    EmptyBuffer,
}

/// Uniform integers in `[low, high]` served from a refillable buffer.
///
/// The buffer is filled on construction and refilled in place once every
/// value has been handed out. Drawing needs `&mut self`; share one generator
/// between threads only behind a lock.
pub struct BoundedRandomInt<T: SampleUniform> {
    low: T,
    high: T,
    dist: Uniform<T>,
    rng: StdRng,
    buffer: Vec<T>,
    cursor: usize,
}

impl<T> BoundedRandomInt<T>
where
    T: SampleUniform + PartialOrd + Copy,
{
    /// Generator seeded from the operating system.
    pub fn new(low: T, high: T, buffer_size: usize) -> Result<Self, RandomError> {
        Self::from_rng(low, high, buffer_size, StdRng::from_os_rng())
    }

    /// Generator producing the same sequence for the same seed.
    pub fn with_seed(
        low: T,
        high: T,
        buffer_size: usize,
        seed: u64,
    ) -> Result<Self, RandomError> {
        Self::from_rng(low, high, buffer_size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(
        low: T,
        high: T,
        buffer_size: usize,
        mut rng: StdRng,
    ) -> Result<Self, RandomError> {
        if low > high {
            return Err(RandomError::InvertedBounds);
        }
        if buffer_size == 0 {
            return Err(RandomError::EmptyBuffer);
        }
        let dist = Uniform::new_inclusive(low, high).map_err(|_| RandomError::InvertedBounds)?;
        let buffer = (0..buffer_size).map(|_| dist.sample(&mut rng)).collect();
        Ok(Self {
            low,
            high,
            dist,
            rng,
            buffer,
            cursor: 0,
        })
    }

    /// Next buffered value, refilling the buffer when it runs out.
    pub fn draw(&mut self) -> T {
        if self.cursor == self.buffer.len() {
            self.refill();
        }
        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }

    pub fn bounds(&self) -> (T, T) {
        (self.low, self.high)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    fn refill(&mut self) {
        for slot in self.buffer.iter_mut() {
            *slot = self.dist.sample(&mut self.rng);
        }
        self.cursor = 0;
    }
}

impl<T> Iterator for BoundedRandomInt<T>
where
    T: SampleUniform + PartialOrd + Copy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.draw())
    }
}

impl<T> fmt::Debug for BoundedRandomInt<T>
where
    T: SampleUniform + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRandomInt")
            .field("low", &self.low)
            .field("high", &self.high)
            .field("buffer_size", &self.buffer.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_within_bounds_across_refills() {
        let mut generator = BoundedRandomInt::with_seed(1usize, 5, 7, 42).unwrap();
        for _ in 0..1000 {
            let v = generator.draw();
            assert!((1..=5).contains(&v), "{v} out of range");
        }
        assert_eq!(generator.buffer_size(), 7);
    }

    #[test]
    fn negative_ranges_work() {
        let generator = BoundedRandomInt::with_seed(-3i64, -1, 16, 9).unwrap();
        assert!(generator.take(200).all(|v| (-3..=-1).contains(&v)));
    }

    #[test]
    fn distribution_is_roughly_uniform() {
        let mut generator = BoundedRandomInt::new(1u32, 6, DEFAULT_BUFFER_SIZE).unwrap();
        let mut buckets = [0u32; 6];
        let samples = 60_000;
        for _ in 0..samples {
            buckets[(generator.draw() - 1) as usize] += 1;
        }
        let expected = samples / 6;
        for (face, &count) in buckets.iter().enumerate() {
            let deviation = count.abs_diff(expected);
            assert!(
                deviation < expected / 10,
                "value {} drawn {count} times, expected about {expected}",
                face + 1
            );
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let generator = BoundedRandomInt::with_seed(3usize, 3, 2, 0).unwrap();
        assert!(generator.take(10).all(|v| v == 3));
    }

    #[test]
    fn same_seed_same_sequence() {
        let a: Vec<usize> = BoundedRandomInt::with_seed(1, 10, 4, 7)
            .unwrap()
            .take(50)
            .collect();
        let b: Vec<usize> = BoundedRandomInt::with_seed(1, 10, 4, 7)
            .unwrap()
            .take(50)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_construction() {
        assert_eq!(
            BoundedRandomInt::new(5usize, 1, 10).unwrap_err(),
            RandomError::InvertedBounds
        );
        assert_eq!(
            BoundedRandomInt::new(1usize, 5, 0).unwrap_err(),
            RandomError::EmptyBuffer
        );
    }
}

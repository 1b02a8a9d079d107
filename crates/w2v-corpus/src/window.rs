use std::collections::BTreeSet;

use crate::error::ReaderError;
use crate::random::BoundedRandomInt;

/// Words within `radius` positions of `idx`, excluding `idx` itself.
///
/// Positions outside the sequence are clipped. Duplicates collapse, so the
/// result may hold fewer than `2 * radius` words even away from the edges.
/// Callers must not rely on the set's ordering.
pub fn context_window<T: Ord + Clone>(words: &[T], idx: usize, radius: usize) -> BTreeSet<T> {
    if idx >= words.len() {
        return BTreeSet::new();
    }
    let start = idx.saturating_sub(radius);
    let end = idx.saturating_add(radius).min(words.len() - 1);
    words[start..idx]
        .iter()
        .chain(&words[idx + 1..end + 1])
        .cloned()
        .collect()
}

/// Context selection with a radius drawn uniformly from `1..=window_size`.
#[derive(Debug)]
pub struct ContextSampler {
    window_size: usize,
    radius: BoundedRandomInt<usize>,
}

impl ContextSampler {
    pub fn new(
        window_size: usize,
        buffer_size: usize,
        seed: Option<u64>,
    ) -> Result<Self, ReaderError> {
        if window_size == 0 {
            return Err(ReaderError::InvalidWindow);
        }
        let radius = match seed {
            Some(seed) => BoundedRandomInt::with_seed(1, window_size, buffer_size, seed)?,
            None => BoundedRandomInt::new(1, window_size, buffer_size)?,
        };
        Ok(Self {
            window_size,
            radius,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn draw_radius(&mut self) -> usize {
        self.radius.draw()
    }

    /// Draw a radius and return the context of `words[idx]`.
    pub fn context_words<T: Ord + Clone>(&mut self, words: &[T], idx: usize) -> BTreeSet<T> {
        let radius = self.draw_radius();
        context_window(words, idx, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: [&str; 5] = ["a", "b", "c", "d", "e"];

    #[test]
    fn radius_one_takes_neighbours() {
        assert_eq!(context_window(&WORDS, 2, 1), BTreeSet::from(["b", "d"]));
    }

    #[test]
    fn wide_radius_is_clipped() {
        assert_eq!(
            context_window(&WORDS, 2, 3),
            BTreeSet::from(["a", "b", "d", "e"])
        );
    }

    #[test]
    fn edges_never_leave_the_sequence() {
        assert_eq!(context_window(&WORDS, 0, 2), BTreeSet::from(["b", "c"]));
        assert_eq!(context_window(&WORDS, 4, 2), BTreeSet::from(["c", "d"]));
        assert_eq!(
            context_window(&WORDS, 4, usize::MAX),
            BTreeSet::from(["a", "b", "c", "d"])
        );
    }

    #[test]
    fn degenerate_inputs_are_empty() {
        assert!(context_window(&["solo"], 0, 5).is_empty());
        assert!(context_window(&WORDS, 2, 0).is_empty());
        assert!(context_window(&WORDS, 9, 1).is_empty());
        assert!(context_window::<u32>(&[], 0, 1).is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let words = [7u32, 7, 1, 7];
        assert_eq!(context_window(&words, 2, 2), BTreeSet::from([7]));
    }

    #[test]
    fn sampled_windows_respect_window_size() {
        let words: Vec<usize> = (0..50).collect();
        let mut sampler = ContextSampler::new(3, 8, Some(11)).unwrap();
        let mut widest = 0;
        for idx in 0..words.len() {
            let context = sampler.context_words(&words, idx);
            assert!(!context.is_empty());
            assert!(!context.contains(&idx));
            for &other in &context {
                widest = widest.max(other.abs_diff(idx));
            }
        }
        assert!(widest <= 3);
    }

    #[test]
    fn radius_covers_the_whole_window() {
        let mut sampler = ContextSampler::new(4, 16, Some(23)).unwrap();
        assert_eq!(sampler.radius.bounds(), (1, 4));
        let mut seen = BTreeSet::new();
        for _ in 0..2_000 {
            let radius = sampler.draw_radius();
            assert!((1..=4).contains(&radius), "radius {radius} outside 1..=4");
            seen.insert(radius);
        }
        assert_eq!(seen, BTreeSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(
            ContextSampler::new(0, 10, None),
            Err(ReaderError::InvalidWindow)
        ));
        assert!(matches!(
            ContextSampler::new(2, 0, None),
            Err(ReaderError::Random(_))
        ));
    }
}

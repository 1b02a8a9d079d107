//! Shared types passed between the vocabulary loader and the corpus reader.
//!
//! Ids are dense and zero-based in dictionary file order. Training samples
//! mirror the shapes a skip-gram trainer feeds on: a target id and a context
//! id, and in hierarchical-softmax mode the context word's Huffman code and
//! path borrowed from the loaded tables.
//!
//! ```rust
//! use w2v_types::{SkipGramPair, TrainerShard, WordId};
//!
//! let shard = TrainerShard { trainer_id: 1, trainer_num: 2 };
//! assert!(shard.owns_line(1));
//! assert!(!shard.owns_line(2));
//!
//! let pair = SkipGramPair { target: WordId(0), context: WordId(3) };
//! assert_eq!(pair.as_slots(), ([WordId(0)], [WordId(3)]));
//! ```

use std::fmt;

/// Dense vocabulary id, assigned in dictionary file order starting at 0.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WordId(pub u32);

impl WordId {
    /// Position of this id in id-indexed tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which lines of each corpus file one trainer consumes.
///
/// Line counters are 1-based; line `n` belongs to the shard when
/// `n % trainer_num == trainer_id`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TrainerShard {
    pub trainer_id: u32,
    pub trainer_num: u32,
}

impl TrainerShard {
    /// A single trainer that owns every line.
    pub const SOLO: TrainerShard = TrainerShard {
        trainer_id: 0,
        trainer_num: 1,
    };

    /// `trainer_num` is positive and `trainer_id` falls inside it.
    pub fn is_valid(self) -> bool {
        self.trainer_num > 0 && self.trainer_id < self.trainer_num
    }

    /// Whether the 1-based `line_number` is assigned to this shard.
    pub fn owns_line(self, line_number: u64) -> bool {
        self.trainer_num != 0
            && line_number % u64::from(self.trainer_num) == u64::from(self.trainer_id)
    }
}

impl Default for TrainerShard {
    fn default() -> Self {
        TrainerShard::SOLO
    }
}

impl fmt::Display for TrainerShard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trainer_id, self.trainer_num)
    }
}

/// One positive skip-gram example.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SkipGramPair {
    pub target: WordId,
    pub context: WordId,
}

impl SkipGramPair {
    /// Singleton-sequence shape consumed by the trainer feed.
    pub fn as_slots(&self) -> ([WordId; 1], [WordId; 1]) {
        ([self.target], [self.context])
    }
}

/// A skip-gram example decorated with the context word's Huffman encoding.
///
/// `path` keeps the table entry verbatim, so its first element is the
/// non-leaf count marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HsSample<'a> {
    pub target: WordId,
    pub context: WordId,
    pub code: &'a [i64],
    pub path: &'a [i64],
}

impl<'a> HsSample<'a> {
    pub fn pair(&self) -> SkipGramPair {
        SkipGramPair {
            target: self.target,
            context: self.context,
        }
    }

    /// `(target, context, code, path)` in the trainer feed shape.
    pub fn as_slots(&self) -> ([WordId; 1], [WordId; 1], &'a [i64], &'a [i64]) {
        ([self.target], [self.context], self.code, self.path)
    }
}

/// Item produced by a stream chosen at call time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrainingSample<'a> {
    Pair(SkipGramPair),
    Hs(HsSample<'a>),
}

impl TrainingSample<'_> {
    pub fn pair(&self) -> SkipGramPair {
        match self {
            TrainingSample::Pair(pair) => *pair,
            TrainingSample::Hs(sample) => sample.pair(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shards_partition_lines() {
        let trainer_num = 3;
        for line in 1..=30u64 {
            let owners = (0..trainer_num)
                .filter(|&trainer_id| {
                    TrainerShard {
                        trainer_id,
                        trainer_num,
                    }
                    .owns_line(line)
                })
                .count();
            assert_eq!(owners, 1, "line {line} owned {owners} times");
        }
    }

    #[test]
    fn solo_shard_owns_everything() {
        assert!((1..100).all(|n| TrainerShard::SOLO.owns_line(n)));
        assert!(TrainerShard::SOLO.is_valid());
    }

    #[test]
    fn rejects_out_of_range_shards() {
        assert!(
            !TrainerShard {
                trainer_id: 2,
                trainer_num: 2
            }
            .is_valid()
        );
        let empty = TrainerShard {
            trainer_id: 0,
            trainer_num: 0,
        };
        assert!(!empty.is_valid());
        assert!(!empty.owns_line(1));
    }

    #[test]
    fn hs_sample_exposes_pair() {
        let code = [1, 0];
        let path = [2, 0, 1];
        let sample = HsSample {
            target: WordId(4),
            context: WordId(1),
            code: &code,
            path: &path,
        };
        assert_eq!(
            TrainingSample::Hs(sample).pair(),
            SkipGramPair {
                target: WordId(4),
                context: WordId(1)
            }
        );
        assert_eq!(sample.as_slots().3, &[2, 0, 1]);
    }
}

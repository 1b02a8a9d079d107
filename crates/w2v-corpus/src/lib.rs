//! Skip-gram training pairs streamed from sharded text corpora.
//!
//! A [`CorpusReader`] is built once per trainer shard. It loads the
//! vocabulary (and, optionally, the hierarchical-softmax path/code tables),
//! then hands out lazy, single-pass streams over its corpus files:
//!
//! 1. Every line whose 1-based number `n` satisfies
//!    `n % trainer_num == trainer_id` is normalized and split into tokens.
//! 2. Tokens outside the vocabulary are dropped before windowing.
//! 3. For each remaining position a radius `r` is drawn uniformly from
//!    `1..=window_size` and one pair is emitted per distinct word within `r`
//!    positions.
//!
//! Radii come from a [`BoundedRandomInt`], which amortizes RNG calls through
//! a refillable buffer.
//!
//! # Example
//! ```no_run
//! use w2v_corpus::{CorpusReader, ReaderConfig};
//!
//! # fn main() -> Result<(), w2v_corpus::ReaderError> {
//! let config = ReaderConfig::new("data/1-billion_dict")
//!     .data_dir("data/shuffled")
//!     .files(["news.en-00001-of-00100"])
//!     .sibling_hs_tables()
//!     .shard(0, 1)
//!     .window_size(5);
//! let mut reader = CorpusReader::open(config)?;
//!
//! for sample in reader.train(true)? {
//!     let sample = sample?;
//!     let pair = sample.pair();
//!     println!("{} -> {}", pair.target, pair.context);
//! }
//! # Ok(()) }
//! ```

pub mod error;
pub mod random;
pub mod reader;
pub mod stream;
pub mod window;

pub use error::ReaderError;
pub use random::{BoundedRandomInt, DEFAULT_BUFFER_SIZE, RandomError};
pub use reader::{CorpusReader, DEFAULT_WINDOW_SIZE, HsSource, ReaderConfig};
pub use stream::{HsStream, PairStream, TrainingStream};
pub use window::{ContextSampler, context_window};

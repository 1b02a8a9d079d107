//! Facade over the reader workspace plus the summary the driver prints.

pub mod summary;

pub use summary::{SampleRecord, StreamSummary, summarize};
pub use w2v_corpus::{
    BoundedRandomInt, CorpusReader, HsSource, ReaderConfig, ReaderError, TrainingStream,
};
pub use w2v_text::{Normalize, Passthrough, TextStrip};
pub use w2v_types::{HsSample, SkipGramPair, TrainerShard, TrainingSample, WordId};
pub use w2v_vocab::{HsTables, LoadMode, Vocabulary};

pub use w2v_corpus as corpus;
pub use w2v_text as text;
pub use w2v_types as types;
pub use w2v_vocab as vocab;

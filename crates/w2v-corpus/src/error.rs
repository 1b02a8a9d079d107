use std::io;
use std::path::PathBuf;

use thiserror::Error;
use w2v_types::WordId;
use w2v_vocab::HsTable;

use crate::random::RandomError;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("trainer_id {trainer_id} must be below trainer_num {trainer_num}")]
    InvalidShard { trainer_id: u32, trainer_num: u32 },
    #[error("window_size must be positive")]
    InvalidWindow,
    #[error("invalid radius generator: {0}")]
    Random(#[from] RandomError),
    #[error(transparent)]
    Metadata(#[from] anyhow::Error),
    #[error("hierarchical softmax requested but no path/code tables were loaded")]
    HsTablesUnavailable,
    #[error("word {word:?} has no hierarchical softmax {table} entry")]
    MissingHsEntry { word: String, table: HsTable },
    #[error("word id {0} is not in the dictionary")]
    UnknownWordId(WordId),
    #[error("failed to open corpus file {}: {source}", .path.display())]
    OpenCorpus {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line} of {}: {source}", .path.display())]
    ReadCorpus {
        path: PathBuf,
        line: u64,
        #[source]
        source: io::Error,
    },
}

use std::collections::HashSet;

use serde::Serialize;
use w2v_corpus::{CorpusReader, ReaderError};
use w2v_text::Normalize;
use w2v_types::{SkipGramPair, TrainingSample, WordId};
use w2v_vocab::Vocabulary;

/// One streamed sample with ids resolved back to words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    pub target: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<i64>>,
}

/// What a single pass over one shard produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub dict_size: usize,
    pub total_count: u64,
    pub trainer_id: u32,
    pub trainer_num: u32,
    pub window_size: usize,
    pub files: usize,
    pub hs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_non_leaf: Option<i64>,
    pub samples: u64,
    pub distinct_targets: usize,
    pub distinct_contexts: usize,
    pub truncated: bool,
    pub preview: Vec<SampleRecord>,
}

/// Stream one pass and tally it.
///
/// Stops after `limit` samples when given. The first `preview` samples are
/// kept verbatim.
pub fn summarize<N: Normalize>(
    reader: &mut CorpusReader<N>,
    with_hs: bool,
    limit: Option<u64>,
    preview: usize,
) -> Result<StreamSummary, ReaderError> {
    let num_non_leaf = reader.hs_tables().and_then(|tables| tables.num_non_leaf());
    let shard = reader.shard();
    let window_size = reader.window_size();
    let files = reader.files().len();

    let mut samples = 0u64;
    let mut targets = HashSet::new();
    let mut contexts = HashSet::new();
    let mut kept = Vec::with_capacity(preview);
    let mut truncated = false;

    for sample in reader.train(with_hs)? {
        if limit.is_some_and(|limit| samples >= limit) {
            truncated = true;
            break;
        }
        let sample = sample?;
        let pair = sample.pair();
        targets.insert(pair.target);
        contexts.insert(pair.context);
        if kept.len() < preview {
            kept.push(detach(&sample));
        }
        samples += 1;
    }

    let vocab = reader.vocabulary();
    let preview: Vec<SampleRecord> = kept
        .into_iter()
        .map(|(pair, code, path)| record(vocab, pair, code, path))
        .collect::<Result<_, ReaderError>>()?;

    Ok(StreamSummary {
        dict_size: vocab.len(),
        total_count: vocab.total_count(),
        trainer_id: shard.trainer_id,
        trainer_num: shard.trainer_num,
        window_size,
        files,
        hs: with_hs,
        num_non_leaf: if with_hs { num_non_leaf } else { None },
        samples,
        distinct_targets: targets.len(),
        distinct_contexts: contexts.len(),
        truncated,
        preview,
    })
}

type Detached = (SkipGramPair, Option<Vec<i64>>, Option<Vec<i64>>);

fn detach(sample: &TrainingSample<'_>) -> Detached {
    match sample {
        TrainingSample::Pair(pair) => (*pair, None, None),
        TrainingSample::Hs(hs) => (hs.pair(), Some(hs.code.to_vec()), Some(hs.path.to_vec())),
    }
}

fn record(
    vocab: &Vocabulary,
    pair: SkipGramPair,
    code: Option<Vec<i64>>,
    path: Option<Vec<i64>>,
) -> Result<SampleRecord, ReaderError> {
    let word = |id: WordId| {
        vocab
            .word(id)
            .map(str::to_string)
            .ok_or(ReaderError::UnknownWordId(id))
    };
    Ok(SampleRecord {
        target: word(pair.target)?,
        context: word(pair.context)?,
        code,
        path,
    })
}

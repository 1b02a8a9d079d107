use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{Span, debug, info_span};
use w2v_text::{Normalize, TextStrip};
use w2v_types::TrainerShard;
use w2v_vocab::{HsTables, LoadMode, Vocabulary, WORD_TO_ID_SUFFIX, sibling_path};

use crate::error::ReaderError;
use crate::random::DEFAULT_BUFFER_SIZE;
use crate::stream::{HsStream, LineSource, PairStream, TrainingStream};
use crate::window::ContextSampler;

pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Where hierarchical-softmax tables come from, if anywhere.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum HsSource {
    #[default]
    None,
    Files {
        path_table: PathBuf,
        code_table: PathBuf,
    },
    /// `<dict>_ptable` and `<dict>_pcode`.
    Siblings,
}

#[derive(Clone, Debug)]
pub struct ReaderConfig {
    pub dict_path: PathBuf,
    pub hs_source: HsSource,
    /// Directory each entry of `files` is resolved against.
    pub data_dir: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    pub shard: TrainerShard,
    pub window_size: usize,
    pub random_buffer_size: usize,
    pub seed: Option<u64>,
    pub load_mode: LoadMode,
    /// Write `<dict>_word_to_id_` while loading.
    pub write_word_to_id: bool,
}

impl ReaderConfig {
    pub fn new(dict_path: impl Into<PathBuf>) -> Self {
        Self {
            dict_path: dict_path.into(),
            hs_source: HsSource::None,
            data_dir: None,
            files: Vec::new(),
            shard: TrainerShard::SOLO,
            window_size: DEFAULT_WINDOW_SIZE,
            random_buffer_size: DEFAULT_BUFFER_SIZE,
            seed: None,
            load_mode: LoadMode::Mmap,
            write_word_to_id: true,
        }
    }

    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn hs_tables(
        mut self,
        path_table: impl Into<PathBuf>,
        code_table: impl Into<PathBuf>,
    ) -> Self {
        self.hs_source = HsSource::Files {
            path_table: path_table.into(),
            code_table: code_table.into(),
        };
        self
    }

    pub fn sibling_hs_tables(mut self) -> Self {
        self.hs_source = HsSource::Siblings;
        self
    }

    pub fn shard(mut self, trainer_id: u32, trainer_num: u32) -> Self {
        self.shard = TrainerShard {
            trainer_id,
            trainer_num,
        };
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn random_buffer_size(mut self, size: usize) -> Self {
        self.random_buffer_size = size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    pub fn write_word_to_id(mut self, enabled: bool) -> Self {
        self.write_word_to_id = enabled;
        self
    }

    fn resolved_files(&self) -> Vec<PathBuf> {
        match &self.data_dir {
            Some(dir) => self.files.iter().map(|file| dir.join(file)).collect(),
            None => self.files.clone(),
        }
    }
}

/// Streams skip-gram training pairs for one trainer shard.
///
/// All metadata is loaded by the constructor. Each call to [`pairs`],
/// [`hs_samples`] or [`train`] starts a fresh pass over the file list; the
/// radius generator keeps its state across passes.
///
/// [`pairs`]: CorpusReader::pairs
/// [`hs_samples`]: CorpusReader::hs_samples
/// [`train`]: CorpusReader::train
pub struct CorpusReader<N = TextStrip> {
    vocab: Vocabulary,
    hs: Option<HsTables>,
    sampler: ContextSampler,
    files: Vec<PathBuf>,
    shard: TrainerShard,
    normalizer: N,
    span: Span,
}

impl CorpusReader<TextStrip> {
    /// Open a reader that normalizes lines with [`TextStrip`].
    pub fn open(config: ReaderConfig) -> Result<Self, ReaderError> {
        Self::with_normalizer(config, TextStrip)
    }
}

impl<N: Normalize> CorpusReader<N> {
    pub fn with_normalizer(config: ReaderConfig, normalizer: N) -> Result<Self, ReaderError> {
        let shard = config.shard;
        if !shard.is_valid() {
            return Err(ReaderError::InvalidShard {
                trainer_id: shard.trainer_id,
                trainer_num: shard.trainer_num,
            });
        }
        let sampler =
            ContextSampler::new(config.window_size, config.random_buffer_size, config.seed)?;

        let vocab = Vocabulary::load_with_mode(&config.dict_path, config.load_mode)?;
        if config.write_word_to_id {
            vocab.write_word_to_id(sibling_path(&config.dict_path, WORD_TO_ID_SUFFIX))?;
        }

        let hs = match &config.hs_source {
            HsSource::None => None,
            HsSource::Files {
                path_table,
                code_table,
            } => Some(HsTables::load(path_table, code_table, config.load_mode)?),
            HsSource::Siblings => Some(HsTables::load_siblings(
                &config.dict_path,
                config.load_mode,
            )?),
        };

        let files = config.resolved_files();
        let span = info_span!(
            "corpus_reader",
            trainer_id = shard.trainer_id,
            trainer_num = shard.trainer_num
        );
        span.in_scope(|| {
            debug!(
                "window_size = {} files = {} hs_tables = {}",
                config.window_size,
                files.len(),
                hs.is_some()
            );
        });

        Ok(Self {
            vocab,
            hs,
            sampler,
            files,
            shard,
            normalizer,
            span,
        })
    }

    /// Replace the span that wraps this reader's log events.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn hs_tables(&self) -> Option<&HsTables> {
        self.hs.as_ref()
    }

    pub fn dict_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn shard(&self) -> TrainerShard {
        self.shard
    }

    pub fn window_size(&self) -> usize {
        self.sampler.window_size()
    }

    /// Corpus files in pass order, data directory already applied.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Context of `words[idx]` under a freshly drawn radius.
    pub fn context_words<T: Ord + Clone>(&mut self, words: &[T], idx: usize) -> BTreeSet<T> {
        self.sampler.context_words(words, idx)
    }

    /// Plain `(target, context)` stream.
    pub fn pairs(&mut self) -> PairStream<'_, N> {
        let lines = LineSource::new(
            &self.files,
            self.shard,
            &self.vocab,
            &self.normalizer,
            &self.span,
        );
        PairStream::new(lines, &mut self.sampler)
    }

    /// `(target, context, code, path)` stream.
    ///
    /// Fails up front when no tables were loaded or when any vocabulary word
    /// lacks a path or code entry.
    pub fn hs_samples(&mut self) -> Result<HsStream<'_, N>, ReaderError> {
        let tables = self.hs.as_ref().ok_or(ReaderError::HsTablesUnavailable)?;
        if let Some((word, table)) = tables.first_uncovered(&self.vocab) {
            return Err(ReaderError::MissingHsEntry {
                word: word.to_string(),
                table,
            });
        }
        let lines = LineSource::new(
            &self.files,
            self.shard,
            &self.vocab,
            &self.normalizer,
            &self.span,
        );
        let pairs = PairStream::new(lines, &mut self.sampler);
        Ok(HsStream::new(pairs, &self.vocab, tables))
    }

    /// Pick the stream kind at call time.
    pub fn train(&mut self, with_hs: bool) -> Result<TrainingStream<'_, N>, ReaderError> {
        if with_hs {
            self.hs_samples().map(TrainingStream::Hs)
        } else {
            Ok(TrainingStream::Plain(self.pairs()))
        }
    }
}

impl<N> std::fmt::Debug for CorpusReader<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusReader")
            .field("dict_size", &self.vocab.len())
            .field("hs_tables", &self.hs.is_some())
            .field("window_size", &self.sampler.window_size())
            .field("files", &self.files)
            .field("shard", &self.shard)
            .finish()
    }
}

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{Span, info};
use w2v_text::{Normalize, tokens};
use w2v_types::{HsSample, SkipGramPair, TrainerShard, TrainingSample, WordId};
use w2v_vocab::{HsTable, HsTables, Vocabulary};

use crate::error::ReaderError;
use crate::window::ContextSampler;

struct OpenFile<'r> {
    path: &'r Path,
    reader: BufReader<File>,
    buf: Vec<u8>,
    line_number: u64,
}

impl OpenFile<'_> {
    /// Next raw line without its terminator, `None` at end of file.
    fn next_line(&mut self) -> Option<io::Result<&[u8]>> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                let line = self.buf.strip_suffix(b"\n").unwrap_or(self.buf.as_slice());
                Some(Ok(line.strip_suffix(b"\r").unwrap_or(line)))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Walks the file list and yields the known-word ids of each owned line.
pub(crate) struct LineSource<'r, N> {
    files: &'r [PathBuf],
    next_file: usize,
    current: Option<OpenFile<'r>>,
    shard: TrainerShard,
    vocab: &'r Vocabulary,
    normalizer: &'r N,
    span: &'r Span,
}

impl<'r, N: Normalize> LineSource<'r, N> {
    pub(crate) fn new(
        files: &'r [PathBuf],
        shard: TrainerShard,
        vocab: &'r Vocabulary,
        normalizer: &'r N,
        span: &'r Span,
    ) -> Self {
        Self {
            files,
            next_file: 0,
            current: None,
            shard,
            vocab,
            normalizer,
            span,
        }
    }

    fn next_ids(&mut self) -> Option<Result<Vec<WordId>, ReaderError>> {
        loop {
            let Some(file) = self.current.as_mut() else {
                let files = self.files;
                let path = files.get(self.next_file)?;
                self.next_file += 1;
                self.span
                    .in_scope(|| info!("running data in {}", path.display()));
                match File::open(path) {
                    Ok(handle) => {
                        self.current = Some(OpenFile {
                            path,
                            reader: BufReader::new(handle),
                            buf: Vec::new(),
                            line_number: 0,
                        });
                    }
                    Err(source) => {
                        self.stop();
                        return Some(Err(ReaderError::OpenCorpus {
                            path: path.clone(),
                            source,
                        }));
                    }
                }
                continue;
            };

            let path = file.path;
            let line_number = file.line_number + 1;
            let read_error = |source: io::Error| ReaderError::ReadCorpus {
                path: path.to_path_buf(),
                line: line_number,
                source,
            };
            let line = match file.next_line() {
                None => {
                    // Close this file before the next one is opened.
                    self.current = None;
                    continue;
                }
                Some(Err(source)) => {
                    let err = read_error(source);
                    self.stop();
                    return Some(Err(err));
                }
                Some(Ok(line)) => line,
            };
            // Lines of other shards are skipped before decoding.
            if !self.shard.owns_line(line_number) {
                continue;
            }
            let line = match std::str::from_utf8(line) {
                Ok(line) => line,
                Err(err) => {
                    let err = read_error(io::Error::new(io::ErrorKind::InvalidData, err));
                    self.stop();
                    return Some(Err(err));
                }
            };
            let normalized = self.normalizer.normalize(line);
            let ids = tokens(&normalized)
                .filter_map(|token| self.vocab.id(token))
                .collect();
            return Some(Ok(ids));
        }
    }

    fn stop(&mut self) {
        self.current = None;
        self.next_file = self.files.len();
    }
}

/// Plain skip-gram stream: one `(target, context)` pair per item.
///
/// Only the context of the current position is buffered. The radius for a
/// position is drawn when the previous position's pairs are used up, so a
/// seeded pass draws radii in token order. After an `Err` item the stream is
/// exhausted.
pub struct PairStream<'r, N> {
    lines: LineSource<'r, N>,
    sampler: &'r mut ContextSampler,
    ids: Vec<WordId>,
    position: usize,
    pending: VecDeque<SkipGramPair>,
}

impl<'r, N: Normalize> PairStream<'r, N> {
    pub(crate) fn new(lines: LineSource<'r, N>, sampler: &'r mut ContextSampler) -> Self {
        Self {
            lines,
            sampler,
            ids: Vec::new(),
            position: 0,
            pending: VecDeque::new(),
        }
    }

    fn advance(&mut self) {
        let target = self.ids[self.position];
        for context in self.sampler.context_words(&self.ids, self.position) {
            self.pending.push_back(SkipGramPair { target, context });
        }
        self.position += 1;
    }
}

impl<N: Normalize> Iterator for PairStream<'_, N> {
    type Item = Result<SkipGramPair, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.pending.pop_front() {
                return Some(Ok(pair));
            }
            if self.position < self.ids.len() {
                self.advance();
                continue;
            }
            match self.lines.next_ids()? {
                Ok(ids) => {
                    self.ids = ids;
                    self.position = 0;
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Skip-gram stream decorated with the context word's code and path.
///
/// A missing table entry is yielded as an `Err` item, after which the stream
/// is exhausted.
pub struct HsStream<'r, N> {
    pairs: PairStream<'r, N>,
    vocab: &'r Vocabulary,
    tables: &'r HsTables,
    done: bool,
}

impl<'r, N: Normalize> HsStream<'r, N> {
    pub(crate) fn new(
        pairs: PairStream<'r, N>,
        vocab: &'r Vocabulary,
        tables: &'r HsTables,
    ) -> Self {
        Self {
            pairs,
            vocab,
            tables,
            done: false,
        }
    }
}

impl<'r, N: Normalize> Iterator for HsStream<'r, N> {
    type Item = Result<HsSample<'r>, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.pairs.next()? {
            Ok(pair) => decorate(self.vocab, self.tables, pair),
            Err(err) => Err(err),
        };
        self.done = item.is_err();
        Some(item)
    }
}

fn decorate<'r>(
    vocab: &'r Vocabulary,
    tables: &'r HsTables,
    pair: SkipGramPair,
) -> Result<HsSample<'r>, ReaderError> {
    let word = vocab
        .word(pair.context)
        .ok_or(ReaderError::UnknownWordId(pair.context))?;
    let missing = |table| ReaderError::MissingHsEntry {
        word: word.to_string(),
        table,
    };
    let code = tables.code(word).ok_or_else(|| missing(HsTable::Code))?;
    let path = tables.path(word).ok_or_else(|| missing(HsTable::Path))?;
    Ok(HsSample {
        target: pair.target,
        context: pair.context,
        code,
        path,
    })
}

/// Either stream kind, chosen by [`CorpusReader::train`].
///
/// [`CorpusReader::train`]: crate::CorpusReader::train
pub enum TrainingStream<'r, N> {
    Plain(PairStream<'r, N>),
    Hs(HsStream<'r, N>),
}

impl<'r, N: Normalize> Iterator for TrainingStream<'r, N> {
    type Item = Result<TrainingSample<'r>, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            TrainingStream::Plain(stream) => {
                stream.next().map(|item| item.map(TrainingSample::Pair))
            }
            TrainingStream::Hs(stream) => stream.next().map(|item| item.map(TrainingSample::Hs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use w2v_text::Passthrough;

    use super::*;

    fn numbered_vocab(len: usize) -> (Vocabulary, Vec<String>) {
        let words: Vec<String> = (0..len).map(|i| format!("w{i}")).collect();
        let vocab = Vocabulary::from_counts(words.iter().map(|w| (w.as_str(), 1))).unwrap();
        (vocab, words)
    }

    #[test]
    fn long_lines_buffer_one_window_at_a_time() {
        let window_size = 5;
        let (vocab, words) = numbered_vocab(50);
        let line: Vec<&str> = words.iter().map(String::as_str).cycle().take(20_000).collect();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("corpus");
        fs::write(&file, format!("{}\n", line.join(" "))).unwrap();

        let files = [file];
        let span = Span::none();
        let mut sampler = ContextSampler::new(window_size, 64, Some(1)).unwrap();
        let lines = LineSource::new(&files, TrainerShard::SOLO, &vocab, &Passthrough, &span);
        let mut stream = PairStream::new(lines, &mut sampler);

        let mut pulled = 0;
        while let Some(pair) = stream.next() {
            pair.unwrap();
            assert!(stream.pending.len() <= 2 * window_size);
            pulled += 1;
        }
        assert!(pulled >= 20_000);
    }

    #[test]
    fn hs_stream_stops_after_a_missing_entry() {
        let (vocab, words) = numbered_vocab(3);
        let tables = HsTables::from_entries([("w0", vec![2, 0], vec![0])]);
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("corpus");
        fs::write(&file, format!("{}\n{}\n", words.join(" "), words.join(" "))).unwrap();

        let files = [file];
        let span = Span::none();
        let mut sampler = ContextSampler::new(1, 8, Some(3)).unwrap();
        let lines = LineSource::new(&files, TrainerShard::SOLO, &vocab, &Passthrough, &span);
        let mut stream = HsStream::new(PairStream::new(lines, &mut sampler), &vocab, &tables);

        // w0 -> w1 is the first pair and w1 has no entry.
        match stream.next() {
            Some(Err(ReaderError::MissingHsEntry { word, table })) => {
                assert_eq!(word, "w1");
                assert_eq!(table, HsTable::Code);
            }
            other => panic!("expected MissingHsEntry, got {other:?}"),
        }
        assert!(stream.next().is_none());
    }
}

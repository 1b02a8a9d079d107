//! Load word2vec training metadata: the vocabulary dictionary and the
//! Huffman path/code tables used by hierarchical softmax.
//!
//! The dictionary is a flat `word count` file. Line order assigns dense ids
//! starting at 0, and the counts become a frequency table normalized by their
//! sum. Path and code tables are `word:int int ...` files, one entry per
//! vocabulary word, produced by the same upstream tree builder.
//!
//! Everything is read eagerly and is immutable afterwards. Callers choose
//! between memory-mapped files or owned buffers at runtime via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use w2v_vocab::{HsTables, LoadMode, Vocabulary};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = std::path::Path::new("/data/1-billion_dict");
//! let vocab = Vocabulary::load_with_mode(dict, LoadMode::Mmap)?;
//! let the = vocab.id("the").expect("the in dictionary");
//! println!("the = {the}, p = {:?}", vocab.frequency(the));
//!
//! let tables = HsTables::load_siblings(dict, LoadMode::Mmap)?;
//! println!("path of the: {:?}", tables.path("the"));
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p w2v-vocab --example stats -- <dict>`.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::Mmap;
use tracing::{debug, info, warn};
use w2v_types::WordId;

/// Suffix of the diagnostic `word id` dump written next to the dictionary.
pub const WORD_TO_ID_SUFFIX: &str = "_word_to_id_";
/// Suffix of the path table conventionally stored next to the dictionary.
pub const PATH_TABLE_SUFFIX: &str = "_ptable";
/// Suffix of the code table conventionally stored next to the dictionary.
pub const CODE_TABLE_SUFFIX: &str = "_pcode";

/// Strategy for loading metadata files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each file (fast for multi-million word dictionaries).
    #[default]
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Append `suffix` to the full dictionary path (`dict` -> `dict_ptable`).
pub fn sibling_path(dict_path: &Path, suffix: &str) -> PathBuf {
    let mut raw = dict_path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Bidirectional word <-> id map with per-id counts and frequencies.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, WordId>,
    counts: Vec<u64>,
    frequencies: Vec<f64>,
    total_count: u64,
}

impl Vocabulary {
    /// Load a `word count` dictionary, memory-mapping the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load a `word count` dictionary choosing the backing buffer at runtime.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        let vocab = parse_dictionary(buffer.as_slice(), path)?;
        info!(
            "dict_size = {} word_all_count = {} ({})",
            vocab.len(),
            vocab.total_count,
            path.display()
        );
        Ok(vocab)
    }

    /// Build from in-memory `(word, count)` entries; order assigns ids.
    pub fn from_counts<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut builder = Builder::default();
        for (word, count) in entries {
            builder.insert(word.into(), count)?;
        }
        builder.finish()
    }

    /// Id of `word`, if it is in the dictionary.
    pub fn id(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    /// Word assigned to `id`.
    pub fn word(&self, id: WordId) -> Option<&str> {
        self.words.get(id.index()).map(String::as_str)
    }

    /// Number of dictionary entries (`dict_size`).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Raw count recorded for `id`.
    pub fn count(&self, id: WordId) -> Option<u64> {
        self.counts.get(id.index()).copied()
    }

    /// Sum of all counts (`word_all_count`).
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Count of `id` divided by the total count.
    pub fn frequency(&self, id: WordId) -> Option<f64> {
        self.frequencies.get(id.index()).copied()
    }

    /// Frequency table indexed by id.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Iterate `(id, word)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (WordId, &str)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(idx, word)| (WordId(idx as u32), word.as_str()))
    }

    /// Write one `word id` line per entry, in id order.
    pub fn write_word_to_id(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for (id, word) in self.iter() {
            writeln!(out, "{word} {id}").with_context(|| format!("write {}", path.display()))?;
        }
        out.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        debug!("wrote {} word ids to {}", self.len(), path.display());
        Ok(())
    }
}

#[derive(Default)]
struct Builder {
    words: Vec<String>,
    ids: HashMap<String, WordId>,
    counts: Vec<u64>,
    total_count: u64,
}

impl Builder {
    fn insert(&mut self, word: String, count: u64) -> Result<()> {
        let next = u32::try_from(self.words.len())
            .map_err(|_| anyhow::anyhow!("dictionary exceeds {} entries", u32::MAX))?;
        if self.ids.contains_key(&word) {
            anyhow::bail!("duplicate dictionary word {word:?}");
        }
        if count == 0 {
            warn!("dictionary word {word:?} has a zero count");
        }
        self.total_count = self
            .total_count
            .checked_add(count)
            .context("dictionary counts overflow u64")?;
        self.ids.insert(word.clone(), WordId(next));
        self.words.push(word);
        self.counts.push(count);
        Ok(())
    }

    fn finish(self) -> Result<Vocabulary> {
        if !self.words.is_empty() && self.total_count == 0 {
            anyhow::bail!("dictionary counts sum to zero");
        }
        let total = self.total_count as f64;
        let frequencies = self.counts.iter().map(|&c| c as f64 / total).collect();
        Ok(Vocabulary {
            words: self.words,
            ids: self.ids,
            counts: self.counts,
            frequencies,
            total_count: self.total_count,
        })
    }
}

/// Which hierarchical-softmax table an entry belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HsTable {
    Path,
    Code,
}

impl fmt::Display for HsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HsTable::Path => "path",
            HsTable::Code => "code",
        })
    }
}

/// Per-word Huffman paths and codes.
///
/// Entries are stored exactly as written: a path starts with the non-leaf
/// node count marker followed by the internal-node indices from the root.
#[derive(Clone, Debug, Default)]
pub struct HsTables {
    paths: HashMap<String, Vec<i64>>,
    codes: HashMap<String, Vec<i64>>,
    num_non_leaf: Option<i64>,
}

impl HsTables {
    /// Load a path table and a code table.
    pub fn load(
        path_table: impl AsRef<Path>,
        code_table: impl AsRef<Path>,
        mode: LoadMode,
    ) -> Result<Self> {
        let path_table = path_table.as_ref();
        let code_table = code_table.as_ref();

        let buffer = load_file(path_table, mode)?;
        let paths = parse_table(buffer.as_slice(), path_table, HsTable::Path)?;
        drop(buffer);
        let num_non_leaf = paths.last_marker;
        info!(
            "word_ptable dict_size = {} ({})",
            paths.entries.len(),
            path_table.display()
        );

        let buffer = load_file(code_table, mode)?;
        let codes = parse_table(buffer.as_slice(), code_table, HsTable::Code)?;
        info!(
            "word_pcode dict_size = {} ({})",
            codes.entries.len(),
            code_table.display()
        );

        Ok(Self {
            paths: paths.entries,
            codes: codes.entries,
            num_non_leaf,
        })
    }

    /// Load `<dict>_ptable` and `<dict>_pcode` stored next to the dictionary.
    pub fn load_siblings(dict_path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let dict_path = dict_path.as_ref();
        Self::load(
            sibling_path(dict_path, PATH_TABLE_SUFFIX),
            sibling_path(dict_path, CODE_TABLE_SUFFIX),
            mode,
        )
    }

    /// Build from in-memory `(word, path, code)` entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<i64>, Vec<i64>)>,
        S: Into<String>,
    {
        let mut tables = Self::default();
        for (word, path, code) in entries {
            let word = word.into();
            if let Some(&marker) = path.first() {
                tables.num_non_leaf = Some(marker);
            }
            tables.paths.insert(word.clone(), path);
            tables.codes.insert(word, code);
        }
        tables
    }

    /// Path entry of `word`, marker included.
    pub fn path(&self, word: &str) -> Option<&[i64]> {
        self.paths.get(word).map(Vec::as_slice)
    }

    /// Huffman code of `word`.
    pub fn code(&self, word: &str) -> Option<&[i64]> {
        self.codes.get(word).map(Vec::as_slice)
    }

    /// Marker of the last path line: the tree's non-leaf node count.
    pub fn num_non_leaf(&self) -> Option<i64> {
        self.num_non_leaf
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// First vocabulary word (in id order) lacking a path or a code.
    pub fn first_uncovered<'v>(&self, vocab: &'v Vocabulary) -> Option<(&'v str, HsTable)> {
        vocab.iter().find_map(|(_, word)| {
            if !self.paths.contains_key(word) {
                Some((word, HsTable::Path))
            } else if !self.codes.contains_key(word) {
                Some((word, HsTable::Code))
            } else {
                None
            }
        })
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn parse_dictionary(bytes: &[u8], source: &Path) -> Result<Vocabulary> {
    let mut builder = Builder::default();
    for (lineno, raw_line) in numbered_lines(bytes) {
        let line = std::str::from_utf8(raw_line)
            .with_context(|| format!("{}:{} invalid utf-8", source.display(), lineno))?;
        let mut fields = line.split_whitespace();
        let (Some(word), Some(count)) = (fields.next(), fields.next()) else {
            anyhow::bail!(
                "{}:{} malformed dictionary line (expected `word count`)",
                source.display(),
                lineno
            );
        };
        let count: u64 = count
            .parse()
            .with_context(|| format!("{}:{} count {:?}", source.display(), lineno, count))?;
        builder
            .insert(word.to_string(), count)
            .with_context(|| format!("{}:{}", source.display(), lineno))?;
    }
    builder.finish()
}

struct ParsedTable {
    entries: HashMap<String, Vec<i64>>,
    last_marker: Option<i64>,
}

fn parse_table(bytes: &[u8], source: &Path, table: HsTable) -> Result<ParsedTable> {
    let mut entries = HashMap::new();
    let mut last_marker = None;
    for (lineno, raw_line) in numbered_lines(bytes) {
        let line = std::str::from_utf8(raw_line)
            .with_context(|| format!("{}:{} invalid utf-8", source.display(), lineno))?;
        let Some((word, values)) = line.rsplit_once(':') else {
            anyhow::bail!(
                "{}:{} malformed {} line (expected `word:ints`)",
                source.display(),
                lineno,
                table
            );
        };
        let values: Vec<i64> = values
            .split_whitespace()
            .map(|t| {
                t.parse::<i64>().with_context(|| {
                    format!("{}:{} {} value {:?}", source.display(), lineno, table, t)
                })
            })
            .collect::<Result<_>>()?;
        if table == HsTable::Path {
            let Some(&marker) = values.first() else {
                anyhow::bail!(
                    "{}:{} empty path for {:?} (missing non-leaf marker)",
                    source.display(),
                    lineno,
                    word
                );
            };
            last_marker = Some(marker);
        }
        entries.insert(word.to_string(), values);
    }
    Ok(ParsedTable {
        entries,
        last_marker,
    })
}

/// 1-based lines; a final newline does not start an extra empty line.
fn numbered_lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let has_content = !bytes.is_empty();
    body.split(|b| *b == b'\n')
        .take_while(move |_| has_content)
        .map(strip_cr)
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

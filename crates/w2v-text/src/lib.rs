//! Corpus line normalization.
//!
//! The reader never decides how raw text is cleaned. It calls a
//! caller-provided [`Normalize`] implementation on every owned line and
//! splits the result on whitespace with [`tokens`]. The crate is independent
//! of the vocabulary loader; anything that can turn a `&str` into a cleaned
//! line plugs in.
//!
//! # Provided strategies
//! 1. [`TextStrip`]: lowercase, then keep only `a-z` and the space character.
//!    Matches the preprocessing used to build the stock dictionaries.
//! 2. [`Passthrough`]: leave the line untouched (already tokenized corpora).
//! 3. Any `Fn(&str) -> String` closure.
//!
//! # Example
//! ```
//! use w2v_text::{Normalize, TextStrip, tokens};
//!
//! let line = TextStrip.normalize("The cat, sat!\n");
//! assert_eq!(tokens(&line).collect::<Vec<_>>(), ["the", "cat", "sat"]);
//!
//! let upper = |line: &str| line.to_uppercase();
//! assert_eq!(upper.normalize("ab"), "AB");
//! ```
//!
//! For a runnable demo, see `cargo run -p w2v-text --example normalize -- <dict> [--demo|<line>]`.

use std::borrow::Cow;
use std::str::SplitWhitespace;

/// Turns a raw corpus line into a whitespace-separated token line.
pub trait Normalize {
    fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

/// Lowercase and drop every character outside `[a-z ]`.
///
/// Tabs and other whitespace are dropped too, so words separated only by a
/// tab are glued together, as in the upstream preprocessing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextStrip;

impl Normalize for TextStrip {
    fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if line.bytes().all(|b| b.is_ascii_lowercase() || b == b' ') {
            return Cow::Borrowed(line);
        }
        let mut out = String::with_capacity(line.len());
        for c in line.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c == ' ' {
                out.push(c);
            }
        }
        Cow::Owned(out)
    }
}

/// Leave lines as they are.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Normalize for Passthrough {
    fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(line)
    }
}

impl<F> Normalize for F
where
    F: Fn(&str) -> String,
{
    fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(line))
    }
}

/// Split a normalized line into tokens.
pub fn tokens(normalized: &str) -> SplitWhitespace<'_> {
    normalized.split_whitespace()
}

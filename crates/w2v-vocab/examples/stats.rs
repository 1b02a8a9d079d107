use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use w2v_vocab::{HsTables, LoadMode, Vocabulary};

fn main() -> Result<()> {
    let dict = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p w2v-vocab --example stats -- <path-to-dict>")?;

    let vocab = Vocabulary::load_with_mode(&dict, LoadMode::Mmap)
        .with_context(|| format!("loading dictionary from {}", dict.display()))?;

    println!("Dictionary   : {}", dict.display());
    println!("Words        : {}", vocab.len());
    println!("Total count  : {}", vocab.total_count());

    let mut by_freq: Vec<_> = vocab.iter().collect();
    by_freq.sort_by(|a, b| vocab.count(b.0).cmp(&vocab.count(a.0)));
    for (id, word) in by_freq.into_iter().take(5) {
        println!(
            "  {:>8} {:<16} p = {:.6}",
            id.0,
            word,
            vocab.frequency(id).unwrap_or_default()
        );
    }

    match HsTables::load_siblings(&dict, LoadMode::Mmap) {
        Ok(tables) => {
            println!("Path entries : {}", tables.path_count());
            println!("Code entries : {}", tables.code_count());
            println!("Non-leaf     : {:?}", tables.num_non_leaf());
            match tables.first_uncovered(&vocab) {
                Some((word, table)) => println!("Uncovered    : {word} (no {table})"),
                None => println!("Uncovered    : none"),
            }
        }
        Err(err) => println!("No hierarchical-softmax tables: {err:#}"),
    }

    Ok(())
}

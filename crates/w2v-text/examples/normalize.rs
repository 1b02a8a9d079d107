use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use w2v_text::{Normalize, TextStrip, tokens};
use w2v_vocab::{LoadMode, Vocabulary};

const USAGE: &str = "usage: cargo run -p w2v-text --example normalize -- <dict> [--demo | <line>]";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let dict = args.next().map(PathBuf::from).context(USAGE)?;
    let next = args.next();
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let lines: Vec<String> = match next.as_deref() {
        Some("--demo") => vec![
            "The cat sat on the mat.".into(),
            "It's 42 degrees -- in Celsius!".into(),
            "Qwzx blorf".into(),
        ],
        Some(line) => vec![line.to_string()],
        None => bail!(USAGE),
    };

    let vocab = Vocabulary::load_with_mode(&dict, LoadMode::Mmap)
        .with_context(|| format!("loading dictionary from {}", dict.display()))?;

    println!("Dictionary: {} ({} words)", dict.display(), vocab.len());

    for line in lines {
        let normalized = TextStrip.normalize(&line);
        println!("\nRaw       : {line}");
        println!("Normalized: {normalized}");
        for token in tokens(&normalized) {
            match vocab.id(token) {
                Some(id) => println!("    {token:<12} -> {id}"),
                None => println!("    {token:<12} (dropped)"),
            }
        }
    }

    Ok(())
}

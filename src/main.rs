use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use w2v_reader::{CorpusReader, LoadMode, ReaderConfig, StreamSummary, summarize};

const DEFAULT_PREVIEW: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "w2v-reader")]
#[command(about = "Stream skip-gram training pairs for one trainer shard")]
struct Cli {
    /// Vocabulary dictionary (`word count` per line).
    #[arg(long, env = "W2V_DICT")]
    dict: PathBuf,
    #[arg(long, requires = "code_table", conflicts_with = "sibling_tables")]
    path_table: Option<PathBuf>,
    #[arg(long, requires = "path_table", conflicts_with = "sibling_tables")]
    code_table: Option<PathBuf>,
    /// Use `<dict>_ptable` and `<dict>_pcode`.
    #[arg(long, default_value_t = false)]
    sibling_tables: bool,
    #[arg(long, env = "W2V_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Corpus files, read in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long, env = "W2V_TRAINER_ID", default_value_t = 0)]
    trainer_id: u32,
    #[arg(long, env = "W2V_TRAINER_NUM", default_value_t = 1)]
    trainer_num: u32,
    #[arg(long, default_value_t = w2v_reader::corpus::DEFAULT_WINDOW_SIZE)]
    window_size: usize,
    /// Decorate each pair with the context word's code and path.
    #[arg(long, default_value_t = false)]
    hs: bool,
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many samples.
    #[arg(long)]
    limit: Option<u64>,
    #[arg(long, env = "W2V_LOAD_MODE", default_value = "mmap", value_parser = parse_load_mode)]
    load_mode: LoadMode,
    #[arg(long, default_value_t = false)]
    no_word_to_id: bool,
    /// Print the summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.hs && cli.path_table.is_none() && !cli.sibling_tables {
        bail!("--hs needs --sibling-tables or --path-table/--code-table");
    }

    let config = build_config(&cli);
    info!("using dictionary at {}", config.dict_path.display());
    info!(
        "trainer {} of {} (window {}, load mode {:?})",
        config.shard.trainer_id, config.shard.trainer_num, config.window_size, config.load_mode
    );

    let start = Instant::now();
    let mut reader = CorpusReader::open(config).context("failed to open corpus reader")?;
    info!("metadata loaded in {} ms", start.elapsed().as_millis());

    let start = Instant::now();
    let summary = summarize(&mut reader, cli.hs, cli.limit, DEFAULT_PREVIEW)?;
    info!(
        "streamed {} samples in {} ms",
        summary.samples,
        start.elapsed().as_millis()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> ReaderConfig {
    let mut config = ReaderConfig::new(&cli.dict)
        .files(cli.files.iter().cloned())
        .shard(cli.trainer_id, cli.trainer_num)
        .window_size(cli.window_size)
        .load_mode(cli.load_mode)
        .write_word_to_id(!cli.no_word_to_id);
    if let Some(dir) = &cli.data_dir {
        config = config.data_dir(dir);
    }
    if let (Some(path_table), Some(code_table)) = (&cli.path_table, &cli.code_table) {
        config = config.hs_tables(path_table, code_table);
    } else if cli.sibling_tables {
        config = config.sibling_hs_tables();
    }
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }
    config
}

fn print_summary(summary: &StreamSummary) {
    println!(
        "dict_size = {} word_all_count = {}",
        summary.dict_size, summary.total_count
    );
    println!(
        "trainer {}/{} window {} files {}",
        summary.trainer_id, summary.trainer_num, summary.window_size, summary.files
    );
    if let Some(num_non_leaf) = summary.num_non_leaf {
        println!("num_non_leaf = {num_non_leaf}");
    }
    println!(
        "{} samples{} ({} targets, {} contexts)",
        summary.samples,
        if summary.truncated { " (limit reached)" } else { "" },
        summary.distinct_targets,
        summary.distinct_contexts
    );
    for record in &summary.preview {
        match (&record.code, &record.path) {
            (Some(code), Some(path)) => println!(
                "  {} -> {} code={:?} path={:?}",
                record.target, record.context, code, path
            ),
            _ => println!("  {} -> {}", record.target, record.context),
        }
    }
}

fn parse_load_mode(raw: &str) -> Result<LoadMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Ok(LoadMode::Mmap),
        "owned" => Ok(LoadMode::Owned),
        other => Err(format!("unknown load mode `{other}` (expected mmap or owned)")),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_mode_parses_case_insensitively() {
        assert_eq!(parse_load_mode("OWNED"), Ok(LoadMode::Owned));
        assert_eq!(parse_load_mode("mmap"), Ok(LoadMode::Mmap));
        assert!(parse_load_mode("disk").is_err());
    }

    #[test]
    fn cli_maps_onto_reader_config() {
        let cli = Cli::try_parse_from([
            "w2v-reader",
            "--dict",
            "/data/dict",
            "--data-dir",
            "/data/corpus",
            "--sibling-tables",
            "--trainer-id",
            "1",
            "--trainer-num",
            "4",
            "--window-size",
            "3",
            "--seed",
            "9",
            "part-0",
            "part-1",
        ])
        .unwrap();
        let config = build_config(&cli);
        assert_eq!(config.shard.trainer_id, 1);
        assert_eq!(config.shard.trainer_num, 4);
        assert_eq!(config.window_size, 3);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.hs_source, w2v_reader::HsSource::Siblings);
        assert_eq!(config.data_dir, Some(PathBuf::from("/data/corpus")));
        assert_eq!(config.files, vec![PathBuf::from("part-0"), PathBuf::from("part-1")]);
        assert!(config.write_word_to_id);
    }

    #[test]
    fn table_flags_come_in_pairs() {
        let result = Cli::try_parse_from([
            "w2v-reader",
            "--dict",
            "d",
            "--path-table",
            "p",
            "corpus",
        ]);
        assert!(result.is_err());
    }
}

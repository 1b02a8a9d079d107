use std::fs;

use w2v_reader::{CorpusReader, LoadMode, ReaderConfig, ReaderError, summarize};

fn make_corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dict"), "the 5\ncat 2\nsat 1\n").unwrap();
    fs::write(dir.path().join("dict_ptable"), "the:2 0\ncat:2 0 1\nsat:2 0 1\n").unwrap();
    fs::write(dir.path().join("dict_pcode"), "the:0\ncat:1 0\nsat:1 1\n").unwrap();
    fs::write(
        dir.path().join("news-00001"),
        "The cat sat.\nA dog barked!\nSat, the cat?\n",
    )
    .unwrap();
    dir
}

fn config(dir: &tempfile::TempDir) -> ReaderConfig {
    ReaderConfig::new(dir.path().join("dict"))
        .data_dir(dir.path())
        .files(["news-00001"])
        .window_size(1)
        .seed(3)
}

#[test]
fn plain_summary_counts_every_pair() {
    let dir = make_corpus();
    let mut reader = CorpusReader::open(config(&dir)).unwrap();
    let summary = summarize(&mut reader, false, None, 2).unwrap();

    assert_eq!(summary.dict_size, 3);
    assert_eq!(summary.total_count, 8);
    // Two lines of three known words, four pairs each.
    assert_eq!(summary.samples, 8);
    assert_eq!(summary.distinct_targets, 3);
    assert!(!summary.truncated);
    assert_eq!(summary.preview.len(), 2);
    assert_eq!(summary.preview[0].target, "the");
    assert_eq!(summary.preview[0].context, "cat");
    assert!(summary.preview[0].code.is_none());
}

#[test]
fn hs_summary_resolves_codes_and_paths() {
    let dir = make_corpus();
    let mut reader =
        CorpusReader::open(config(&dir).sibling_hs_tables().load_mode(LoadMode::Owned)).unwrap();
    let summary = summarize(&mut reader, true, None, 1).unwrap();

    assert!(summary.hs);
    assert_eq!(summary.num_non_leaf, Some(2));
    let first = &summary.preview[0];
    assert_eq!((first.target.as_str(), first.context.as_str()), ("the", "cat"));
    assert_eq!(first.code.as_deref(), Some(&[1, 0][..]));
    assert_eq!(first.path.as_deref(), Some(&[2, 0, 1][..]));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["preview"][0]["code"], serde_json::json!([1, 0]));
}

#[test]
fn limit_truncates_the_pass() {
    let dir = make_corpus();
    let mut reader = CorpusReader::open(config(&dir)).unwrap();
    let summary = summarize(&mut reader, false, Some(3), 0).unwrap();
    assert_eq!(summary.samples, 3);
    assert!(summary.truncated);
    assert!(summary.preview.is_empty());
}

#[test]
fn shards_partition_the_summary() {
    let dir = make_corpus();
    let mut total = 0;
    for trainer_id in 0..2 {
        let mut reader = CorpusReader::open(config(&dir).shard(trainer_id, 2)).unwrap();
        total += summarize(&mut reader, false, None, 0).unwrap().samples;
    }
    assert_eq!(total, 8);
}

#[test]
fn hs_without_tables_is_reported() {
    let dir = make_corpus();
    let mut reader = CorpusReader::open(config(&dir)).unwrap();
    let err = summarize(&mut reader, true, None, 0).unwrap_err();
    assert!(matches!(err, ReaderError::HsTablesUnavailable));
}

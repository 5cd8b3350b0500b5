use std::io::Write;

use chaintable::{
    buffer::length_first, logger::initialize_logger, workload::load_file, BucketStats,
    HashFunction, LoadError,
};
use tempfile::NamedTempFile;

const TEXT: &str = "It was the best of times, it was the worst of times, \
it was the age of wisdom, it was the age of foolishness.";

fn text_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_counts_every_occurrence() {
    initialize_logger();
    let file = text_file(TEXT);

    let table = load_file(file.path(), 128, HashFunction::Djb2).unwrap();

    assert_eq!(table.len(), 24);
    assert_eq!(table.count(b"was", length_first), Ok(4));
    assert_eq!(table.count(b"it", length_first), Ok(3));
    assert_eq!(table.count(b"It", length_first), Ok(1));
    assert_eq!(table.count(b"times", length_first), Ok(2));
}

#[test]
fn test_dispersion_zero_hash() {
    initialize_logger();
    let file = text_file(TEXT);

    let table = load_file(file.path(), 4, HashFunction::Zero).unwrap();
    let stats = BucketStats::from_table(&table);

    // all n words in bucket 0: n^2/4 - (n/4)^2
    let n = stats.total() as f64;
    let expected = n * n / 4.0 - (n / 4.0) * (n / 4.0);
    assert_eq!(stats.counts()[1..], [0, 0, 0]);
    assert!((stats.dispersion() - expected).abs() < 1e-9);
}

#[test]
fn test_reduced_hashes_beat_zero() {
    initialize_logger();
    let file = text_file(TEXT);

    let zero = BucketStats::from_table(&load_file(file.path(), 16, HashFunction::Zero).unwrap());
    for func in [HashFunction::Djb2, HashFunction::Crc32] {
        let stats = BucketStats::from_table(&load_file(file.path(), 16, func).unwrap());
        assert_eq!(stats.total(), zero.total());
        assert!(stats.dispersion() < zero.dispersion(), "{func}");
    }
}

#[test]
fn test_empty_file_rejected() {
    initialize_logger();
    let file = text_file("");

    let result = load_file(file.path(), 16, HashFunction::Djb2);
    assert!(matches!(result, Err(LoadError::EmptyInput(_))));
}

#[test]
fn test_zero_capacity_rejected() {
    initialize_logger();
    let file = text_file(TEXT);

    let result = load_file(file.path(), 0, HashFunction::Djb2);
    assert!(matches!(result, Err(LoadError::Table(_))));
}

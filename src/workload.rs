//! Word-dispersion workload: split text into words and load every occurrence
//! into a table, repeats included.

use std::{fs, path::Path};

use log::{debug, info, warn};

use crate::{
    error::{LoadError, TableError},
    hash::BucketHasher,
    table::HashTable,
    tokenizer::{alphabetic, tokenize},
};

/// Outcome of `fill_table`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Tokens stored in the table
    pub inserted: usize,
    /// Tokens dropped because the hash function pointed outside the table
    pub skipped: usize,
}

/// Insert every alphabetic word of `text` as a key with an empty value
///
/// Words whose hash falls outside the table are skipped and counted, so an
/// unreduced hash function can still be measured on the words it does place.
/// Any other failure stops the load.
pub fn fill_table<H>(table: &mut HashTable<H>, text: &[u8]) -> Result<FillReport, TableError>
where
    H: BucketHasher,
{
    let mut report = FillReport::default();

    for word in tokenize(text, alphabetic) {
        match table.insert(word, &[]) {
            Ok(_) => report.inserted += 1,
            Err(TableError::OutOfRange { .. }) => report.skipped += 1,
            Err(err) => return Err(err),
        }
    }

    if report.skipped > 0 {
        warn!(
            "skipped {} of {} words: hash out of range for {} buckets",
            report.skipped,
            report.inserted + report.skipped,
            table.capacity()
        );
    }
    debug!("loaded {} words", report.inserted);

    Ok(report)
}

/// Read `path` and load its words into a new table of `capacity` buckets
pub fn load_file<H, P>(path: P, capacity: usize, hasher: H) -> Result<HashTable<H>, LoadError>
where
    H: BucketHasher,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if text.is_empty() {
        return Err(LoadError::EmptyInput(path.to_path_buf()));
    }

    let mut table = HashTable::with_hasher(capacity, hasher)?;
    let report = fill_table(&mut table, &text)?;
    info!(
        "{}: {} bytes, {} words in {} buckets",
        path.display(),
        text.len(),
        report.inserted,
        capacity
    );

    Ok(table)
}

//! A fixed-capacity chained hash multimap over opaque byte keys and values.
//!
//! - `KeyValueList`: circular doubly-linked list owning copies of its keys and values
//! - `HashTable`: an array of lazily created lists, one per bucket, with a
//!   pluggable `BucketHasher`
//! - `HashFunction`: a catalogue of bucket hash functions, reduced and unreduced
//! - `tokenizer`, `stats`, `workload`: the word-dispersion benchmark built on top
//!
//! ```
//! use chaintable::{buffer::length_first, HashFunction, HashTable};
//!
//! let mut table = HashTable::new(64, HashFunction::Djb2)?;
//! table.insert(b"word", b"")?;
//! table.insert(b"word", b"")?;
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.count(b"word", length_first)?, 2);
//! # Ok::<(), chaintable::TableError>(())
//! ```

pub mod buffer;
pub mod error;
pub mod hash;
pub mod iter;
pub mod list;
pub mod logger;
pub mod stats;
pub mod table;
pub mod tokenizer;
pub mod workload;

pub use buffer::ByteBuffer;
pub use error::{LoadError, Result, TableError};
pub use hash::{BucketHasher, HashFunction};
pub use list::{KeyValueList, NodeHandle};
pub use stats::BucketStats;
pub use table::{EntryHandle, HashTable};

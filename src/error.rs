//! Error types for the list, the table and the file workload

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by `KeyValueList` and `HashTable` operations
///
/// Every failing operation leaves its container exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// An argument that cannot be acted upon, such as a zero capacity or a stale node handle
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The hash function produced a bucket index outside the table
    #[error("hash function returned bucket {index}, table has {capacity} buckets")]
    OutOfRange { index: usize, capacity: usize },

    /// No node with a matching key exists
    #[error("key not found")]
    NotFound,

    /// `insert_unique` found a node with an equal key
    #[error("key already present")]
    DuplicateKey,

    /// A node, buffer or bucket array could not be allocated
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

/// Result type for list and table operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors from loading a text file into a table
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is empty", .0.display())]
    EmptyInput(PathBuf),

    #[error(transparent)]
    Table(#[from] TableError),
}

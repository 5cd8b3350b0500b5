//! Bucket hash functions.
//!
//! Every function maps `(key bytes, bucket_count)` to a bucket index. `Zero`,
//! `FirstByte`, `Length` and `SumOfBytes` are deliberately *not* reduced modulo
//! `bucket_count`: they exist to measure how badly naive hashes disperse, and a
//! table only accepts them when its capacity covers their range. The others
//! always return a value below `bucket_count`.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Strategy a `HashTable` uses to pick a bucket for a key
///
/// Implemented for the `HashFunction` catalogue and for any
/// `Fn(&[u8], usize) -> usize`, plain function pointers included.
pub trait BucketHasher {
    /// Bucket for `key` in a table of `bucket_count` buckets
    ///
    /// Results `>= bucket_count` make the calling table operation fail with
    /// `OutOfRange`.
    fn bucket_index(&self, key: &[u8], bucket_count: usize) -> usize;
}

impl<F> BucketHasher for F
where
    F: Fn(&[u8], usize) -> usize,
{
    #[inline]
    fn bucket_index(&self, key: &[u8], bucket_count: usize) -> usize {
        self(key, bucket_count)
    }
}

/// The built-in hash functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Zero,
    FirstByte,
    Length,
    SumOfBytes,
    Rol,
    Ror,
    Djb2,
    Crc32,
}

impl HashFunction {
    /// Every function, in catalogue order (the order `FromStr` accepts indices in)
    pub const ALL: [HashFunction; 8] = [
        HashFunction::Zero,
        HashFunction::FirstByte,
        HashFunction::Length,
        HashFunction::SumOfBytes,
        HashFunction::Djb2,
        HashFunction::Crc32,
        HashFunction::Rol,
        HashFunction::Ror,
    ];

    /// Kebab-case name, as accepted by `FromStr`
    pub const fn name(self) -> &'static str {
        match self {
            HashFunction::Zero => "zero",
            HashFunction::FirstByte => "first-byte",
            HashFunction::Length => "length",
            HashFunction::SumOfBytes => "sum-of-bytes",
            HashFunction::Rol => "rol",
            HashFunction::Ror => "ror",
            HashFunction::Djb2 => "djb2",
            HashFunction::Crc32 => "crc32",
        }
    }

    /// Whether results are always below `bucket_count`
    pub const fn is_reduced(self) -> bool {
        !matches!(
            self,
            HashFunction::Zero
                | HashFunction::FirstByte
                | HashFunction::Length
                | HashFunction::SumOfBytes
        )
    }

    /// The plain function behind this variant
    pub fn as_fn(self) -> fn(&[u8], usize) -> usize {
        match self {
            HashFunction::Zero => zero,
            HashFunction::FirstByte => first_byte,
            HashFunction::Length => length,
            HashFunction::SumOfBytes => sum_of_bytes,
            HashFunction::Rol => rol,
            HashFunction::Ror => ror,
            HashFunction::Djb2 => djb2,
            HashFunction::Crc32 => crc32,
        }
    }
}

impl BucketHasher for HashFunction {
    #[inline]
    fn bucket_index(&self, key: &[u8], bucket_count: usize) -> usize {
        (self.as_fn())(key, bucket_count)
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no hash function
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown hash function `{0}` (expected a name such as `djb2` or an index 0-7)")]
pub struct ParseHashFunctionError(String);

impl FromStr for HashFunction {
    type Err = ParseHashFunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(index) = s.parse::<usize>() {
            return HashFunction::ALL
                .get(index)
                .copied()
                .ok_or_else(|| ParseHashFunctionError(s.to_string()));
        }

        HashFunction::ALL
            .into_iter()
            .find(|func| func.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseHashFunctionError(s.to_string()))
    }
}

#[inline]
fn reduce(hash: u64, bucket_count: usize) -> usize {
    if bucket_count == 0 {
        0
    } else {
        (hash % bucket_count as u64) as usize
    }
}

/// Always bucket 0
pub fn zero(_key: &[u8], _bucket_count: usize) -> usize {
    0
}

/// Value of the first byte (0 for an empty key), not reduced
pub fn first_byte(key: &[u8], _bucket_count: usize) -> usize {
    key.first().copied().map_or(0, usize::from)
}

/// Key length in bytes, not reduced
pub fn length(key: &[u8], _bucket_count: usize) -> usize {
    key.len()
}

/// Sum of all byte values, not reduced
pub fn sum_of_bytes(key: &[u8], _bucket_count: usize) -> usize {
    key.iter()
        .fold(0usize, |sum, &byte| sum.wrapping_add(usize::from(byte)))
}

/// 32-bit rotate-left-then-xor per byte, reduced
pub fn rol(key: &[u8], bucket_count: usize) -> usize {
    let hash = key
        .iter()
        .fold(0u32, |hash, &byte| hash.rotate_left(1) ^ u32::from(byte));
    reduce(u64::from(hash), bucket_count)
}

/// 32-bit rotate-right-then-xor per byte, reduced
pub fn ror(key: &[u8], bucket_count: usize) -> usize {
    let hash = key
        .iter()
        .fold(0u32, |hash, &byte| hash.rotate_right(1) ^ u32::from(byte));
    reduce(u64::from(hash), bucket_count)
}

/// DJB2: seed 5381, `hash * 33 + byte`, reduced
pub fn djb2(key: &[u8], bucket_count: usize) -> usize {
    let hash = key.iter().fold(5381u64, |hash, &byte| {
        hash.wrapping_mul(33).wrapping_add(u64::from(byte))
    });
    reduce(hash, bucket_count)
}

/// CRC-32 (IEEE) checksum of the key, reduced
pub fn crc32(key: &[u8], bucket_count: usize) -> usize {
    reduce(u64::from(crc32fast::hash(key)), bucket_count)
}

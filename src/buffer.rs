//! Owned byte buffers for keys and values, plus key comparators.
//!
//! - Buffers are always copied in, never aliased
//! - Equality is byte-wise and length-sensitive (no NUL termination)
//! - Comparators return a three-way `Ordering`; lookups only care about `Equal`

use std::{cmp::Ordering, fmt, ops::Deref};

use crate::error::Result;

/// An owned, fixed-length sequence of bytes
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer {
    bytes: Box<[u8]>,
}

impl ByteBuffer {
    /// Create an empty buffer (used for absent values)
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copy `bytes` into a freshly allocated buffer
    ///
    /// Allocation goes through `try_reserve_exact`, so exhaustion surfaces as
    /// `TableError::AllocationFailure` instead of aborting the process.
    pub fn copy_from(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::empty());
        }

        let mut storage = Vec::new();
        storage.try_reserve_exact(bytes.len())?;
        storage.extend_from_slice(bytes);

        Ok(Self {
            bytes: storage.into_boxed_slice(),
        })
    }

    /// Borrow the contents
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes held
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Give the bytes back as a vector
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for ByteBuffer {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq<[u8]> for ByteBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        *self.bytes == *other
    }
}

impl PartialEq<&[u8]> for ByteBuffer {
    fn eq(&self, other: &&[u8]) -> bool {
        *self.bytes == **other
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // printable keys (the common case for word workloads) read better as text
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => write!(f, "ByteBuffer({text:?})"),
            Err(_) => write!(f, "ByteBuffer({:02x?})", &self.bytes),
        }
    }
}

/// Length-first ordering: shorter keys sort before longer ones, equal lengths compare byte-wise
///
/// This is the comparator the word-dispersion workload uses.
#[inline]
pub fn length_first(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Plain lexicographic ordering of the two slices
#[inline]
pub fn bytewise(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

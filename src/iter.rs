//! Iterators for `KeyValueList` and `HashTable`

use std::{cmp::Ordering, iter::FusedIterator};

use crate::{
    list::{KeyValueList, NodeHandle},
    table::{EntryHandle, HashTable},
};

/// Walks a list's ring from `head`, yielding `(handle, key, value)`
///
/// Stops after exactly `len` nodes, so the circular links never loop it.
pub struct ListIter<'a> {
    list: &'a KeyValueList,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> ListIter<'a> {
    pub(crate) fn new(list: &'a KeyValueList) -> Self {
        Self {
            list,
            cursor: list.head_index(),
            remaining: list.len(),
        }
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = (NodeHandle, &'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.cursor?;

        let node = self.list.node_at(idx);
        self.remaining -= 1;
        self.cursor = Some(self.list.next_index(idx));

        Some((
            self.list.handle_at(idx),
            node.key.as_bytes(),
            node.value.as_bytes(),
        ))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ListIter<'_> {}

impl FusedIterator for ListIter<'_> {}

impl<'a> IntoIterator for &'a KeyValueList {
    type Item = (NodeHandle, &'a [u8], &'a [u8]);
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Nodes of one list whose key compares `Equal` to a probe key
pub struct Matches<'a, F> {
    inner: ListIter<'a>,
    key: &'a [u8],
    key_cmp: F,
}

impl<'a, F> Matches<'a, F> {
    pub(crate) fn new(inner: ListIter<'a>, key: &'a [u8], key_cmp: F) -> Self {
        Self {
            inner,
            key,
            key_cmp,
        }
    }
}

impl<'a, F> Iterator for Matches<'a, F>
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    type Item = NodeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key;
        let key_cmp = &self.key_cmp;
        self.inner
            .by_ref()
            .find(|&(_, stored, _)| key_cmp(stored, key) == Ordering::Equal)
            .map(|(handle, _, _)| handle)
    }
}

/// An iterator over every entry of a `HashTable`, bucket by bucket
///
/// Yields `(handle, key, value)`; within a bucket, entries come in insertion order.
pub struct Iter<'a> {
    inner: Box<dyn Iterator<Item = (EntryHandle, &'a [u8], &'a [u8])> + 'a>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = (EntryHandle, &'a [u8], &'a [u8])> + 'a,
    {
        Self {
            inner: Box::new(iter),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (EntryHandle, &'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// An iterator over the keys of a `HashTable`
pub struct Keys<'a> {
    inner: Iter<'a>,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(iter: Iter<'a>) -> Self {
        Self { inner: iter }
    }
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, k, _)| k)
    }
}

/// Entries of one table bucket whose key compares `Equal` to a probe key
pub struct FindAll<'a, F> {
    table: u64,
    bucket: usize,
    inner: Option<Matches<'a, F>>,
}

impl<'a, F> FindAll<'a, F> {
    pub(crate) fn new(table: u64, bucket: usize, inner: Option<Matches<'a, F>>) -> Self {
        Self {
            table,
            bucket,
            inner,
        }
    }
}

impl<'a, F> Iterator for FindAll<'a, F>
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    type Item = EntryHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.inner.as_mut()?.next()?;
        Some(EntryHandle::new(self.table, self.bucket, node))
    }
}

/// Occupancy of each bucket in index order (unallocated buckets count 0)
pub struct BucketCounts<'a> {
    buckets: std::slice::Iter<'a, Option<KeyValueList>>,
}

impl<'a> BucketCounts<'a> {
    pub(crate) fn new(buckets: &'a [Option<KeyValueList>]) -> Self {
        Self {
            buckets: buckets.iter(),
        }
    }
}

impl Iterator for BucketCounts<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.buckets
            .next()
            .map(|bucket| bucket.as_ref().map_or(0, KeyValueList::len))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.buckets.size_hint()
    }
}

impl ExactSizeIterator for BucketCounts<'_> {}

impl<'a, H> IntoIterator for &'a HashTable<H> {
    type Item = (EntryHandle, &'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

use std::{
    cmp::Ordering,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};

use log::{debug, trace};

use crate::{
    buffer::ByteBuffer,
    error::{Result, TableError},
    hash::{BucketHasher, HashFunction},
    iter::{BucketCounts, FindAll, Iter, Keys},
    list::{KeyValueList, NodeHandle},
};

/// Reference to an entry of a `HashTable`: the bucket plus the node inside it
///
/// Like `NodeHandle`, it does not borrow the table and is checked on every use.
/// A handle is only accepted by the table that issued it, and never resolves
/// after that table's `clear`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    table: u64,
    bucket: usize,
    node: NodeHandle,
}

impl EntryHandle {
    #[inline]
    pub(crate) fn new(table: u64, bucket: usize, node: NodeHandle) -> Self {
        Self {
            table,
            bucket,
            node,
        }
    }

    /// Bucket the entry lives in
    #[inline]
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Node handle inside that bucket's list
    #[inline]
    pub fn node(&self) -> NodeHandle {
        self.node
    }
}

/// A fixed-capacity chained hash multimap over opaque byte keys and values
///
/// `HashTable` owns `capacity` bucket slots. A slot stays empty until the first
/// insert that hashes to it, then owns a `KeyValueList` for the table's lifetime.
/// The table never resizes, so every entry stays in the bucket its key hashed
/// to. Inserting an existing key adds a second entry: this is a multimap.
pub struct HashTable<H = HashFunction> {
    /// Stamped into every handle this table issues
    id: u64,
    buckets: Box<[Option<KeyValueList>]>,
    len: usize,
    hasher: H,
}

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

impl HashTable<HashFunction> {
    /// Create an empty table using one of the built-in hash functions
    #[inline]
    pub fn new(capacity: usize, hash_function: HashFunction) -> Result<Self> {
        Self::with_hasher(capacity, hash_function)
    }
}

impl<H> HashTable<H> {
    /// Returns the number of entries in the table
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets (fixed at construction)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns a reference to the hasher
    #[inline]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// List behind bucket `index`, if that bucket has been created
    #[inline]
    pub fn bucket(&self, index: usize) -> Option<&KeyValueList> {
        self.buckets.get(index)?.as_ref()
    }

    /// Returns `true` if bucket `index` has been created
    #[inline]
    pub fn is_bucket_allocated(&self, index: usize) -> bool {
        self.bucket(index).is_some()
    }

    /// Number of buckets that have been created
    pub fn allocated_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.is_some()).count()
    }

    /// Number of entries in bucket `index`
    pub fn bucket_len(&self, index: usize) -> Result<usize> {
        match self.buckets.get(index) {
            Some(bucket) => Ok(bucket.as_ref().map_or(0, KeyValueList::len)),
            None => Err(TableError::InvalidArgument("bucket index out of range")),
        }
    }

    /// Per-bucket entry counts in index order
    #[inline]
    pub fn bucket_counts(&self) -> BucketCounts<'_> {
        BucketCounts::new(&self.buckets)
    }

    #[inline]
    fn list_for(&self, handle: EntryHandle) -> Option<&KeyValueList> {
        if handle.table != self.id {
            return None;
        }
        self.bucket(handle.bucket)
    }

    /// Key of the entry at `handle`
    pub fn key(&self, handle: EntryHandle) -> Option<&[u8]> {
        self.list_for(handle)?.key(handle.node)
    }

    /// Value of the entry at `handle`
    pub fn value(&self, handle: EntryHandle) -> Option<&[u8]> {
        self.list_for(handle)?.value(handle.node)
    }

    /// Key and value of the entry at `handle`
    pub fn get(&self, handle: EntryHandle) -> Option<(&ByteBuffer, &ByteBuffer)> {
        self.list_for(handle)?.entry(handle.node)
    }

    /// Returns `true` if `handle` still names a live entry
    #[inline]
    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.list_for(handle)
            .is_some_and(|list| list.contains(handle.node))
    }

    /// Remove the entry at `handle`, returning its key and value
    pub fn remove_entry(&mut self, handle: EntryHandle) -> Result<(ByteBuffer, ByteBuffer)> {
        let stale = TableError::InvalidArgument("stale or foreign node handle");
        if handle.table != self.id {
            return Err(stale);
        }
        let list = self
            .buckets
            .get_mut(handle.bucket)
            .and_then(Option::as_mut)
            .ok_or(stale)?;

        let removed = list.remove_node(handle.node)?;
        self.len -= 1;
        trace!("remove_entry: bucket {}, len {}", handle.bucket, self.len);

        Ok(removed)
    }

    /// Iterate every entry, bucket by bucket
    pub fn iter(&self) -> Iter<'_> {
        let id = self.id;
        Iter::new(
            self.buckets
                .iter()
                .enumerate()
                .filter_map(|(i, bucket)| bucket.as_ref().map(|list| (i, list)))
                .flat_map(move |(i, list)| {
                    list.iter()
                        .map(move |(node, k, v)| (EntryHandle::new(id, i, node), k, v))
                }),
        )
    }

    /// Iterate every key, bucket by bucket
    #[inline]
    pub fn keys(&self) -> Keys<'_> {
        Keys::new(self.iter())
    }

    /// Drop every bucket list; all slots return to empty
    pub fn clear(&mut self) {
        if self.len == 0 && self.allocated_buckets() == 0 {
            return;
        }
        debug!(
            "clearing table: {} entries in {} buckets",
            self.len,
            self.allocated_buckets()
        );
        for bucket in self.buckets.iter_mut() {
            *bucket = None;
        }
        // handles into the dropped lists die with them: new lists get new ids
        self.len = 0;
    }
}

impl<H> HashTable<H>
where
    H: BucketHasher,
{
    /// Create an empty table with `capacity` buckets and the given hasher
    ///
    /// No bucket list is allocated until something is inserted into it.
    pub fn with_hasher(capacity: usize, hasher: H) -> Result<Self> {
        if capacity == 0 {
            return Err(TableError::InvalidArgument("capacity must be non-zero"));
        }

        let mut buckets = Vec::new();
        buckets.try_reserve_exact(capacity)?;
        buckets.resize_with(capacity, || None);

        debug!("created table with {capacity} buckets");

        Ok(Self {
            id: NEXT_TABLE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            buckets: buckets.into_boxed_slice(),
            len: 0,
            hasher,
        })
    }

    /// Bucket index for `key`, rejecting out-of-range hash results
    pub fn bucket_index(&self, key: &[u8]) -> Result<usize> {
        let capacity = self.capacity();
        let index = self.hasher.bucket_index(key, capacity);

        if index >= capacity {
            debug!("hash function returned bucket {index} for a table of {capacity}");
            return Err(TableError::OutOfRange { index, capacity });
        }
        Ok(index)
    }

    /// Append an entry holding copies of `key` and `value`
    ///
    /// No duplicate check is made: inserting the same key twice yields two
    /// entries. An empty `value` stands for an absent one.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<EntryHandle> {
        let index = self.bucket_index(key)?;

        let created = self.buckets[index].is_none();
        let list = self.buckets[index].get_or_insert_with(|| {
            trace!("allocating bucket {index}");
            KeyValueList::new()
        });

        let node = match list.push_back(key, value) {
            Ok(node) => node,
            Err(err) => {
                if created {
                    self.buckets[index] = None;
                }
                return Err(err);
            }
        };

        self.len += 1;
        trace!("insert: bucket {index}, len {}", self.len);

        Ok(EntryHandle::new(self.id, index, node))
    }

    /// Append an entry only if no entry with an equal key exists
    pub fn insert_unique<F>(&mut self, key: &[u8], value: &[u8], key_cmp: F) -> Result<EntryHandle>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        match self.find(key, key_cmp) {
            Ok(_) => Err(TableError::DuplicateKey),
            Err(TableError::NotFound) => self.insert(key, value),
            Err(err) => Err(err),
        }
    }

    /// First entry, in insertion order, whose key compares `Equal` to `key`
    ///
    /// Never creates a bucket: a lookup into a bucket that was never populated
    /// returns `NotFound` straight away.
    pub fn find<F>(&self, key: &[u8], key_cmp: F) -> Result<EntryHandle>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        let index = self.bucket_index(key)?;
        let node = self.buckets[index]
            .as_ref()
            .and_then(|list| list.find_node(key, key_cmp))
            .ok_or(TableError::NotFound)?;

        Ok(EntryHandle::new(self.id, index, node))
    }

    /// Every entry whose key compares `Equal` to `key`, in insertion order
    pub fn find_all<'a, F>(&'a self, key: &'a [u8], key_cmp: F) -> Result<FindAll<'a, F>>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        let index = self.bucket_index(key)?;
        let matches = self.buckets[index]
            .as_ref()
            .map(|list| list.find_nodes(key, key_cmp));

        Ok(FindAll::new(self.id, index, matches))
    }

    /// Number of entries whose key compares `Equal` to `key`
    pub fn count<F>(&self, key: &[u8], key_cmp: F) -> Result<usize>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        Ok(self.find_all(key, key_cmp)?.count())
    }

    /// Returns `true` if some entry's key compares `Equal` to `key`
    pub fn contains_key<F>(&self, key: &[u8], key_cmp: F) -> bool
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        self.find(key, key_cmp).is_ok()
    }

    /// Remove the first entry whose key compares `Equal` to `key`
    pub fn delete<F>(&mut self, key: &[u8], key_cmp: F) -> Result<()>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        let handle = self.find(key, key_cmp)?;
        self.remove_entry(handle).map(|_| ())
    }
}

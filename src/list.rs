//! Circular doubly-linked list of owned key/value byte buffers.
//!
//! - Nodes live in a slab of slots; links are slot indices, not pointers
//! - Vacated slots go on a LIFO free list and are reused by later inserts
//! - Every slot carries a generation, bumped when the slot is freed, so a
//!   `NodeHandle` to a deleted node is rejected instead of aliasing its successor
//! - No sentinel: the list remembers `head`, and `head.prev` is the tail
//! - Every list gets a process-unique id, carried by its handles, so a handle
//!   presented to the wrong list is rejected

use std::{
    cmp::Ordering,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};

use log::trace;

use crate::{
    buffer::ByteBuffer,
    error::{Result, TableError},
    iter::{ListIter, Matches},
};

/// Non-owning reference to a node of a `KeyValueList`
///
/// Handles are plain values: holding one does not borrow the list. Each access
/// checks the handle's generation against the slot, so a handle outliving its
/// node fails with `InvalidArgument` rather than reading whatever reused the slot.
/// Handles also name their list, so another list never accepts them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    list: u64,
    index: usize,
    generation: u32,
}

impl NodeHandle {
    /// Slot index inside the owning list
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A list node: owned key, owned value and ring links
pub(crate) struct Node {
    pub(crate) key: ByteBuffer,
    pub(crate) value: ByteBuffer,
    prev: usize,
    next: usize,
}

enum SlotState {
    Occupied(Node),
    Vacant { next_free: Option<usize> },
}

struct Slot {
    generation: u32,
    state: SlotState,
}

/// Where a node sits in the ring, decided before unlinking it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RingPosition {
    /// Only node in the list
    Sole,
    /// First of several nodes
    Head,
    /// Any other node
    Interior,
}

/// Where a new node gets linked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    /// List is empty: the node becomes a self-linked head
    Empty,
    /// Link right after this slot
    After(usize),
}

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(0);

/// Circular doubly-linked list whose nodes own a key buffer and a value buffer
pub struct KeyValueList {
    /// Stamped into every handle this list issues
    id: u64,

    /// Node storage (owns every node)
    slots: Vec<Slot>,

    /// Most recently vacated slot
    free_head: Option<usize>,

    /// First node in ring order
    head: Option<usize>,

    /// Number of live nodes
    len: usize,

    /// Generation given to freshly pushed slots; raised by `clear`
    generation_floor: u32,
}

impl Default for KeyValueList {
    fn default() -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, AtomicOrdering::Relaxed),
            slots: Vec::new(),
            free_head: None,
            head: None,
            len: 0,
            generation_floor: 0,
        }
    }
}

impl KeyValueList {
    /// Create an empty list
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the list
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the first node
    #[inline]
    pub fn head(&self) -> Option<NodeHandle> {
        self.head.map(|idx| self.handle_at(idx))
    }

    /// Handle of the last node (`head.prev`)
    #[inline]
    pub fn tail(&self) -> Option<NodeHandle> {
        self.head.map(|idx| self.handle_at(self.node_at(idx).prev))
    }

    /// Check that `handle` still refers to a live node of this list
    #[inline]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Key stored at `handle`
    pub fn key(&self, handle: NodeHandle) -> Option<&[u8]> {
        let idx = self.resolve(handle).ok()?;
        Some(self.node_at(idx).key.as_bytes())
    }

    /// Value stored at `handle` (empty if the node was inserted without one)
    pub fn value(&self, handle: NodeHandle) -> Option<&[u8]> {
        let idx = self.resolve(handle).ok()?;
        Some(self.node_at(idx).value.as_bytes())
    }

    /// Key and value stored at `handle`
    pub fn entry(&self, handle: NodeHandle) -> Option<(&ByteBuffer, &ByteBuffer)> {
        let idx = self.resolve(handle).ok()?;
        let node = self.node_at(idx);
        Some((&node.key, &node.value))
    }

    /// Following node in ring order (wraps from tail back to head)
    pub fn next(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let idx = self.resolve(handle).ok()?;
        Some(self.handle_at(self.node_at(idx).next))
    }

    /// Preceding node in ring order (wraps from head back to tail)
    pub fn prev(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let idx = self.resolve(handle).ok()?;
        Some(self.handle_at(self.node_at(idx).prev))
    }

    /// Insert a node holding copies of `key` and `value`
    ///
    /// - `Some(prev)`: the node is linked right after `prev`
    /// - `None` on an empty list: the node becomes the sole, self-linked head
    /// - `None` on a non-empty list: the node is linked before `head`, at the
    ///   tail end of the ring, and `head` is left alone
    ///
    /// An empty `value` stands for an absent one.
    pub fn insert(
        &mut self,
        prev: Option<NodeHandle>,
        key: &[u8],
        value: &[u8],
    ) -> Result<NodeHandle> {
        let anchor = match prev {
            Some(handle) => Anchor::After(self.resolve(handle)?),
            None => match self.head {
                None => Anchor::Empty,
                Some(head) => Anchor::After(self.node_at(head).prev),
            },
        };

        // copy the buffers and claim a slot before touching any links,
        // so an allocation failure leaves the ring untouched
        let key = ByteBuffer::copy_from(key)?;
        let value = ByteBuffer::copy_from(value)?;
        let idx = self.alloc(key, value)?;

        match anchor {
            Anchor::Empty => {
                // alloc() already made the node point at itself
                self.head = Some(idx);
            }
            Anchor::After(prev_idx) => {
                let next_idx = self.node_at(prev_idx).next;
                self.link(prev_idx, idx, next_idx);
            }
        }

        self.len += 1;
        trace!("list insert: slot {idx}, len {}", self.len);

        Ok(self.handle_at(idx))
    }

    /// Append after the tail, preserving insertion order from `head`
    #[inline]
    pub fn push_back(&mut self, key: &[u8], value: &[u8]) -> Result<NodeHandle> {
        let tail = self.tail();
        self.insert(tail, key, value)
    }

    /// Insert before `head` and make the new node the head
    pub fn push_front(&mut self, key: &[u8], value: &[u8]) -> Result<NodeHandle> {
        let handle = self.insert(None, key, value)?;
        self.head = Some(handle.index);
        Ok(handle)
    }

    /// Unlink the node at `handle` and release its buffers
    #[inline]
    pub fn delete_node(&mut self, handle: NodeHandle) -> Result<()> {
        self.remove_node(handle).map(|_| ())
    }

    /// Unlink the node at `handle`, returning its key and value
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<(ByteBuffer, ByteBuffer)> {
        let idx = self.resolve(handle)?;
        let (prev_idx, next_idx) = {
            let node = self.node_at(idx);
            (node.prev, node.next)
        };

        match self.position(idx) {
            RingPosition::Sole => {
                self.head = None;
            }
            RingPosition::Head => {
                self.node_at_mut(prev_idx).next = next_idx;
                self.node_at_mut(next_idx).prev = prev_idx;
                self.head = Some(next_idx);
            }
            RingPosition::Interior => {
                self.node_at_mut(prev_idx).next = next_idx;
                self.node_at_mut(next_idx).prev = prev_idx;
            }
        }

        let node = self.free(idx);
        self.len -= 1;
        trace!("list delete: slot {idx}, len {}", self.len);

        Ok((node.key, node.value))
    }

    /// First node, scanning from `head`, whose key compares `Equal` to `key`
    ///
    /// `key_cmp` receives the stored key first and the probe second.
    pub fn find_node<F>(&self, key: &[u8], key_cmp: F) -> Option<NodeHandle>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        self.find_nodes(key, key_cmp).next()
    }

    /// Every node whose key compares `Equal` to `key`, in ring order from `head`
    #[inline]
    pub fn find_nodes<'a, F>(&'a self, key: &'a [u8], key_cmp: F) -> Matches<'a, F>
    where
        F: Fn(&[u8], &[u8]) -> Ordering,
    {
        Matches::new(self.iter(), key, key_cmp)
    }

    /// Iterate `(handle, key, value)` in ring order from `head`
    #[inline]
    pub fn iter(&self) -> ListIter<'_> {
        ListIter::new(self)
    }

    /// Release every node and all slot storage
    ///
    /// Handles issued before the clear stay stale: new slots start above every
    /// generation handed out so far.
    pub fn clear(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let highest = self
            .slots
            .iter()
            .map(|slot| slot.generation)
            .max()
            .unwrap_or(0);
        self.generation_floor = self.generation_floor.max(highest.wrapping_add(1));

        self.slots = Vec::new();
        self.free_head = None;
        self.head = None;
        self.len = 0;
    }

    /// Index of the head slot
    #[inline]
    pub(crate) fn head_index(&self) -> Option<usize> {
        self.head
    }

    /// Live node in slot `idx`
    ///
    /// Callers only pass indices taken from `head` or from another node's links,
    /// which always name occupied slots.
    #[inline]
    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        match &self.slots[idx].state {
            SlotState::Occupied(node) => node,
            SlotState::Vacant { .. } => unreachable!("ring link to vacant slot {idx}"),
        }
    }

    #[inline]
    fn node_at_mut(&mut self, idx: usize) -> &mut Node {
        match &mut self.slots[idx].state {
            SlotState::Occupied(node) => node,
            SlotState::Vacant { .. } => unreachable!("ring link to vacant slot {idx}"),
        }
    }

    #[inline]
    pub(crate) fn next_index(&self, idx: usize) -> usize {
        self.node_at(idx).next
    }

    #[inline]
    pub(crate) fn handle_at(&self, idx: usize) -> NodeHandle {
        NodeHandle {
            list: self.id,
            index: idx,
            generation: self.slots[idx].generation,
        }
    }

    /// Map a handle to its slot, rejecting stale or foreign handles
    fn resolve(&self, handle: NodeHandle) -> Result<usize> {
        if handle.list != self.id {
            return Err(TableError::InvalidArgument("stale or foreign node handle"));
        }
        match self.slots.get(handle.index) {
            Some(Slot {
                generation,
                state: SlotState::Occupied(_),
            }) if *generation == handle.generation => Ok(handle.index),
            _ => Err(TableError::InvalidArgument("stale or foreign node handle")),
        }
    }

    fn position(&self, idx: usize) -> RingPosition {
        if self.node_at(idx).next == idx {
            RingPosition::Sole
        } else if self.head == Some(idx) {
            RingPosition::Head
        } else {
            RingPosition::Interior
        }
    }

    /// Splice `idx` between `prev_idx` and `next_idx`
    #[inline]
    fn link(&mut self, prev_idx: usize, idx: usize, next_idx: usize) {
        {
            let node = self.node_at_mut(idx);
            node.prev = prev_idx;
            node.next = next_idx;
        }
        self.node_at_mut(prev_idx).next = idx;
        self.node_at_mut(next_idx).prev = idx;
    }

    /// Store a self-linked node, reusing a vacant slot when there is one
    fn alloc(&mut self, key: ByteBuffer, value: ByteBuffer) -> Result<usize> {
        match self.free_head {
            Some(idx) => {
                let slot = &mut self.slots[idx];
                self.free_head = match slot.state {
                    SlotState::Vacant { next_free } => next_free,
                    SlotState::Occupied(_) => unreachable!("free list names occupied slot {idx}"),
                };
                slot.state = SlotState::Occupied(Node {
                    key,
                    value,
                    prev: idx,
                    next: idx,
                });
                Ok(idx)
            }
            None => {
                self.slots.try_reserve(1)?;
                let idx = self.slots.len();
                self.slots.push(Slot {
                    generation: self.generation_floor,
                    state: SlotState::Occupied(Node {
                        key,
                        value,
                        prev: idx,
                        next: idx,
                    }),
                });
                Ok(idx)
            }
        }
    }

    /// Vacate slot `idx`, invalidating every outstanding handle to it
    fn free(&mut self, idx: usize) -> Node {
        let slot = &mut self.slots[idx];
        slot.generation = slot.generation.wrapping_add(1);
        let state = std::mem::replace(
            &mut slot.state,
            SlotState::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(idx);

        match state {
            SlotState::Occupied(node) => node,
            SlotState::Vacant { .. } => unreachable!("double free of slot {idx}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::length_first;

    fn keys(list: &KeyValueList) -> Vec<Vec<u8>> {
        list.iter().map(|(_, k, _)| k.to_vec()).collect()
    }

    /// Walk the ring both ways and check it closes after exactly `len` steps
    fn assert_ring(list: &KeyValueList) {
        let Some(head) = list.head() else {
            assert_eq!(list.len(), 0);
            assert!(list.tail().is_none());
            return;
        };

        let mut cur = head;
        for _ in 0..list.len() {
            let next = list.next(cur).unwrap();
            assert_eq!(list.prev(next), Some(cur), "prev/next not inverse");
            cur = next;
        }
        assert_eq!(cur, head, "forward walk did not return to head");

        for _ in 0..list.len() {
            cur = list.prev(cur).unwrap();
        }
        assert_eq!(cur, head, "backward walk did not return to head");
        assert_eq!(list.tail(), list.prev(head));
    }

    #[test]
    fn test_new_list() {
        let list = KeyValueList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.head().is_none());
        assert_ring(&list);
    }

    #[test]
    fn test_sole_node_is_self_linked() {
        let mut list = KeyValueList::new();
        let node = list.insert(None, b"only", b"").unwrap();

        assert_eq!(list.head(), Some(node));
        assert_eq!(list.tail(), Some(node));
        assert_eq!(list.next(node), Some(node));
        assert_eq!(list.prev(node), Some(node));
        assert_eq!(list.value(node), Some(&b""[..]));
    }

    #[test]
    fn test_push_back_keeps_insertion_order() {
        let mut list = KeyValueList::new();
        for key in [b"a", b"b", b"c", b"d"] {
            list.push_back(key, b"v").unwrap();
        }

        assert_eq!(keys(&list), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
        assert_ring(&list);
    }

    #[test]
    fn test_push_front_moves_head() {
        let mut list = KeyValueList::new();
        list.push_back(b"b", b"").unwrap();
        list.push_back(b"c", b"").unwrap();
        let front = list.push_front(b"a", b"").unwrap();

        assert_eq!(list.head(), Some(front));
        assert_eq!(keys(&list), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_ring(&list);
    }

    #[test]
    fn test_insert_after_node() {
        let mut list = KeyValueList::new();
        let a = list.push_back(b"a", b"").unwrap();
        list.push_back(b"c", b"").unwrap();
        list.insert(Some(a), b"b", b"").unwrap();

        assert_eq!(keys(&list), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_ring(&list);
    }

    #[test]
    fn test_insert_without_prev_on_non_empty_appends() {
        let mut list = KeyValueList::new();
        let head = list.push_back(b"a", b"").unwrap();
        list.insert(None, b"b", b"").unwrap();

        assert_eq!(list.head(), Some(head));
        assert_eq!(keys(&list), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_delete_head_interior_and_sole() {
        let mut list = KeyValueList::new();
        let a = list.push_back(b"a", b"").unwrap();
        let b = list.push_back(b"b", b"").unwrap();
        let c = list.push_back(b"c", b"").unwrap();

        list.delete_node(b).unwrap();
        assert_eq!(keys(&list), vec![b"a".to_vec(), b"c".to_vec()]);
        assert_ring(&list);

        list.delete_node(a).unwrap();
        assert_eq!(list.head(), Some(c));
        assert_ring(&list);

        list.delete_node(c).unwrap();
        assert!(list.is_empty());
        assert!(list.head().is_none());
    }

    #[test]
    fn test_stale_handle_rejected_after_reuse() {
        let mut list = KeyValueList::new();
        let old = list.push_back(b"old", b"").unwrap();
        list.delete_node(old).unwrap();

        // the freed slot is reused, but with a new generation
        let new = list.push_back(b"new", b"").unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());

        assert!(list.key(old).is_none());
        assert!(!list.contains(old));
        assert_eq!(
            list.delete_node(old),
            Err(TableError::InvalidArgument("stale or foreign node handle"))
        );
        assert_eq!(list.key(new), Some(&b"new"[..]));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut first = KeyValueList::new();
        let mut second = KeyValueList::new();

        // same slot index and generation in both lists
        let theirs = first.push_back(b"alpha", b"A").unwrap();
        let ours = second.push_back(b"alpha", b"B").unwrap();
        assert_eq!(theirs.index(), ours.index());
        assert_eq!(theirs.generation(), ours.generation());
        assert_ne!(theirs, ours);

        assert!(!second.contains(theirs));
        assert!(second.value(theirs).is_none());
        assert!(second.next(theirs).is_none());
        assert_eq!(
            second.delete_node(theirs),
            Err(TableError::InvalidArgument("stale or foreign node handle"))
        );
        assert!(second.insert(Some(theirs), b"x", b"").is_err());
        assert_eq!(second.len(), 1);
        assert_eq!(second.value(ours), Some(&b"B"[..]));
        assert_eq!(first.value(theirs), Some(&b"A"[..]));
    }

    #[test]
    fn test_insert_after_stale_handle_leaves_list_unchanged() {
        let mut list = KeyValueList::new();
        let a = list.push_back(b"a", b"").unwrap();
        list.push_back(b"b", b"").unwrap();
        list.delete_node(a).unwrap();

        assert!(list.insert(Some(a), b"x", b"").is_err());
        assert_eq!(keys(&list), vec![b"b".to_vec()]);
    }

    #[test]
    fn test_find_returns_first_match() {
        let mut list = KeyValueList::new();
        list.push_back(b"dup", b"1").unwrap();
        list.push_back(b"other", b"2").unwrap();
        list.push_back(b"dup", b"3").unwrap();

        let found = list.find_node(b"dup", length_first).unwrap();
        assert_eq!(list.value(found), Some(&b"1"[..]));
        assert_eq!(list.find_nodes(b"dup", length_first).count(), 2);
        assert!(list.find_node(b"missing", length_first).is_none());
    }

    #[test]
    fn test_find_after_push_front_prefers_newest() {
        let mut list = KeyValueList::new();
        list.push_back(b"k", b"old").unwrap();
        list.push_front(b"k", b"new").unwrap();

        let found = list.find_node(b"k", length_first).unwrap();
        assert_eq!(list.value(found), Some(&b"new"[..]));
    }

    #[test]
    fn test_remove_node_returns_buffers() {
        let mut list = KeyValueList::new();
        let node = list.push_back(b"key", b"value").unwrap();

        let (key, value) = list.remove_node(node).unwrap();
        assert_eq!(key.as_bytes(), b"key");
        assert_eq!(value.as_bytes(), b"value");
        assert!(list.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut list = KeyValueList::new();
        list.clear();
        assert!(list.is_empty());

        let node = list.push_back(b"a", b"").unwrap();
        list.push_back(b"b", b"").unwrap();
        list.clear();

        assert!(list.is_empty());
        assert!(list.head().is_none());
        assert!(!list.contains(node));

        // the slot index is reused, the old handle must not see the new node
        let fresh = list.push_back(b"c", b"").unwrap();
        assert_eq!(fresh.index(), node.index());
        assert!(!list.contains(node));
        assert!(list.key(node).is_none());
        assert_eq!(keys(&list), vec![b"c".to_vec()]);
    }

    #[test]
    fn test_random_ops_keep_ring_consistent() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(7);
        let mut list = KeyValueList::new();
        let mut live: Vec<NodeHandle> = Vec::new();

        for i in 0u32..2000 {
            let key = i.to_le_bytes();
            match rng.gen_range(0..4) {
                0 => live.push(list.push_back(&key, b"").unwrap()),
                1 => live.push(list.push_front(&key, b"").unwrap()),
                2 if !live.is_empty() => {
                    let prev = live[rng.gen_range(0..live.len())];
                    live.push(list.insert(Some(prev), &key, b"").unwrap());
                }
                _ if !live.is_empty() => {
                    let victim = live.swap_remove(rng.gen_range(0..live.len()));
                    list.delete_node(victim).unwrap();
                }
                _ => {}
            }
            assert_eq!(list.len(), live.len());
        }

        assert_ring(&list);
        assert_eq!(list.iter().count(), live.len());
        for handle in live {
            assert!(list.contains(handle));
        }
    }
}

//! View-history tracking for the task manager.
//!
//! Every fetch by id is recorded here as a "view". The history is a
//! recency-ordered, duplicate-free sequence: viewing an item again moves it
//! to the most-recent end instead of adding a second entry, and deleting a
//! record from the store withdraws it from the history.
//!
//! The list is a doubly linked sequence laid out in a slab of reusable
//! slots, paired with an id-to-slot index. Both are needed: the links give
//! O(1) splice-out at any known position, and the index resolves an id to
//! its slot without a scan, so `add`, `remove`, and re-add all stay O(1)
//! no matter how long the history grows.

use std::collections::HashMap;

use crate::task::{TaskId, TaskItem};

type SlotIdx = usize;

#[derive(Debug, Clone)]
struct Node {
    item: TaskItem,
    prev: Option<SlotIdx>,
    next: Option<SlotIdx>,
}

/// Recency-ordered, duplicate-free list of viewed items.
///
/// Unbounded by default; [`ViewHistory::with_capacity_limit`] bounds the
/// length and evicts the oldest entry on overflow.
#[derive(Debug, Clone, Default)]
pub struct ViewHistory {
    /// Node slab; vacant slots are `None` and tracked on the free list.
    slots: Vec<Option<Node>>,
    free: Vec<SlotIdx>,
    /// Which slot currently holds each id.
    index: HashMap<TaskId, SlotIdx>,
    /// Least recently viewed.
    head: Option<SlotIdx>,
    /// Most recently viewed.
    tail: Option<SlotIdx>,
    capacity: Option<usize>,
}

impl ViewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History bounded to `capacity` entries; adding a new id beyond the
    /// bound evicts the least recently viewed entry first.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Record a view of `item`, making it the most recent entry.
    ///
    /// If the id is already present its old entry is dropped first, so each
    /// id occurs at most once and the stored payload is always the one most
    /// recently passed in.
    pub fn add(&mut self, item: TaskItem) {
        let id = item.id();
        if let Some(slot) = self.index.remove(&id) {
            self.unlink(slot);
            self.release(slot);
        } else if let Some(capacity) = self.capacity {
            if self.index.len() >= capacity {
                self.evict_oldest();
            }
        }

        let slot = self.acquire(Node {
            item,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => {
                if let Some(node) = self.slots[tail].as_mut() {
                    node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(id, slot);
    }

    /// Withdraw `id` from the history. Absent ids are a no-op.
    pub fn remove(&mut self, id: TaskId) {
        if let Some(slot) = self.index.remove(&id) {
            self.unlink(slot);
            self.release(slot);
        }
    }

    /// Withdraw every id in `ids`. The relative order of the remaining
    /// entries is untouched, whatever the iteration order.
    pub fn remove_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = TaskId>,
    {
        for id in ids {
            self.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Snapshot of the history, least recently viewed first.
    ///
    /// The returned items are owned clones; later mutation of the tracker
    /// does not touch a snapshot already handed out.
    pub fn items(&self) -> Vec<TaskItem> {
        let mut items = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let Some(node) = self.slots[slot].as_ref() else {
                break;
            };
            items.push(node.item.clone());
            cursor = node.next;
        }
        items
    }

    fn evict_oldest(&mut self) {
        let Some(slot) = self.head else { return };
        let Some(id) = self.slots[slot].as_ref().map(|node| node.item.id()) else {
            return;
        };
        self.index.remove(&id);
        self.unlink(slot);
        self.release(slot);
    }

    /// Splice the node out of the chain, closing the gap between its
    /// neighbors. The slot itself stays occupied until released.
    fn unlink(&mut self, slot: SlotIdx) {
        let Some((prev, next)) = self.slots[slot].as_ref().map(|node| (node.prev, node.next))
        else {
            return;
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.slots[prev].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(node) = self.slots[next].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn acquire(&mut self, node: Node) -> SlotIdx {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: SlotIdx) {
        self.slots[slot] = None;
        self.free.push(slot);
    }
}

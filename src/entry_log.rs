//! EntryLog: insertion-ordered record of live keys.
//!
//! A doubly linked list threaded through a `SlotMap`, so a key can be
//! unlinked in O(1) given the `EntryId` its chain link carries. Only keys are
//! stored; values stay in the chain links and are resolved through the table.

use slotmap::{new_key_type, SlotMap};
use std::rc::Rc;

new_key_type! {
    /// Generational handle of one entry in the log.
    pub(crate) struct EntryId;
}

#[derive(Debug)]
struct Node {
    key: Rc<str>,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

#[derive(Debug, Default)]
pub(crate) struct EntryLog {
    nodes: SlotMap<EntryId, Node>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
}

impl EntryLog {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Append `key` as the most recently inserted entry.
    pub(crate) fn push_back(&mut self, key: Rc<str>) -> EntryId {
        let prev = self.tail;
        let id = self.nodes.insert(Node {
            key,
            prev,
            next: None,
        });
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Unlink the entry. Stale ids are ignored.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Rc<str>> {
        let node = self.nodes.remove(id)?;

        match node.prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.nodes.get_mut(n)) {
            Some(n) => n.prev = node.prev,
            None => self.tail = node.prev,
        }

        Some(node.key)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            log: self,
            cur: self.head,
            remaining: self.nodes.len(),
        }
    }
}

/// Keys in insertion order.
pub(crate) struct Iter<'a> {
    log: &'a EntryLog,
    cur: Option<EntryId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Rc<str>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.log.nodes.get(self.cur?)?;
        self.cur = node.next;
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

//! Chain links: owned singly linked nodes hanging off a bucket slot.

use crate::entry_log::EntryId;
use std::rc::Rc;

/// A bucket slot, or the `next` field of a link. Either way it exclusively
/// owns the rest of the chain.
pub(crate) type Slot<V> = Option<Box<Link<V>>>;

#[derive(Debug)]
pub(crate) struct Link<V> {
    pub(crate) key: Rc<str>,
    pub(crate) value: V,
    pub(crate) next: Slot<V>,
    // position of this pair in the entry log
    pub(crate) entry: EntryId,
}

impl<V> Link<V> {
    pub(crate) fn new(key: Rc<str>, value: V, entry: EntryId) -> Box<Self> {
        Box::new(Link {
            key,
            value,
            next: None,
            entry,
        })
    }
}

/// Walk `depth` links down from `slot` and return the slot found there:
/// `depth == 0` is the bucket slot itself, `depth == n` is the `next` field
/// of the n-th link. Stops early at the end of the chain.
pub(crate) fn slot_at<V>(mut slot: &mut Slot<V>, depth: usize) -> &mut Slot<V> {
    for _ in 0..depth {
        match slot {
            Some(link) => slot = &mut link.next,
            None => break,
        }
    }
    slot
}

/// The empty slot past the last link of the chain.
pub(crate) fn tail_slot<V>(mut slot: &mut Slot<V>) -> &mut Slot<V> {
    while let Some(link) = slot {
        slot = &mut link.next;
    }
    slot
}

/// Detach the link stored in `slot`, splicing its successor into its place.
pub(crate) fn unlink<V>(slot: &mut Slot<V>) -> Option<Box<Link<V>>> {
    let mut link = slot.take()?;
    *slot = link.next.take();
    Some(link)
}

/// Drop every link owned by `slot` without recursing through `Box` drops.
pub(crate) fn release<V>(slot: &mut Slot<V>) {
    let mut cur = slot.take();
    while let Some(mut link) = cur {
        cur = link.next.take();
    }
}

/// Borrowing iterator over the links of one chain, head first.
pub(crate) struct Chain<'a, V> {
    cur: Option<&'a Link<V>>,
}

impl<'a, V> Chain<'a, V> {
    pub(crate) fn new(slot: &'a Slot<V>) -> Self {
        Chain {
            cur: slot.as_deref(),
        }
    }
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a Link<V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let link = self.cur?;
        self.cur = link.next.as_deref();
        Some(link)
    }
}

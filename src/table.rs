//! ContainerTable: generational slot arena plus identifier index.
//!
//! Slots hold the optional element behind a `ContainerHandle`. The index
//! maps identifiers to slot keys and never owns a slot, so a binding can
//! outlive its slot; resolving such a binding yields `None`.

use core::hash::BuildHasher;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;

new_key_type! {
    /// Generational key naming one container slot.
    pub struct SlotKey;
}

#[derive(Debug)]
struct Slot<E> {
    element: Option<E>,
    // Bumped on every mutable access to `element`.
    version: u64,
}

/// What an identifier resolved to at one point in time. Two equal
/// revisions of the same identifier resolve to the same element.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Revision {
    slot: Option<SlotKey>,
    version: Option<u64>,
}

#[derive(Debug)]
struct Binding {
    id: String,
    hash: u64,
    slot: SlotKey,
}

pub(crate) struct ContainerTable<E, S = RandomState> {
    hasher: S,
    index: HashTable<Binding>,
    slots: SlotMap<SlotKey, Slot<E>>,
}

impl<E> ContainerTable<E> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<E> Default for ContainerTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, S> ContainerTable<E, S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    fn make_hash(&self, id: &str) -> u64 {
        self.hasher.hash_one(id)
    }

    /// Number of identifiers currently bound, stale or not.
    pub fn bindings_len(&self) -> usize {
        self.index.len()
    }

    pub fn live_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn alloc(&mut self) -> SlotKey {
        self.slots.insert(Slot {
            element: None,
            version: 0,
        })
    }

    /// Release a slot and hand back whatever element it still held.
    pub fn free(&mut self, key: SlotKey) -> Option<E> {
        self.slots.remove(key).and_then(|s| s.element)
    }

    pub fn element(&self, key: SlotKey) -> Option<&E> {
        self.slots.get(key).and_then(|s| s.element.as_ref())
    }

    /// Mutable access to the cell of a live slot. Counts as a change.
    pub fn cell_mut(&mut self, key: SlotKey) -> Option<&mut Option<E>> {
        self.slots.get_mut(key).map(|s| {
            s.version = s.version.wrapping_add(1);
            &mut s.element
        })
    }

    /// Bind `id` to `key`, replacing any previous binding. Returns the key
    /// that was bound before.
    pub fn bind(&mut self, id: &str, key: SlotKey) -> Option<SlotKey> {
        let hash = self.make_hash(id);
        match self.index.entry(hash, |b| b.id == id, |b| b.hash) {
            Entry::Occupied(mut o) => {
                let prev = o.get().slot;
                o.get_mut().slot = key;
                Some(prev)
            }
            Entry::Vacant(v) => {
                v.insert(Binding {
                    id: id.to_owned(),
                    hash,
                    slot: key,
                });
                None
            }
        }
    }

    pub fn unbind(&mut self, id: &str) -> Option<SlotKey> {
        let hash = self.make_hash(id);
        match self.index.find_entry(hash, |b| b.id == id) {
            Ok(o) => {
                let (b, _) = o.remove();
                Some(b.slot)
            }
            Err(_) => None,
        }
    }

    pub fn binding(&self, id: &str) -> Option<SlotKey> {
        let hash = self.make_hash(id);
        self.index.find(hash, |b| b.id == id).map(|b| b.slot)
    }

    /// Follow `id` to its slot and borrow the element, if any.
    pub fn resolve(&self, id: &str) -> Option<&E> {
        self.binding(id).and_then(|k| self.element(k))
    }

    pub fn revision(&self, id: &str) -> Revision {
        let slot = self.binding(id);
        let version = slot.and_then(|k| self.slots.get(k)).map(|s| s.version);
        Revision { slot, version }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.iter().map(|b| b.id.as_str())
    }

    /// Identifiers whose binding currently points at `key`.
    pub fn ids_bound_to(&self, key: SlotKey) -> Vec<String> {
        self.index
            .iter()
            .filter(|b| b.slot == key)
            .map(|b| b.id.clone())
            .collect()
    }

    /// Drop every binding whose slot has been freed; returns their ids.
    pub fn prune_stale(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .index
            .iter()
            .filter(|b| !self.slots.contains_key(b.slot))
            .map(|b| b.id.clone())
            .collect();
        for id in &stale {
            self.unbind(id);
        }
        stale
    }
}

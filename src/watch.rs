//! Change notifications for registry bindings and slot contents.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What happened to the container reachable through an identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChangeKind {
    /// The identifier now points at a different handle.
    Registered,
    /// The identifier was removed by `unregister` or `prune`.
    Unregistered,
    /// The handle behind the identifier received an element.
    Attached,
    /// The handle behind the identifier lost its element.
    Detached,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContainerEvent {
    pub id: String,
    pub kind: ChangeKind,
}

impl ContainerEvent {
    pub(crate) fn new(id: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

new_key_type! {
    struct WatchKey;
}

type Callback = Rc<dyn Fn(&ContainerEvent)>;

struct Watcher {
    filter: Option<String>,
    callback: Callback,
}

type WatcherSlots = RefCell<SlotMap<WatchKey, Watcher>>;

#[derive(Default)]
pub(crate) struct Watchers {
    slots: Rc<WatcherSlots>,
}

impl Watchers {
    pub fn subscribe(&self, filter: Option<String>, callback: Callback) -> Watch {
        let key = self
            .slots
            .borrow_mut()
            .insert(Watcher { filter, callback });
        Watch {
            slots: Rc::downgrade(&self.slots),
            key,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Deliver events in order. Matching callbacks are collected before any
    /// of them runs, so callbacks may subscribe, unsubscribe or mutate the
    /// registry.
    pub fn notify(&self, events: &[ContainerEvent]) {
        if events.is_empty() {
            return;
        }
        for event in events {
            let targets: Vec<Callback> = self
                .slots
                .borrow()
                .values()
                .filter(|w| w.filter.as_deref().map_or(true, |f| f == event.id))
                .map(|w| Rc::clone(&w.callback))
                .collect();
            for cb in targets {
                cb(event);
            }
        }
    }
}

/// RAII registration of a change callback. Dropping it unsubscribes.
#[must_use = "dropping a Watch unsubscribes immediately"]
pub struct Watch {
    slots: Weak<WatcherSlots>,
    key: WatchKey,
}

impl Watch {
    /// Whether the registry that issued this watch is still alive.
    pub fn is_active(&self) -> bool {
        self.slots
            .upgrade()
            .map_or(false, |s| s.borrow().contains_key(self.key))
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            // Release the borrow before the callback's captures are dropped.
            let removed = slots.borrow_mut().remove(self.key);
            drop(removed);
        }
    }
}

impl core::fmt::Debug for Watch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Watch").field("key", &self.key).finish()
    }
}

//! ContainerHandle: the owning side of a registry slot.

use crate::registry::{ContainerRegistry, Shared};
use crate::table::SlotKey;
use crate::watch::{ChangeKind, ContainerEvent};
use core::hash::{Hash, Hasher};
use std::rc::Rc;
use tracing::trace;

/// An ownership cell that may or may not hold a container element.
///
/// The component that created the handle owns it. The registry only keeps
/// the slot key, so dropping the handle frees the slot and every identifier
/// still bound to it resolves to `None` from then on.
pub struct ContainerHandle<E> {
    shared: Rc<Shared<E>>,
    key: SlotKey,
}

impl<E> ContainerHandle<E> {
    pub(crate) fn new(shared: Rc<Shared<E>>, key: SlotKey) -> Self {
        Self { shared, key }
    }

    pub(crate) fn key(&self) -> SlotKey {
        self.key
    }

    /// Whether this handle's slot lives in `registry`.
    pub fn belongs_to(&self, registry: &ContainerRegistry<E>) -> bool {
        Rc::ptr_eq(&self.shared, &registry.shared)
    }

    /// Store `element`, replacing the previous one. This is what a host
    /// framework does when it mounts the element the handle is bound to.
    pub fn attach(&self, element: E) -> Option<E> {
        let (prev, ids) = {
            let mut table = self.shared.table.borrow_mut();
            let prev = table
                .cell_mut(self.key)
                .and_then(|cell| cell.replace(element));
            (prev, table.ids_bound_to(self.key))
        };
        trace!(key = ?self.key, replaced = prev.is_some(), "container attached");
        self.announce(ids, ChangeKind::Attached);
        prev
    }

    /// Clear the cell and return what it held.
    pub fn detach(&self) -> Option<E> {
        let (prev, ids) = {
            let mut table = self.shared.table.borrow_mut();
            let prev = table.cell_mut(self.key).and_then(Option::take);
            (prev, table.ids_bound_to(self.key))
        };
        if prev.is_some() {
            trace!(key = ?self.key, "container detached");
            self.announce(ids, ChangeKind::Detached);
        }
        prev
    }

    pub fn is_attached(&self) -> bool {
        self.shared.table.borrow().element(self.key).is_some()
    }

    pub fn current(&self) -> Option<E>
    where
        E: Clone,
    {
        self.shared.table.borrow().element(self.key).cloned()
    }

    /// Borrow the element in place. `f` must not attach or detach.
    pub fn with_current<R>(&self, f: impl FnOnce(Option<&E>) -> R) -> R {
        let table = self.shared.table.borrow();
        f(table.element(self.key))
    }

    fn announce(&self, ids: Vec<String>, kind: ChangeKind) {
        let events: Vec<_> = ids
            .into_iter()
            .map(|id| ContainerEvent::new(id, kind))
            .collect();
        self.shared.watchers.notify(&events);
    }
}

impl<E> Drop for ContainerHandle<E> {
    fn drop(&mut self) {
        // Unlink first; the element is dropped once the table is released.
        let (element, ids) = {
            let mut table = self.shared.table.borrow_mut();
            let ids = table.ids_bound_to(self.key);
            (table.free(self.key), ids)
        };
        trace!(key = ?self.key, "container handle dropped");
        if element.is_some() {
            drop(element);
            self.announce(ids, ChangeKind::Detached);
        }
    }
}

impl<E> PartialEq for ContainerHandle<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared) && self.key == other.key
    }
}

impl<E> Eq for ContainerHandle<E> {}

impl<E> Hash for ContainerHandle<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.shared) as *const () as usize).hash(state);
        self.key.hash(state);
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for ContainerHandle<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let table = self.shared.table.borrow();
        f.debug_struct("ContainerHandle")
            .field("key", &self.key)
            .field("element", &table.element(self.key))
            .finish()
    }
}

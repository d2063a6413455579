//! ContainerRegistry: the shared, identity-stable context value.

use crate::error::RegistryError;
use crate::handle::ContainerHandle;
use crate::table::{ContainerTable, Revision, SlotKey};
use crate::watch::{ChangeKind, ContainerEvent, Watch, Watchers};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

pub(crate) struct Shared<E> {
    pub(crate) table: RefCell<ContainerTable<E>>,
    pub(crate) watchers: Watchers,
}

/// Shared mapping from identifiers to container handles.
///
/// Cloning is cheap and yields the same registry: clones compare equal and
/// every mutation through one clone is visible through all of them. This is
/// the value a provider hands to its descendants.
pub struct ContainerRegistry<E> {
    pub(crate) shared: Rc<Shared<E>>,
}

impl<E> Clone for ContainerRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<E> Default for ContainerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ContainerRegistry<E> {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                table: RefCell::new(ContainerTable::new()),
                watchers: Watchers::default(),
            }),
        }
    }

    /// True if both values refer to the same registry.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.shared, &b.shared)
    }

    /// Mint an empty handle whose slot lives in this registry.
    pub fn create_handle(&self) -> ContainerHandle<E> {
        let key = self.shared.table.borrow_mut().alloc();
        trace!(?key, "container handle created");
        ContainerHandle::new(Rc::clone(&self.shared), key)
    }

    /// File `handle` under `id`, replacing whatever was registered there.
    ///
    /// Registering the handle that is already bound is a no-op, so calling
    /// this on every render does not produce change events.
    pub fn register(&self, id: &str, handle: &ContainerHandle<E>) -> Result<(), RegistryError> {
        if !handle.belongs_to(self) {
            return Err(RegistryError::ForeignHandle);
        }
        self.bind(id, handle.key());
        Ok(())
    }

    pub(crate) fn bind(&self, id: &str, key: SlotKey) {
        let prev = self.shared.table.borrow_mut().bind(id, key);
        if prev == Some(key) {
            return;
        }
        debug!(id, ?key, replaced = ?prev, "container registered");
        self.shared
            .watchers
            .notify(&[ContainerEvent::new(id, ChangeKind::Registered)]);
    }

    /// Remove the binding for `id`. Returns whether one existed.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.shared.table.borrow_mut().unbind(id);
        match removed {
            Some(key) => {
                debug!(id, ?key, "container unregistered");
                self.shared
                    .watchers
                    .notify(&[ContainerEvent::new(id, ChangeKind::Unregistered)]);
                true
            }
            None => false,
        }
    }

    /// Remove every binding whose handle has been dropped.
    pub fn prune(&self) -> usize {
        let stale = self.shared.table.borrow_mut().prune_stale();
        if !stale.is_empty() {
            debug!(count = stale.len(), "pruned stale container bindings");
            let events: Vec<_> = stale
                .into_iter()
                .map(|id| ContainerEvent::new(id, ChangeKind::Unregistered))
                .collect();
            self.shared.watchers.notify(&events);
            return events.len();
        }
        0
    }

    /// Current element registered under `id`, or `None` if the identifier
    /// is unknown, its handle is empty, or its handle was dropped.
    pub fn lookup(&self, id: &str) -> Option<E>
    where
        E: Clone,
    {
        self.shared.table.borrow().resolve(id).cloned()
    }

    /// Borrow the current element for `id` without cloning it.
    ///
    /// `f` runs while the registry is borrowed; it must not register,
    /// attach or detach.
    pub fn with_container<R>(&self, id: &str, f: impl FnOnce(Option<&E>) -> R) -> R {
        let table = self.shared.table.borrow();
        f(table.resolve(id))
    }

    pub(crate) fn revision(&self, id: &str) -> Revision {
        self.shared.table.borrow().revision(id)
    }

    /// Whether `id` has a binding, even one whose handle is gone.
    pub fn is_registered(&self, id: &str) -> bool {
        self.shared.table.borrow().binding(id).is_some()
    }

    /// Number of bound identifiers.
    pub fn len(&self) -> usize {
        self.shared.table.borrow().bindings_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the bound identifiers, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.shared
            .table
            .borrow()
            .ids()
            .map(str::to_owned)
            .collect()
    }

    /// Be told about changes affecting `id`.
    pub fn watch(&self, id: &str, callback: impl Fn(&ContainerEvent) + 'static) -> Watch {
        trace!(id, "registry watch added");
        self.shared
            .watchers
            .subscribe(Some(id.to_owned()), Rc::new(callback))
    }

    /// Be told about changes affecting any identifier.
    pub fn watch_all(&self, callback: impl Fn(&ContainerEvent) + 'static) -> Watch {
        trace!("registry watch added for all ids");
        self.shared.watchers.subscribe(None, Rc::new(callback))
    }
}

impl<E> PartialEq for ContainerRegistry<E> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<E> Eq for ContainerRegistry<E> {}

impl<E> core::fmt::Debug for ContainerRegistry<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let table = self.shared.table.borrow();
        f.debug_struct("ContainerRegistry")
            .field("bindings", &table.bindings_len())
            .field("live_handles", &table.live_slots())
            .field("watchers", &self.shared.watchers.len())
            .finish()
    }
}

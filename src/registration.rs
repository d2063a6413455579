//! ContainerRegistration: write side of the registry for one mounted component.

use crate::handle::ContainerHandle;
use crate::registry::ContainerRegistry;

/// Owns the handle of a component's container and files it under an
/// identifier on every render.
///
/// Registering on every render, not just on mount, means that when several
/// components take turns under one identifier the one that rendered last
/// owns the mapping. Dropping the registration drops the handle; the
/// identifier stays bound and resolves to `None` until someone else
/// registers under it.
pub struct ContainerRegistration<E> {
    registry: ContainerRegistry<E>,
    handle: ContainerHandle<E>,
}

impl<E> ContainerRegistration<E> {
    /// Mount: create the handle once.
    pub fn new(registry: &ContainerRegistry<E>) -> Self {
        Self {
            registry: registry.clone(),
            handle: registry.create_handle(),
        }
    }

    /// Register under `id` and hand back the handle to bind to the
    /// container element.
    pub fn render(&self, id: &str) -> &ContainerHandle<E> {
        self.registry.bind(id, self.handle.key());
        &self.handle
    }

    pub fn handle(&self) -> &ContainerHandle<E> {
        &self.handle
    }

    pub fn registry(&self) -> &ContainerRegistry<E> {
        &self.registry
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for ContainerRegistration<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainerRegistration")
            .field("handle", &self.handle)
            .finish()
    }
}

//! RegistryProvider: owns the registry for one UI tree.

use crate::config::RefreshConfig;
use crate::host::Host;
use crate::lookup::ContainerLookup;
use crate::registration::ContainerRegistration;
use crate::registry::ContainerRegistry;
use std::rc::Rc;

/// Created once near the root of a tree. Descendants receive the registry
/// through `context()` and build their registrations and lookups from it.
pub struct RegistryProvider<E> {
    registry: ContainerRegistry<E>,
    config: RefreshConfig,
}

impl<E: 'static> Default for RegistryProvider<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> RegistryProvider<E> {
    pub fn new() -> Self {
        Self::with_config(RefreshConfig::default())
    }

    /// `config` becomes the default for lookups created via `lookup`.
    pub fn with_config(config: RefreshConfig) -> Self {
        Self {
            registry: ContainerRegistry::new(),
            config,
        }
    }

    /// The context value. Same registry on every call.
    pub fn context(&self) -> &ContainerRegistry<E> {
        &self.registry
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn registration(&self) -> ContainerRegistration<E> {
        ContainerRegistration::new(&self.registry)
    }

    pub fn lookup(&self, host: Rc<dyn Host>, rerender: impl Fn() + 'static) -> ContainerLookup<E> {
        ContainerLookup::new(&self.registry, host, self.config.clone(), rerender)
    }
}

impl<E> core::fmt::Debug for RegistryProvider<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistryProvider")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

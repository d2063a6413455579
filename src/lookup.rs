//! ContainerLookup: read side of the registry for one mounted component.
//!
//! Reading a handle's element is not a subscription, so a lookup keeps its
//! component fresh by asking it to re-render, debounced, whenever one of its
//! refresh triggers fires:
//! - host viewport resizes (on by default);
//! - binding or element changes for the identifier last rendered (opt-in).
//!
//! A registry-driven refresh only runs when, at the end of the quiet
//! period, the identifier resolves differently from what the component last
//! rendered. Owners that take turns under one identifier on every render
//! leave the net resolution unchanged and so do not keep re-rendering the
//! lookup.
//!
//! Triggers are held as RAII guards. Dropping the lookup, or replacing its
//! configuration, releases the listener and cancels any pending refresh
//! before anything new is attached.

use crate::config::RefreshConfig;
use crate::debounce::Debouncer;
use crate::host::{Host, ResizeSubscription};
use crate::registry::ContainerRegistry;
use crate::table::Revision;
use crate::watch::Watch;
use core::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

// Field order is drop order: stop the sources before cancelling the timer.
struct Triggers {
    resize: Option<ResizeSubscription>,
    watch: Option<Watch>,
    debouncer: Rc<Debouncer>,
}

pub struct ContainerLookup<E> {
    registry: ContainerRegistry<E>,
    host: Rc<dyn Host>,
    config: RefreshConfig,
    refresh: Rc<dyn Fn()>,
    refreshes: Rc<Cell<u64>>,
    watched_id: Rc<RefCell<Option<String>>>,
    observed: Rc<Cell<Option<Revision>>>,
    resized: Rc<Cell<bool>>,
    triggers: Option<Triggers>,
}

impl<E: 'static> ContainerLookup<E> {
    /// Mount a lookup. `rerender` is the host framework's way of scheduling
    /// a new render of the calling component.
    pub fn new(
        registry: &ContainerRegistry<E>,
        host: Rc<dyn Host>,
        config: RefreshConfig,
        rerender: impl Fn() + 'static,
    ) -> Self {
        let refreshes = Rc::new(Cell::new(0u64));
        let refresh: Rc<dyn Fn()> = {
            let n = Rc::clone(&refreshes);
            Rc::new(move || {
                n.set(n.get() + 1);
                rerender();
            })
        };
        let mut lookup = Self {
            registry: registry.clone(),
            host,
            config,
            refresh,
            refreshes,
            watched_id: Rc::new(RefCell::new(None)),
            observed: Rc::new(Cell::new(None)),
            resized: Rc::new(Cell::new(false)),
            triggers: None,
        };
        lookup.triggers = lookup.subscribe();
        lookup
    }

    fn subscribe(&self) -> Option<Triggers> {
        if !self.config.is_active() {
            return None;
        }
        let action = {
            let refresh = Rc::clone(&self.refresh);
            let resized = Rc::clone(&self.resized);
            let watched = Rc::clone(&self.watched_id);
            let observed = Rc::clone(&self.observed);
            let registry = self.registry.clone();
            move || {
                let current = watched.borrow().as_deref().map(|id| registry.revision(id));
                let changed = current.is_some() && current != observed.get();
                if changed {
                    observed.set(current);
                }
                if resized.replace(false) || changed {
                    refresh();
                }
            }
        };
        let debouncer = Rc::new(Debouncer::new(
            Rc::clone(&self.host),
            self.config.debounce,
            action,
        ));

        let resize = self.config.on_resize.then(|| {
            let d = Rc::downgrade(&debouncer);
            let resized = Rc::clone(&self.resized);
            ResizeSubscription::subscribe(
                Rc::clone(&self.host),
                Rc::new(move |_| {
                    if let Some(d) = d.upgrade() {
                        resized.set(true);
                        d.call();
                    }
                }),
            )
        });

        let watch = self.config.on_registry_change.then(|| {
            let d = Rc::downgrade(&debouncer);
            let watched = Rc::clone(&self.watched_id);
            self.registry.watch_all(move |event| {
                let hit = watched.borrow().as_deref() == Some(event.id.as_str());
                if hit {
                    if let Some(d) = d.upgrade() {
                        d.call();
                    }
                }
            })
        });

        debug!(
            debounce = ?self.config.debounce,
            on_resize = self.config.on_resize,
            on_registry_change = self.config.on_registry_change,
            "container lookup subscribed"
        );
        Some(Triggers {
            resize,
            watch,
            debouncer,
        })
    }

    /// The element currently registered under `id`. Never mutates the
    /// registry.
    pub fn render(&self, id: &str) -> Option<E>
    where
        E: Clone,
    {
        self.track(id);
        self.registry.lookup(id)
    }

    /// Like `render`, borrowing the element instead of cloning it.
    pub fn with_container<R>(&self, id: &str, f: impl FnOnce(Option<&E>) -> R) -> R {
        self.track(id);
        self.registry.with_container(id, f)
    }

    fn track(&self, id: &str) {
        if self.watched_id.borrow().as_deref() != Some(id) {
            *self.watched_id.borrow_mut() = Some(id.to_owned());
        }
        self.observed.set(Some(self.registry.revision(id)));
    }

    /// Swap in a new configuration. The old triggers are released before
    /// the new ones attach. Returns whether anything changed.
    pub fn reconfigure(&mut self, config: RefreshConfig) -> bool {
        if config == self.config {
            return false;
        }
        self.triggers = None;
        self.resized.set(false);
        self.config = config;
        self.triggers = self.subscribe();
        true
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// How many debounced refreshes have been requested so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes.get()
    }

    /// Whether a resize listener is currently attached to the host.
    pub fn is_subscribed(&self) -> bool {
        self.triggers
            .as_ref()
            .and_then(|t| t.resize.as_ref())
            .map_or(false, ResizeSubscription::is_active)
    }

    /// Whether a refresh is waiting for its quiet period to end.
    pub fn refresh_pending(&self) -> bool {
        self.triggers
            .as_ref()
            .map_or(false, |t| t.debouncer.is_pending())
    }
}

impl<E> Drop for ContainerLookup<E> {
    fn drop(&mut self) {
        if self.triggers.take().is_some() {
            debug!("container lookup unsubscribed");
        }
    }
}

impl<E> core::fmt::Debug for ContainerLookup<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainerLookup")
            .field("config", &self.config)
            .field("watched_id", &self.watched_id.borrow())
            .field("refreshes", &self.refreshes.get())
            .field("subscribed", &self.triggers.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalEventLoop;
    use crate::Viewport;
    use std::time::Duration;

    fn mount(config: RefreshConfig) -> (Rc<LocalEventLoop>, ContainerRegistry<u32>, ContainerLookup<u32>) {
        let ev = Rc::new(LocalEventLoop::default());
        let registry = ContainerRegistry::new();
        let lookup = ContainerLookup::new(&registry, ev.clone(), config, || {});
        (ev, registry, lookup)
    }

    #[test]
    fn subscribes_on_mount_and_releases_on_drop() {
        let (ev, _registry, lookup) = mount(RefreshConfig::default());
        assert!(lookup.is_subscribed());
        assert_eq!(ev.listener_count(), 1);
        drop(lookup);
        assert_eq!(ev.listener_count(), 0);
    }

    #[test]
    fn inactive_config_attaches_nothing() {
        let config = RefreshConfig::default().refresh_on_resize(false);
        let (ev, _registry, lookup) = mount(config);
        assert!(!lookup.is_subscribed());
        assert_eq!(ev.listener_count(), 0);
        ev.resize(Viewport::new(1, 1));
        ev.run_until_idle();
        assert_eq!(lookup.refreshes(), 0);
    }

    #[test]
    fn reconfigure_replaces_listener() {
        let (ev, _registry, mut lookup) = mount(RefreshConfig::default());
        assert!(!lookup.reconfigure(RefreshConfig::default()));

        ev.resize(Viewport::new(10, 10));
        assert!(lookup.refresh_pending());
        let slower = RefreshConfig::default().with_debounce(Duration::from_millis(50));
        assert!(lookup.reconfigure(slower));
        // Old pending refresh is cancelled together with the old listener.
        assert!(!lookup.refresh_pending());
        assert_eq!(ev.listener_count(), 1);
        assert_eq!(ev.pending_timers(), 0);

        ev.resize(Viewport::new(20, 20));
        ev.advance(Duration::from_millis(49));
        assert_eq!(lookup.refreshes(), 0);
        ev.advance(Duration::from_millis(1));
        assert_eq!(lookup.refreshes(), 1);
        assert_eq!(lookup.config().debounce, Duration::from_millis(50));
    }

    #[test]
    fn unbounded_debounce_never_refreshes() {
        let config = RefreshConfig::default().with_debounce(Duration::MAX);
        let (ev, _registry, lookup) = mount(config);
        ev.advance(Duration::from_millis(1));
        ev.resize(Viewport::new(5, 5));
        ev.advance(Duration::from_secs(3600));
        assert!(lookup.refresh_pending());
        assert_eq!(lookup.refreshes(), 0);
    }

    #[test]
    fn registry_changes_refresh_only_the_watched_id() {
        let config = RefreshConfig::default()
            .refresh_on_resize(false)
            .refresh_on_registry_change(true);
        let (ev, registry, lookup) = mount(config);
        assert_eq!(lookup.render("panel"), None);

        let other = registry.create_handle();
        registry.register("other", &other).unwrap();
        other.attach(1);
        ev.run_until_idle();
        assert_eq!(lookup.refreshes(), 0);

        let panel = registry.create_handle();
        registry.register("panel", &panel).unwrap();
        panel.attach(2);
        ev.run_until_idle();
        assert_eq!(lookup.refreshes(), 1);
        assert_eq!(lookup.render("panel"), Some(2));
        assert_eq!(lookup.with_container("panel", |e| e.copied()), Some(2));
    }
}

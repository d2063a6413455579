// Lookup refresh tests against the in-process event loop.
//
// Verifies the debounce contract (bursts coalesce, spaced events refresh
// once each), unmount safety, and the end-to-end panel scenario.
use container_registry::{
    ContainerLookup, ContainerRegistry, Host, LocalEventLoop, RefreshConfig, RegistryProvider,
    Viewport, DEFAULT_DEBOUNCE,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

const MS: Duration = Duration::from_millis(1);

struct Reader {
    renders: Rc<Cell<u32>>,
    lookup: ContainerLookup<&'static str>,
}

fn mount_reader(registry: &ContainerRegistry<&'static str>, host: &Rc<LocalEventLoop>) -> Reader {
    let renders = Rc::new(Cell::new(0));
    let r = Rc::clone(&renders);
    let lookup = ContainerLookup::new(
        registry,
        host.clone() as Rc<dyn Host>,
        RefreshConfig::default(),
        move || r.set(r.get() + 1),
    );
    Reader { renders, lookup }
}

#[test]
fn default_debounce_is_five_millis() {
    assert_eq!(DEFAULT_DEBOUNCE, Duration::from_millis(5));
}

// Test: N resize events inside one debounce window.
// Verifies: at most one refresh.
#[test]
fn burst_of_resizes_refreshes_once() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    let reader = mount_reader(&registry, &ev);

    for i in 0..20 {
        ev.resize(Viewport::new(800 + i, 600));
        ev.advance(MS);
    }
    ev.run_until_idle();
    assert_eq!(reader.renders.get(), 1);
    assert_eq!(reader.lookup.refreshes(), 1);
}

// Test: resize events spaced further apart than the debounce delay.
// Verifies: one refresh per event.
#[test]
fn spaced_resizes_refresh_each_time() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    let reader = mount_reader(&registry, &ev);

    for i in 0..5 {
        ev.resize(Viewport::new(800 + i, 600));
        ev.advance(DEFAULT_DEBOUNCE + MS);
    }
    assert_eq!(reader.renders.get(), 5);
}

// Test: unmount while a refresh is pending.
// Verifies: listener removed, pending timer cancelled, no refresh afterwards.
#[test]
fn unmount_stops_refreshes() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    let Reader { renders, lookup } = mount_reader(&registry, &ev);

    ev.resize(Viewport::new(1, 1));
    assert!(lookup.refresh_pending());
    drop(lookup);
    assert_eq!(ev.listener_count(), 0);
    assert_eq!(ev.pending_timers(), 0);

    ev.resize(Viewport::new(2, 2));
    ev.run_until_idle();
    assert_eq!(renders.get(), 0);
}

// Test: remount after unmount.
// Verifies: a fresh listener is established and refreshes resume.
#[test]
fn remount_resubscribes() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    drop(mount_reader(&registry, &ev));
    assert_eq!(ev.listener_count(), 0);

    let reader = mount_reader(&registry, &ev);
    assert!(reader.lookup.is_subscribed());
    assert_eq!(ev.listener_count(), 1);
    ev.resize(Viewport::new(3, 3));
    ev.run_until_idle();
    assert_eq!(reader.renders.get(), 1);
}

// Test: several lookups on one host.
// Verifies: each has its own listener and debouncer.
#[test]
fn independent_lookups() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    let a = mount_reader(&registry, &ev);
    let b = mount_reader(&registry, &ev);
    assert_eq!(ev.listener_count(), 2);

    ev.resize(Viewport::new(4, 4));
    drop(a);
    ev.run_until_idle();
    assert_eq!(b.renders.get(), 1);
}

// Test: the lookup is read-only.
// Verifies: rendering a lookup never creates a binding.
#[test]
fn lookup_never_registers() {
    let ev = Rc::new(LocalEventLoop::default());
    let registry = ContainerRegistry::new();
    let reader = mount_reader(&registry, &ev);
    assert_eq!(reader.lookup.render("panel"), None);
    assert!(registry.is_empty());
}

// Test: end-to-end panel scenario.
// Mount provider; A registers "panel" with E1; B looks it up and sees E1.
// Unmount A; C registers "panel" with E2; B sees E2 after its next refresh.
#[test]
fn panel_scenario() {
    let ev = Rc::new(LocalEventLoop::new(Viewport::new(1024, 768)));
    let provider: RegistryProvider<&'static str> = RegistryProvider::new();

    let a = provider.registration();
    a.render("panel").attach("E1");

    let renders = Rc::new(Cell::new(0));
    let r = Rc::clone(&renders);
    let b = provider.lookup(ev.clone(), move || r.set(r.get() + 1));
    assert_eq!(b.render("panel"), Some("E1"));

    drop(a);
    let c = provider.registration();
    c.render("panel").attach("E2");

    ev.resize(Viewport::new(1280, 800));
    ev.run_until_idle();
    assert_eq!(renders.get(), 1);
    assert_eq!(b.render("panel"), Some("E2"));
}

// Test: the same scenario driven by registry notifications instead of a
// viewport change.
#[test]
fn panel_scenario_with_registry_refresh() {
    let ev = Rc::new(LocalEventLoop::default());
    let config = RefreshConfig::default().refresh_on_registry_change(true);
    let provider: RegistryProvider<&'static str> = RegistryProvider::with_config(config);

    let a = provider.registration();
    a.render("panel").attach("E1");
    let renders = Rc::new(Cell::new(0));
    let r = Rc::clone(&renders);
    let b = provider.lookup(ev.clone(), move || r.set(r.get() + 1));
    assert_eq!(b.render("panel"), Some("E1"));

    drop(a);
    ev.run_until_idle();
    assert_eq!(renders.get(), 1);
    assert_eq!(b.render("panel"), None);

    let c = provider.registration();
    c.render("panel").attach("E2");
    ev.run_until_idle();
    assert_eq!(renders.get(), 2);
    assert_eq!(b.render("panel"), Some("E2"));
}

// Test: two owners register "panel" on every render, and a page refresh
// re-renders both owners and the reader.
// Verifies: owners taking turns under one id do not keep the reader
// refreshing; a real change still refreshes it exactly once.
#[test]
fn contending_owners_settle() {
    let ev = Rc::new(LocalEventLoop::default());
    let config = RefreshConfig::default()
        .refresh_on_resize(false)
        .refresh_on_registry_change(true);
    let provider: RegistryProvider<&'static str> = RegistryProvider::with_config(config);

    let a = Rc::new(provider.registration());
    let c = Rc::new(provider.registration());
    a.render("panel").attach("A");
    c.render("panel").attach("C");

    let slot: Rc<RefCell<Option<ContainerLookup<&'static str>>>> = Rc::new(RefCell::new(None));
    let renders = Rc::new(Cell::new(0));
    let lookup = {
        let (a, c, r) = (Rc::clone(&a), Rc::clone(&c), Rc::clone(&renders));
        let reader: Weak<RefCell<Option<ContainerLookup<&'static str>>>> = Rc::downgrade(&slot);
        provider.lookup(ev.clone(), move || {
            r.set(r.get() + 1);
            a.render("panel");
            c.render("panel");
            if let Some(reader) = reader.upgrade() {
                if let Some(lookup) = reader.borrow().as_ref() {
                    lookup.render("panel");
                }
            }
        })
    };
    assert_eq!(lookup.render("panel"), Some("C"));
    *slot.borrow_mut() = Some(lookup);

    // A page render with no net change.
    a.render("panel");
    c.render("panel");
    ev.advance(100 * MS);
    assert_eq!(renders.get(), 0);
    assert_eq!(ev.pending_timers(), 0);

    c.handle().attach("C2");
    ev.advance(100 * MS);
    assert_eq!(renders.get(), 1);
    assert_eq!(ev.pending_timers(), 0);
    let seen = slot.borrow().as_ref().map(|l| (l.render("panel"), l.refreshes()));
    assert_eq!(seen, Some((Some("C2"), 1)));
}

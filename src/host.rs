//! Host window and timer contract consumed by `ContainerLookup`.

use slotmap::new_key_type;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

new_key_type! {
    /// Identifies one resize listener registered with a host.
    pub struct ListenerId;
    /// Identifies one pending timeout registered with a host.
    pub struct TimerId;
}

/// Size of the host viewport after a resize.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

pub type ResizeListener = Rc<dyn Fn(Viewport)>;

/// The single-threaded event source a UI tree runs on.
///
/// Listeners are invoked zero or more times, with no ordering guarantee
/// relative to each other. Timeouts run once on the same thread after at
/// least `delay` has passed, unless cleared first.
pub trait Host {
    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId;

    /// Returns whether the listener was still registered.
    fn remove_resize_listener(&self, id: ListenerId) -> bool;

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Returns whether the timeout was still pending.
    fn clear_timeout(&self, id: TimerId) -> bool;
}

/// A resize listener that stays registered for as long as this value lives.
#[must_use = "dropping a ResizeSubscription removes the listener"]
pub struct ResizeSubscription {
    host: Rc<dyn Host>,
    id: Option<ListenerId>,
}

impl ResizeSubscription {
    pub fn subscribe(host: Rc<dyn Host>, listener: ResizeListener) -> Self {
        let id = host.add_resize_listener(listener);
        trace!(?id, "resize listener attached");
        Self { host, id: Some(id) }
    }

    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Remove the listener now instead of at drop.
    pub fn release(&mut self) {
        if let Some(id) = self.id.take() {
            let removed = self.host.remove_resize_listener(id);
            trace!(?id, removed, "resize listener released");
        }
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for ResizeSubscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeSubscription")
            .field("id", &self.id)
            .finish()
    }
}

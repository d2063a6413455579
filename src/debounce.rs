//! Trailing-edge debouncing on top of host timeouts.

use crate::host::{Host, TimerId};
use core::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Runs `action` once `delay` has passed without another `call`.
///
/// Every `call` clears the pending timeout and schedules a new one, so a
/// burst of calls closer together than `delay` collapses into a single run
/// after the last of them. Dropping the debouncer cancels a pending run.
pub struct Debouncer {
    host: Rc<dyn Host>,
    delay: Duration,
    action: Rc<dyn Fn()>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl Debouncer {
    pub fn new(host: Rc<dyn Host>, delay: Duration, action: impl Fn() + 'static) -> Self {
        Self {
            host,
            delay,
            action: Rc::new(action),
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Restart the quiet period.
    pub fn call(&self) {
        self.cancel();
        let pending = Rc::clone(&self.pending);
        let action = Rc::clone(&self.action);
        let id = self.host.set_timeout(
            self.delay,
            Box::new(move || {
                pending.set(None);
                trace!("debounced action fired");
                action();
            }),
        );
        self.pending.set(Some(id));
    }

    /// Drop a pending run, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(id) => self.host.clear_timeout(id),
            None => false,
        }
    }

    /// Run a pending action now instead of waiting for the timeout.
    pub fn flush(&self) -> bool {
        if self.cancel() {
            (self.action)();
            true
        } else {
            false
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl core::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.get())
            .finish()
    }
}

//! LocalEventLoop: an in-process `Host` driven by a virtual clock.
//!
//! Nothing runs on its own. Resize events are delivered by `resize`, and
//! timeouts fire from `advance`/`run_until_idle` in deadline order (ties in
//! scheduling order), with the clock set to each deadline as it fires.

use crate::host::{Host, ListenerId, ResizeListener, TimerId, Viewport};
use core::cell::RefCell;
use slotmap::SlotMap;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

struct PendingTimer {
    deadline: Duration,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct LoopState {
    now: Duration,
    viewport: Viewport,
    listeners: SlotMap<ListenerId, ResizeListener>,
    timers: SlotMap<TimerId, PendingTimer>,
    queue: BTreeMap<(Duration, u64), TimerId>,
    next_seq: u64,
}

pub struct LocalEventLoop {
    state: RefCell<LoopState>,
}

impl Default for LocalEventLoop {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl LocalEventLoop {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: RefCell::new(LoopState {
                now: Duration::ZERO,
                viewport,
                listeners: SlotMap::with_key(),
                timers: SlotMap::with_key(),
                queue: BTreeMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Record the new viewport and deliver it to every listener.
    pub fn resize(&self, viewport: Viewport) {
        let listeners: Vec<ResizeListener> = {
            let mut st = self.state.borrow_mut();
            st.viewport = viewport;
            st.listeners.values().cloned().collect()
        };
        trace!(?viewport, listeners = listeners.len(), "dispatching resize");
        for listener in listeners {
            listener(viewport);
        }
    }

    /// Move the clock forward by `by`, firing every timeout that falls due.
    /// Returns the number of callbacks run.
    ///
    /// A callback may advance the clock itself; the clock never moves back.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let fired = self.fire_until(Some(target));
        let mut st = self.state.borrow_mut();
        st.now = st.now.max(target);
        fired
    }

    /// Fire timeouts until none are pending, including ones scheduled by the
    /// callbacks themselves.
    pub fn run_until_idle(&self) -> usize {
        self.fire_until(None)
    }

    fn fire_until(&self, limit: Option<Duration>) -> usize {
        let mut fired = 0;
        while let Some(callback) = self.pop_due(limit) {
            callback();
            fired += 1;
        }
        fired
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<Box<dyn FnOnce()>> {
        let mut st = self.state.borrow_mut();
        let (&(deadline, seq), &id) = st.queue.iter().next()?;
        if limit.map_or(false, |l| deadline > l) {
            return None;
        }
        st.queue.remove(&(deadline, seq));
        let timer = st.timers.remove(id)?;
        st.now = st.now.max(timer.deadline);
        Some(timer.callback)
    }
}

impl Host for LocalEventLoop {
    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId {
        self.state.borrow_mut().listeners.insert(listener)
    }

    fn remove_resize_listener(&self, id: ListenerId) -> bool {
        let removed = self.state.borrow_mut().listeners.remove(id);
        removed.is_some()
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut st = self.state.borrow_mut();
        let deadline = st.now.saturating_add(delay);
        let seq = st.next_seq;
        st.next_seq += 1;
        let id = st.timers.insert(PendingTimer {
            deadline,
            seq,
            callback,
        });
        st.queue.insert((deadline, seq), id);
        id
    }

    fn clear_timeout(&self, id: TimerId) -> bool {
        let removed = {
            let mut st = self.state.borrow_mut();
            let timer = st.timers.remove(id);
            if let Some(t) = &timer {
                st.queue.remove(&(t.deadline, t.seq));
            }
            timer
        };
        removed.is_some()
    }
}

#[cfg(feature = "crossterm")]
impl LocalEventLoop {
    /// Forward a terminal resize to the loop's listeners. Other events are
    /// ignored; returns whether the event was a resize.
    pub fn dispatch_terminal_event(&self, event: &crossterm::event::Event) -> bool {
        match *event {
            crossterm::event::Event::Resize(cols, rows) => {
                self.resize(Viewport::new(u32::from(cols), u32::from(rows)));
                true
            }
            _ => false,
        }
    }
}

impl core::fmt::Debug for LocalEventLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("LocalEventLoop")
            .field("now", &st.now)
            .field("viewport", &st.viewport)
            .field("listeners", &st.listeners.len())
            .field("pending_timers", &st.timers.len())
            .finish()
    }
}

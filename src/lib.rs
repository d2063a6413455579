//! container-registry: named container handles shared across a
//! single-threaded UI component tree.
//!
//! A provider near the root owns one registry. Components that own a
//! container register a handle for it under an identifier; components
//! elsewhere in the tree look the identifier up to find the live element
//! (for example an inner drawer that renders into, or sizes itself
//! against, a container owned by a distant ancestor).
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - ContainerTable<E, S>: generational slot arena holding each handle's
//!     optional element, plus a hash index from identifier to slot key.
//!   - ContainerRegistry<E>: `Rc`-shared table with change notifications;
//!     the identity-stable context value handed to descendants.
//!   - ContainerHandle<E>: RAII owner of one slot. The registry keeps only
//!     the slot key, resolved lazily on lookup.
//!   - ContainerRegistration / ContainerLookup: per-component write and read
//!     sides. Lookups refresh their component through a debounced trigger.
//!
//! Constraints
//! - Single-threaded: every public type is `!Send`/`!Sync` (`Rc`, `RefCell`).
//! - Last registration under an identifier wins; no uniqueness is enforced.
//! - A binding never keeps an element alive. Once its handle is dropped the
//!   identifier resolves to `None`; generational keys prevent a stale
//!   binding from reaching a newer slot.
//! - Unknown identifiers resolve to `None`, never to an error.
//!
//! Reentrancy
//! - Callbacks (watchers, resize listeners, timeouts) run after internal
//!   borrows are released and may call back into the registry.
//! - Elements removed from a slot are dropped after the table borrow ends.
//! - The closures given to `with_container`/`with_current` run under a
//!   shared borrow and must not register, attach or detach.
//!
//! Refresh
//! - Reading a handle is not a subscription. A lookup asks its component to
//!   re-render after the viewport is resized and, when enabled, after its
//!   identifier is rebound or its element changes. Triggers are coalesced by
//!   a trailing-edge debounce (5 ms by default).
//!
//! Notes and non-goals
//! - Bindings are never removed implicitly; `unregister` and `prune` are
//!   explicit.
//! - One registry is one namespace. There is no isolation between
//!   instances sharing a provider.
//! - The host (event loop, timers, viewport) is abstracted by `Host`;
//!   `LocalEventLoop` is an in-process implementation with a virtual clock.

mod config;
mod debounce;
mod error;
mod event_loop;
mod handle;
pub mod host;
mod lookup;
mod provider;
mod registration;
mod registry;
mod table;
mod watch;

// Public surface
pub use config::{RefreshConfig, DEFAULT_DEBOUNCE};
pub use debounce::Debouncer;
pub use error::RegistryError;
pub use event_loop::LocalEventLoop;
pub use handle::ContainerHandle;
pub use host::{Host, ListenerId, ResizeListener, ResizeSubscription, TimerId, Viewport};
pub use lookup::ContainerLookup;
pub use provider::RegistryProvider;
pub use registration::ContainerRegistration;
pub use registry::ContainerRegistry;
pub use table::SlotKey;
pub use watch::{ChangeKind, ContainerEvent, Watch};

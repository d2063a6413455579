//! Refresh configuration for `ContainerLookup`.

use std::time::Duration;

/// Quiet period a burst of resize events must be followed by before a
/// lookup refreshes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5);

/// When and how often a lookup asks its component to re-render.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefreshConfig {
    /// Trailing-edge debounce applied to every refresh trigger.
    pub debounce: Duration,
    /// Refresh after the host viewport is resized.
    pub on_resize: bool,
    /// Refresh when the looked-up identifier is rebound or its handle gains
    /// or loses an element.
    pub on_registry_change: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            on_resize: true,
            on_registry_change: false,
        }
    }
}

impl RefreshConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn refresh_on_resize(mut self, enabled: bool) -> Self {
        self.on_resize = enabled;
        self
    }

    pub fn refresh_on_registry_change(mut self, enabled: bool) -> Self {
        self.on_registry_change = enabled;
        self
    }

    /// True when at least one trigger is enabled.
    pub fn is_active(&self) -> bool {
        self.on_resize || self.on_registry_change
    }
}

//! Compositor binding layer.
//!
//! The broker talks to the compositor only through [`CompositorBinding`]:
//! register a trigger, bind an action to it, destroy handles. Completions are
//! delivered on the same single-threaded loop that issued the request.
//!
//! # Module Structure
//!
//! - `protocol` - bindings generated from `protocols/*.xml`
//! - `wayland` - the real backend over a Wayland connection
//! - `mock` - scripted in-memory backend (tests only)

pub mod protocol;
pub mod wayland;

#[cfg(test)]
pub mod mock;

use std::fmt;

/// Opaque token issued by the compositor for a bound action.
///
/// Also the correlation key for begin/end notifications.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trigger begin/end notification, keyed by token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationEvent {
    Begin {
        token: RegistrationToken,
        timestamp: u32,
    },
    End {
        token: RegistrationToken,
        timestamp: u32,
    },
}

impl ActivationEvent {
    pub fn token(&self) -> &RegistrationToken {
        match self {
            Self::Begin { token, .. } | Self::End { token, .. } => token,
        }
    }

    pub fn timestamp(&self) -> u32 {
        match self {
            Self::Begin { timestamp, .. } | Self::End { timestamp, .. } => *timestamp,
        }
    }
}

/// Two-phase binding primitive exposed by the compositor.
///
/// Implementations resolve each future exactly once. A `None` result means the
/// compositor reported failure (or the connection dropped the request).
#[allow(async_fn_in_trait)]
pub trait CompositorBinding {
    type Trigger: 'static;
    type Action: 'static;

    /// Both capability objects were found during discovery.
    fn capabilities_ready(&self) -> bool;

    async fn register_trigger(&self, modifiers: u32, keysym: u32) -> Option<Self::Trigger>;

    /// Bind `trigger` as the activation condition of a new action named
    /// `description`, subscribe to its begin/end notifications, and return
    /// once the subscription is installed.
    async fn bind_action(
        &self,
        description: &str,
        trigger: &Self::Trigger,
    ) -> Option<(Self::Action, RegistrationToken)>;

    fn destroy_trigger(&self, trigger: Self::Trigger);

    fn destroy_action(&self, action: Self::Action);
}

/// Owned pair of compositor handles held by one bound shortcut.
///
/// Must be released with [`CompositorHandles::release`] on every exit path;
/// dropping it leaves the compositor objects alive.
pub struct CompositorHandles<C: CompositorBinding> {
    trigger: Option<C::Trigger>,
    action: Option<C::Action>,
}

impl<C: CompositorBinding> CompositorHandles<C> {
    pub fn bound(trigger: C::Trigger, action: C::Action) -> Self {
        Self {
            trigger: Some(trigger),
            action: Some(action),
        }
    }

    /// A pair where either side may be missing (a torn-down attempt).
    pub fn from_parts(trigger: Option<C::Trigger>, action: Option<C::Action>) -> Self {
        Self { trigger, action }
    }

    pub fn is_bound(&self) -> bool {
        self.trigger.is_some() && self.action.is_some()
    }

    /// Destroy whichever handles are present. The action goes first so the
    /// compositor never sees an action whose trigger is already gone.
    pub fn release(self, compositor: &C) {
        if let Some(action) = self.action {
            compositor.destroy_action(action);
        }
        if let Some(trigger) = self.trigger {
            compositor.destroy_trigger(trigger);
        }
    }
}

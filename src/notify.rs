//! Outbound notifications from the broker to clients and observers.

use crate::batch::BoundShortcut;
use crate::registry::ActivationTarget;

/// Delivery side of the portal. Implementations must not block; delivery is
/// fire-and-forget and failures are only logged.
pub trait PortalNotifier {
    /// Trigger went down. Sent to the client that created the session.
    fn activated(&self, target: &ActivationTarget, timestamp: u32);

    /// Trigger was released.
    fn deactivated(&self, target: &ActivationTarget, timestamp: u32);

    /// Broadcast after a successful rebind.
    fn shortcuts_changed(&self, session_handle: &str, shortcuts: &[BoundShortcut]);

    /// The session no longer exists on the broker side.
    fn session_closed(&self, session_handle: &str);
}

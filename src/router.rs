//! Routes compositor begin/end notifications to the owning client.

use tracing::debug;

use crate::compositor::{ActivationEvent, CompositorBinding};
use crate::notify::PortalNotifier;
use crate::registry::SessionRegistry;

/// Forward `event` to the client owning its token. Returns `false` when no
/// session owns the token any more (replaced or closed binding); the event is
/// dropped in that case.
pub fn route<C: CompositorBinding>(
    registry: &SessionRegistry<C>,
    notifier: &dyn PortalNotifier,
    event: &ActivationEvent,
) -> bool {
    let Some(target) = registry.resolve_token(event.token()) else {
        debug!(token = %event.token(), "Dropping activation for unowned token");
        return false;
    };

    match event {
        ActivationEvent::Begin { timestamp, .. } => {
            debug!(
                session = %target.session_handle,
                shortcut_id = %target.shortcut_id,
                client = %target.client,
                "Activated"
            );
            notifier.activated(&target, *timestamp);
        }
        ActivationEvent::End { timestamp, .. } => {
            debug!(
                session = %target.session_handle,
                shortcut_id = %target.shortcut_id,
                client = %target.client,
                "Deactivated"
            );
            notifier.deactivated(&target, *timestamp);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::mock::{MockAction, MockCompositor, MockTrigger};
    use crate::compositor::{CompositorHandles, RegistrationToken};
    use crate::notify::recording::{Notification, RecordingNotifier};
    use crate::registry::ShortcutBinding;

    fn registry_with(token: &str) -> SessionRegistry<MockCompositor> {
        let mut registry = SessionRegistry::new();
        registry.create_session("/s/1", "app", ":1.42");
        registry.upsert_shortcut(
            "/s/1",
            ShortcutBinding::new(
                "q",
                "Quit",
                "<Control>q",
                RegistrationToken::new(token),
                CompositorHandles::bound(MockTrigger { id: 1, keysym: 0x71 }, MockAction { id: 2 }),
            ),
        );
        registry
    }

    #[test]
    fn test_begin_and_end_reach_owning_client() {
        let registry = registry_with("tok");
        let notifier = RecordingNotifier::default();

        assert!(route(
            &registry,
            &notifier,
            &ActivationEvent::Begin {
                token: RegistrationToken::new("tok"),
                timestamp: 100,
            },
        ));
        assert!(route(
            &registry,
            &notifier,
            &ActivationEvent::End {
                token: RegistrationToken::new("tok"),
                timestamp: 150,
            },
        ));

        assert_eq!(
            notifier.sent(),
            vec![
                Notification::Activated {
                    client: ":1.42".into(),
                    session: "/s/1".into(),
                    shortcut_id: "q".into(),
                    timestamp: 100,
                },
                Notification::Deactivated {
                    client: ":1.42".into(),
                    session: "/s/1".into(),
                    shortcut_id: "q".into(),
                    timestamp: 150,
                },
            ]
        );
    }

    #[test]
    fn test_unknown_token_is_dropped() {
        let registry = registry_with("tok");
        let notifier = RecordingNotifier::default();

        let routed = route(
            &registry,
            &notifier,
            &ActivationEvent::Begin {
                token: RegistrationToken::new("stale"),
                timestamp: 1,
            },
        );
        assert!(!routed);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_token_of_closed_session_is_dropped() {
        let mut registry = registry_with("tok");
        registry.close_session("/s/1");
        let notifier = RecordingNotifier::default();

        assert!(!route(
            &registry,
            &notifier,
            &ActivationEvent::End {
                token: RegistrationToken::new("tok"),
                timestamp: 1,
            },
        ));
        assert!(notifier.sent().is_empty());
    }
}

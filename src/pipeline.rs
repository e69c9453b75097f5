//! Two-phase registration of a single shortcut.
//!
//! `Parsing -> TriggerPending -> ActionPending -> Bound`, or `Failed` from any
//! of them. No retries: the first failure is terminal for the attempt.

use tracing::{debug, info, warn};

use crate::accelerator::Accelerator;
use crate::compositor::{CompositorBinding, CompositorHandles, RegistrationToken};
use crate::error::RegistrationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    Parsing,
    TriggerPending,
    ActionPending,
    Bound,
    Failed,
}

impl RegistrationState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::TriggerPending => "trigger_pending",
            Self::ActionPending => "action_pending",
            Self::Bound => "bound",
            Self::Failed => "failed",
        }
    }
}

/// Terminal success of one registration.
pub struct Bound<C: CompositorBinding> {
    pub token: RegistrationToken,
    pub handles: CompositorHandles<C>,
}

/// The single result a registration reports.
pub struct RegistrationOutcome<C: CompositorBinding> {
    pub shortcut_id: String,
    pub trigger_description: String,
    pub result: Result<Bound<C>, RegistrationError>,
}

impl<C: CompositorBinding> RegistrationOutcome<C> {
    pub fn failed(
        shortcut_id: impl Into<String>,
        trigger_description: impl Into<String>,
        error: RegistrationError,
    ) -> Self {
        Self {
            shortcut_id: shortcut_id.into(),
            trigger_description: trigger_description.into(),
            result: Err(error),
        }
    }
}

struct Attempt<'a> {
    shortcut_id: &'a str,
    state: RegistrationState,
}

impl Attempt<'_> {
    fn advance(&mut self, next: RegistrationState) {
        debug!(
            shortcut_id = self.shortcut_id,
            from = self.state.as_str(),
            to = next.as_str(),
            "Registration state change"
        );
        self.state = next;
    }
}

/// Register `accelerator` as the trigger of a new action named `description`.
///
/// An invalid accelerator fails before the compositor is contacted. When the
/// action bind fails after the trigger was created, the trigger is destroyed
/// here so no half-bound pair outlives the attempt.
pub async fn register_one<C: CompositorBinding>(
    compositor: &C,
    shortcut_id: &str,
    description: &str,
    accelerator: &str,
) -> RegistrationOutcome<C> {
    let mut attempt = Attempt {
        shortcut_id,
        state: RegistrationState::Parsing,
    };

    let parsed = match Accelerator::parse(accelerator) {
        Ok(parsed) => parsed,
        Err(source) => {
            attempt.advance(RegistrationState::Failed);
            warn!(shortcut_id, accelerator, error = %source, "Invalid accelerator");
            return RegistrationOutcome::failed(
                shortcut_id,
                accelerator,
                RegistrationError::AcceleratorInvalid {
                    accelerator: accelerator.to_string(),
                    source,
                },
            );
        }
    };

    attempt.advance(RegistrationState::TriggerPending);
    let Some(trigger) = compositor
        .register_trigger(parsed.modifier_mask(), parsed.keysym)
        .await
    else {
        attempt.advance(RegistrationState::Failed);
        warn!(shortcut_id, accelerator, "Trigger registration failed");
        return RegistrationOutcome::failed(
            shortcut_id,
            accelerator,
            RegistrationError::TriggerRegistrationFailed,
        );
    };

    attempt.advance(RegistrationState::ActionPending);
    let Some((action, token)) = compositor.bind_action(description, &trigger).await else {
        attempt.advance(RegistrationState::Failed);
        warn!(shortcut_id, description, "Action binding failed, dropping trigger");
        CompositorHandles::<C>::from_parts(Some(trigger), None).release(compositor);
        return RegistrationOutcome::failed(
            shortcut_id,
            accelerator,
            RegistrationError::ActionBindingFailed,
        );
    };

    attempt.advance(RegistrationState::Bound);
    info!(
        shortcut_id,
        token = %token,
        trigger = %parsed,
        "Shortcut bound"
    );
    RegistrationOutcome {
        shortcut_id: shortcut_id.to_string(),
        trigger_description: accelerator.to_string(),
        result: Ok(Bound {
            token,
            handles: CompositorHandles::bound(trigger, action),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accelerator::MOD_CTRL;
    use crate::compositor::mock::{Call, MockCompositor};

    #[tokio::test]
    async fn test_register_one_success() {
        let mock = MockCompositor::new();
        let outcome = register_one(&mock, "q", "Quit", "<Control>q").await;

        let bound = outcome.result.unwrap();
        assert_eq!(bound.token.as_str(), "token-1");
        assert!(bound.handles.is_bound());
        assert_eq!(
            mock.calls(),
            vec![
                Call::RegisterTrigger {
                    id: 1,
                    modifiers: MOD_CTRL,
                    keysym: 0x71
                },
                Call::BindAction {
                    id: 2,
                    description: "Quit".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_accelerator_never_contacts_compositor() {
        let mock = MockCompositor::new();
        let outcome = register_one(&mock, "s", "Save", "bogus-accel").await;

        assert!(matches!(
            outcome.result,
            Err(RegistrationError::AcceleratorInvalid { .. })
        ));
        assert_eq!(outcome.trigger_description, "bogus-accel");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_failure_skips_action() {
        let mock = MockCompositor::new();
        mock.fail_trigger(0x71);
        let outcome = register_one(&mock, "q", "Quit", "<Control>q").await;

        assert!(matches!(
            outcome.result,
            Err(RegistrationError::TriggerRegistrationFailed)
        ));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_action_failure_destroys_orphaned_trigger() {
        let mock = MockCompositor::new();
        mock.fail_action("Quit");
        let outcome = register_one(&mock, "q", "Quit", "<Control>q").await;

        assert!(matches!(
            outcome.result,
            Err(RegistrationError::ActionBindingFailed)
        ));
        assert_eq!(mock.calls().last(), Some(&Call::DestroyTrigger(1)));
        assert_eq!(mock.live_triggers(), 0);
        assert_eq!(mock.live_actions(), 0);
    }
}

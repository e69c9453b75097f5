//! Confirmation step between a BindShortcuts request and registration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::ShortcutRequest;

/// What the user (or policy) decided for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Chosen accelerator per shortcut id. Missing ids were not accepted.
    Accepted(HashMap<String, String>),
    Declined,
}

/// Presents proposed shortcuts and returns the accepted accelerators.
pub trait ShortcutPrompt {
    fn choose(&self, app_id: &str, shortcuts: &[ShortcutRequest]) -> PromptOutcome;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptPolicy {
    #[default]
    AcceptPreferred,
    Decline,
}

/// Answers without user interaction according to [`PromptPolicy`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessPrompt {
    policy: PromptPolicy,
    fallback_trigger: Option<String>,
}

impl HeadlessPrompt {
    pub fn new(policy: PromptPolicy, fallback_trigger: Option<String>) -> Self {
        Self {
            policy,
            fallback_trigger,
        }
    }
}

impl ShortcutPrompt for HeadlessPrompt {
    fn choose(&self, app_id: &str, shortcuts: &[ShortcutRequest]) -> PromptOutcome {
        if self.policy == PromptPolicy::Decline {
            info!(app_id, requested = shortcuts.len(), "Declining shortcut request");
            return PromptOutcome::Declined;
        }

        let chosen: HashMap<String, String> = shortcuts
            .iter()
            .filter_map(|s| {
                s.preferred_trigger
                    .as_ref()
                    .filter(|t| !t.trim().is_empty())
                    .or(self.fallback_trigger.as_ref())
                    .map(|t| (s.id.clone(), t.clone()))
            })
            .collect();
        info!(
            app_id,
            requested = shortcuts.len(),
            accepted = chosen.len(),
            "Accepted preferred triggers"
        );
        PromptOutcome::Accepted(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests() -> Vec<ShortcutRequest> {
        vec![
            ShortcutRequest::new("q", "Quit").with_preferred_trigger("<Control>q"),
            ShortcutRequest::new("s", "Save"),
            ShortcutRequest::new("e", "Empty").with_preferred_trigger(""),
        ]
    }

    #[test]
    fn test_accept_preferred_omits_shortcuts_without_trigger() {
        let prompt = HeadlessPrompt::new(PromptPolicy::AcceptPreferred, None);
        let PromptOutcome::Accepted(chosen) = prompt.choose("org.app", &requests()) else {
            panic!("Expected Accepted");
        };
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen.get("q").map(String::as_str), Some("<Control>q"));
    }

    #[test]
    fn test_accept_preferred_uses_fallback() {
        let prompt =
            HeadlessPrompt::new(PromptPolicy::AcceptPreferred, Some("<Super>F12".to_string()));
        let PromptOutcome::Accepted(chosen) = prompt.choose("org.app", &requests()) else {
            panic!("Expected Accepted");
        };
        assert_eq!(chosen.get("q").map(String::as_str), Some("<Control>q"));
        assert_eq!(chosen.get("s").map(String::as_str), Some("<Super>F12"));
        assert_eq!(chosen.get("e").map(String::as_str), Some("<Super>F12"));
    }

    #[test]
    fn test_decline_policy() {
        let prompt = HeadlessPrompt::new(PromptPolicy::Decline, Some("<Alt>x".into()));
        assert_eq!(prompt.choose("org.app", &requests()), PromptOutcome::Declined);
    }

    #[test]
    fn test_policy_deserializes_camel_case() {
        let policy: PromptPolicy = serde_json::from_str(r#""acceptPreferred""#).unwrap();
        assert_eq!(policy, PromptPolicy::AcceptPreferred);
        let policy: PromptPolicy = serde_json::from_str(r#""decline""#).unwrap();
        assert_eq!(policy, PromptPolicy::Decline);
    }
}

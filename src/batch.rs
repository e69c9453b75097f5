//! Batch coordinator: fans a BindShortcuts request out to one registration
//! task per shortcut and joins on all of them.
//!
//! Each task reports exactly one [`RegistrationOutcome`] over an mpsc channel;
//! the coordinator owns the countdown and is the only writer to the registry
//! for this batch. Must run inside a `LocalSet`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::compositor::{CompositorBinding, RegistrationToken};
use crate::error::RegistrationError;
use crate::pipeline::{register_one, RegistrationOutcome};
use crate::registry::{SessionRegistry, ShortcutBinding, UpsertOutcome};

/// One shortcut as requested by a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutRequest {
    pub id: String,
    pub description: String,
    pub preferred_trigger: Option<String>,
}

impl ShortcutRequest {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            preferred_trigger: None,
        }
    }

    pub fn with_preferred_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.preferred_trigger = Some(trigger.into());
        self
    }
}

/// A successfully bound shortcut as reported back to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundShortcut {
    pub id: String,
    pub token: RegistrationToken,
}

/// Register every shortcut that has a chosen accelerator and store the
/// successes in `session_handle`.
///
/// Individual failures only omit that shortcut. Results are listed in
/// submission order. A successful registration whose session disappeared in
/// the meantime is released and left out.
pub async fn bind<C: CompositorBinding + 'static>(
    compositor: &Rc<C>,
    registry: &RefCell<SessionRegistry<C>>,
    session_handle: &str,
    shortcuts: &[ShortcutRequest],
    chosen: &HashMap<String, String>,
) -> Vec<BoundShortcut> {
    if shortcuts.is_empty() {
        return Vec::new();
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, RegistrationOutcome<C>)>();
    for (index, shortcut) in shortcuts.iter().enumerate() {
        let Some(accelerator) = chosen.get(&shortcut.id) else {
            let _ = tx.send((
                index,
                RegistrationOutcome::failed(&shortcut.id, "", RegistrationError::NoTriggerChosen),
            ));
            continue;
        };

        let tx = tx.clone();
        let compositor = compositor.clone();
        let shortcut_id = shortcut.id.clone();
        let description = shortcut.description.clone();
        let accelerator = accelerator.clone();
        tokio::task::spawn_local(async move {
            let outcome =
                register_one(compositor.as_ref(), &shortcut_id, &description, &accelerator).await;
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    let mut outstanding = shortcuts.len();
    let mut results: Vec<Option<BoundShortcut>> = vec![None; shortcuts.len()];

    while outstanding > 0 {
        let Some((index, outcome)) = rx.recv().await else {
            warn!(session = session_handle, outstanding, "Registration task vanished");
            break;
        };
        outstanding -= 1;

        let bound = match outcome.result {
            Ok(bound) => bound,
            Err(e) => {
                debug!(
                    session = session_handle,
                    shortcut_id = %outcome.shortcut_id,
                    error = %e,
                    "Shortcut omitted from batch"
                );
                continue;
            }
        };

        let request = &shortcuts[index];
        let token = bound.token.clone();
        let binding = ShortcutBinding::new(
            &request.id,
            &request.description,
            outcome.trigger_description,
            bound.token,
            bound.handles,
        );

        let upsert = registry.borrow_mut().upsert_shortcut(session_handle, binding);
        match upsert {
            UpsertOutcome::Inserted => {}
            UpsertOutcome::Replaced(old) => {
                // Duplicate id in the batch: the later completion wins
                if let Some(slot) = results
                    .iter_mut()
                    .find(|r| r.as_ref().is_some_and(|b| b.token == old.token))
                {
                    *slot = None;
                }
                old.release(compositor);
            }
            UpsertOutcome::SessionMissing(orphan) => {
                info!(
                    session = session_handle,
                    shortcut_id = %orphan.id,
                    "Session closed during registration, releasing binding"
                );
                orphan.release(compositor);
                continue;
            }
        }

        results[index] = Some(BoundShortcut {
            id: request.id.clone(),
            token,
        });
    }

    let bound: Vec<BoundShortcut> = results.into_iter().flatten().collect();
    info!(
        session = session_handle,
        bound = bound.len(),
        "Batch finished"
    );
    bound
}

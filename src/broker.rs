//! Broker context: the compositor, the session registry, and the two outbound
//! collaborators, owned together and shared on the loop thread.
//!
//! Capabilities are resolved before the broker is built; a compositor without
//! them is still accepted and every BindShortcuts answers
//! [`RequestError::CapabilityUnavailable`].
//!
//! No `RefCell` borrow is held across an await. Between suspension points any
//! other request may run and touch the same session, so every completion
//! re-checks the registry before storing anything.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::accelerator::Accelerator;
use crate::batch::{self, BoundShortcut, ShortcutRequest};
use crate::compositor::{ActivationEvent, CompositorBinding};
use crate::error::{RequestError, UpdateError};
use crate::notify::PortalNotifier;
use crate::pipeline::register_one;
use crate::prompt::{PromptOutcome, ShortcutPrompt};
use crate::registry::{SessionRegistry, ShortcutBinding, UpsertOutcome};
use crate::router;

/// One shortcut in a console listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutSummary {
    pub id: String,
    pub description: String,
    pub trigger_description: String,
    /// Canonical `Ctrl+Shift+Q` form when the trigger parses
    pub trigger: String,
    pub token: String,
}

/// One session in a console listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub handle: String,
    pub app_id: String,
    pub client: String,
    pub shortcuts: Vec<ShortcutSummary>,
}

pub struct Broker<C: CompositorBinding> {
    compositor: Rc<C>,
    registry: RefCell<SessionRegistry<C>>,
    notifier: Box<dyn PortalNotifier>,
    prompt: Box<dyn ShortcutPrompt>,
}

impl<C: CompositorBinding + 'static> Broker<C> {
    pub fn new(
        compositor: Rc<C>,
        notifier: Box<dyn PortalNotifier>,
        prompt: Box<dyn ShortcutPrompt>,
    ) -> Self {
        Self {
            compositor,
            registry: RefCell::new(SessionRegistry::new()),
            notifier,
            prompt,
        }
    }

    /// Returns `true` if the session already existed (its client is kept).
    pub fn create_session(&self, session_handle: &str, app_id: &str, client: &str) -> bool {
        let already_exists = self
            .registry
            .borrow_mut()
            .create_session(session_handle, app_id, client);
        if already_exists {
            info!(
                session = session_handle,
                client, "CreateSession on existing session, keeping original client"
            );
        } else {
            info!(session = session_handle, app_id, client, "Session created");
        }
        already_exists
    }

    /// `(shortcut_id, description)` of every bound shortcut.
    pub fn list_shortcuts(&self, session_handle: &str) -> Result<Vec<(String, String)>, RequestError> {
        Ok(self.registry.borrow().list_shortcuts(session_handle)?)
    }

    /// Confirm `shortcuts` with the prompt and bind the accepted ones.
    ///
    /// Capability and session are checked before the prompt runs. Shortcuts
    /// that fail individually are omitted; the request itself still succeeds.
    #[instrument(skip_all, fields(session = session_handle, requested = shortcuts.len()))]
    pub async fn bind_shortcuts(
        &self,
        session_handle: &str,
        shortcuts: Vec<ShortcutRequest>,
    ) -> Result<Vec<BoundShortcut>, RequestError> {
        if !self.compositor.capabilities_ready() {
            warn!("Input trigger capabilities missing, refusing BindShortcuts");
            return Err(RequestError::CapabilityUnavailable);
        }
        let app_id = self
            .registry
            .borrow()
            .get_session(session_handle)?
            .app_id()
            .to_string();

        let chosen = if shortcuts.is_empty() {
            HashMap::new()
        } else {
            match self.prompt.choose(&app_id, &shortcuts) {
                PromptOutcome::Accepted(chosen) => chosen,
                PromptOutcome::Declined => return Err(RequestError::UserDeclined),
            }
        };

        let bound = batch::bind(
            &self.compositor,
            &self.registry,
            session_handle,
            &shortcuts,
            &chosen,
        )
        .await;
        Ok(bound)
    }

    /// Rebind `shortcut_id` to `trigger`.
    ///
    /// The old handles are destroyed before the new registration is issued,
    /// so a failed rebind leaves the shortcut unbound.
    #[instrument(skip(self))]
    pub async fn update_shortcut(
        &self,
        session_handle: &str,
        shortcut_id: &str,
        trigger: &str,
    ) -> Result<BoundShortcut, UpdateError> {
        let removed = {
            let mut registry = self.registry.borrow_mut();
            if !registry.contains(session_handle) {
                return Err(UpdateError::SessionNotFound(session_handle.to_string()));
            }
            registry.remove_shortcut(session_handle, shortcut_id)
        };
        let Some(old) = removed else {
            return Err(UpdateError::ShortcutNotFound {
                session: session_handle.to_string(),
                shortcut_id: shortcut_id.to_string(),
            });
        };

        let description = old.description.clone();
        info!(old_token = %old.token, "Destroying previous binding");
        old.release(&self.compositor);

        let outcome = register_one(self.compositor.as_ref(), shortcut_id, &description, trigger).await;
        let bound = outcome.result.inspect_err(|e| {
            warn!(error = %e, "Rebind failed, shortcut left unbound");
        })?;

        let changed = BoundShortcut {
            id: shortcut_id.to_string(),
            token: bound.token.clone(),
        };
        let binding = ShortcutBinding::new(
            shortcut_id,
            description,
            outcome.trigger_description,
            bound.token,
            bound.handles,
        );
        let upsert = self
            .registry
            .borrow_mut()
            .upsert_shortcut(session_handle, binding);
        match upsert {
            UpsertOutcome::Inserted => {}
            UpsertOutcome::Replaced(other) => {
                // A concurrent bind landed on the same id; this rebind wins
                other.release(&self.compositor);
            }
            UpsertOutcome::SessionMissing(orphan) => {
                orphan.release(&self.compositor);
                return Err(UpdateError::SessionClosed);
            }
        }

        info!(token = %changed.token, "Shortcut rebound");
        self.notifier
            .shortcuts_changed(session_handle, std::slice::from_ref(&changed));
        Ok(changed)
    }

    /// Remove a session and destroy every binding it owns.
    pub fn close_session(&self, session_handle: &str) -> bool {
        let session = self.registry.borrow_mut().close_session(session_handle);
        let Some(session) = session else {
            return false;
        };
        info!(
            session = session_handle,
            bindings = session.bindings().len(),
            "Closing session"
        );
        session.release(&self.compositor);
        self.notifier.session_closed(session_handle);
        true
    }

    /// Close every session created by `client`. Returns how many were closed.
    pub fn client_vanished(&self, client: &str) -> usize {
        let handles = self.registry.borrow().sessions_for_client(client);
        if !handles.is_empty() {
            info!(client, sessions = handles.len(), "Client left the bus");
        }
        let mut closed = 0;
        for handle in &handles {
            if self.close_session(handle) {
                closed += 1;
            }
        }
        closed
    }

    pub fn route_activation(&self, event: &ActivationEvent) -> bool {
        router::route(&self.registry.borrow(), self.notifier.as_ref(), event)
    }

    pub fn snapshot(&self) -> Vec<SessionSummary> {
        let registry = self.registry.borrow();
        registry
            .sessions()
            .into_iter()
            .map(|session| SessionSummary {
                handle: session.handle().to_string(),
                app_id: session.app_id().to_string(),
                client: session.client().to_string(),
                shortcuts: session
                    .bindings()
                    .iter()
                    .map(|b| ShortcutSummary {
                        id: b.id.clone(),
                        description: b.description.clone(),
                        trigger_description: b.trigger_description.clone(),
                        trigger: Accelerator::parse(&b.trigger_description)
                            .map(|a| a.display())
                            .unwrap_or_else(|_| b.trigger_description.clone()),
                        token: b.token.to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Close every session. Used on the way out.
    pub fn shutdown(&self) {
        let handles: Vec<String> = self
            .registry
            .borrow()
            .sessions()
            .iter()
            .map(|s| s.handle().to_string())
            .collect();
        for handle in handles {
            self.close_session(&handle);
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;

//! Session registry: the single source of truth for what is bound.
//!
//! Sessions are addressed by handle. Each session keeps its bindings in a Vec
//! (deterministic listing order) with a HashMap index for O(1) lookup by
//! shortcut id. A token index is maintained alongside so activations can be
//! routed without scanning every session.
//!
//! Mutations never fail. Callers that care about existence check first;
//! anything handed back (replaced bindings, bindings for a vanished session,
//! closed sessions) still owns compositor handles and must be released.

use std::collections::HashMap;

use crate::compositor::{CompositorBinding, CompositorHandles, RegistrationToken};
use crate::error::SessionError;

/// Transport-level sender identity of a client (a D-Bus unique name).
pub type ClientId = String;

/// A fully bound shortcut. Only successful two-phase registrations become one.
pub struct ShortcutBinding<C: CompositorBinding> {
    pub id: String,
    pub description: String,
    /// Accelerator as the user chose it
    pub trigger_description: String,
    pub token: RegistrationToken,
    handles: CompositorHandles<C>,
}

impl<C: CompositorBinding> ShortcutBinding<C> {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        trigger_description: impl Into<String>,
        token: RegistrationToken,
        handles: CompositorHandles<C>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            trigger_description: trigger_description.into(),
            token,
            handles,
        }
    }

    /// Destroy the compositor side of this binding.
    pub fn release(self, compositor: &C) {
        self.handles.release(compositor);
    }
}

pub struct Session<C: CompositorBinding> {
    handle: String,
    app_id: String,
    client: ClientId,
    bindings: Vec<ShortcutBinding<C>>,
    id_to_index: HashMap<String, usize>,
}

impl<C: CompositorBinding> Session<C> {
    fn new(handle: String, app_id: String, client: ClientId) -> Self {
        Self {
            handle,
            app_id,
            client,
            bindings: Vec::new(),
            id_to_index: HashMap::new(),
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn bindings(&self) -> &[ShortcutBinding<C>] {
        &self.bindings
    }

    pub fn get(&self, shortcut_id: &str) -> Option<&ShortcutBinding<C>> {
        self.id_to_index
            .get(shortcut_id)
            .and_then(|&i| self.bindings.get(i))
    }

    /// Release every binding this session owns.
    pub fn release(self, compositor: &C) {
        for binding in self.bindings {
            binding.release(compositor);
        }
    }

    fn upsert(&mut self, binding: ShortcutBinding<C>) -> Option<ShortcutBinding<C>> {
        if let Some(&index) = self.id_to_index.get(&binding.id) {
            Some(std::mem::replace(&mut self.bindings[index], binding))
        } else {
            self.id_to_index.insert(binding.id.clone(), self.bindings.len());
            self.bindings.push(binding);
            None
        }
    }

    fn remove(&mut self, shortcut_id: &str) -> Option<ShortcutBinding<C>> {
        let index = self.id_to_index.remove(shortcut_id)?;
        let removed = self.bindings.remove(index);
        for slot in self.id_to_index.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed)
    }
}

/// Who receives the notifications for a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationTarget {
    pub session_handle: String,
    pub client: ClientId,
    pub shortcut_id: String,
}

/// Result of [`SessionRegistry::upsert_shortcut`].
pub enum UpsertOutcome<C: CompositorBinding> {
    Inserted,
    /// Same shortcut id was already bound; the previous binding is returned
    Replaced(ShortcutBinding<C>),
    /// The session is gone; the binding was not stored
    SessionMissing(ShortcutBinding<C>),
}

pub struct SessionRegistry<C: CompositorBinding> {
    sessions: HashMap<String, Session<C>>,
    tokens: HashMap<RegistrationToken, (String, String)>,
}

impl<C: CompositorBinding> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CompositorBinding> SessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
        }
    }

    /// Insert an empty session. Returns `true` if the handle already existed,
    /// in which case the stored client identity is left untouched.
    pub fn create_session(&mut self, handle: &str, app_id: &str, client: &str) -> bool {
        if self.sessions.contains_key(handle) {
            return true;
        }
        self.sessions.insert(
            handle.to_string(),
            Session::new(handle.to_string(), app_id.to_string(), client.to_string()),
        );
        false
    }

    pub fn get_session(&self, handle: &str) -> Result<&Session<C>, SessionError> {
        self.sessions
            .get(handle)
            .ok_or_else(|| SessionError::NotFound(handle.to_string()))
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.sessions.contains_key(handle)
    }

    /// `(shortcut_id, description)` of every bound shortcut, in binding order.
    pub fn list_shortcuts(&self, handle: &str) -> Result<Vec<(String, String)>, SessionError> {
        let session = self.get_session(handle)?;
        Ok(session
            .bindings
            .iter()
            .map(|b| (b.id.clone(), b.description.clone()))
            .collect())
    }

    pub fn upsert_shortcut(&mut self, handle: &str, binding: ShortcutBinding<C>) -> UpsertOutcome<C> {
        let Some(session) = self.sessions.get_mut(handle) else {
            return UpsertOutcome::SessionMissing(binding);
        };
        let token = binding.token.clone();
        let shortcut_id = binding.id.clone();
        let previous = session.upsert(binding);
        if let Some(old) = &previous {
            self.tokens.remove(&old.token);
        }
        self.tokens.insert(token, (handle.to_string(), shortcut_id));
        match previous {
            Some(old) => UpsertOutcome::Replaced(old),
            None => UpsertOutcome::Inserted,
        }
    }

    pub fn remove_shortcut(&mut self, handle: &str, shortcut_id: &str) -> Option<ShortcutBinding<C>> {
        let removed = self.sessions.get_mut(handle)?.remove(shortcut_id)?;
        self.tokens.remove(&removed.token);
        Some(removed)
    }

    /// Remove a session and hand it back for release.
    pub fn close_session(&mut self, handle: &str) -> Option<Session<C>> {
        let session = self.sessions.remove(handle)?;
        for binding in &session.bindings {
            self.tokens.remove(&binding.token);
        }
        Some(session)
    }

    /// Handles of every session created by `client`, sorted.
    pub fn sessions_for_client(&self, client: &str) -> Vec<String> {
        let mut handles: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.client == client)
            .map(|s| s.handle.clone())
            .collect();
        handles.sort();
        handles
    }

    pub fn resolve_token(&self, token: &RegistrationToken) -> Option<ActivationTarget> {
        let (handle, shortcut_id) = self.tokens.get(token)?;
        let session = self.sessions.get(handle)?;
        Some(ActivationTarget {
            session_handle: handle.clone(),
            client: session.client.clone(),
            shortcut_id: shortcut_id.clone(),
        })
    }

    /// All sessions ordered by handle.
    pub fn sessions(&self) -> Vec<&Session<C>> {
        let mut sessions: Vec<&Session<C>> = self.sessions.values().collect();
        sessions.sort_by(|a, b| a.handle.cmp(&b.handle));
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

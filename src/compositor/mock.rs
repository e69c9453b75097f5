//! Scripted in-memory compositor.
//!
//! Every request is recorded in order so tests can assert on create/destroy
//! sequencing. Completions are deferred with `yield_now` so that concurrent
//! registrations genuinely interleave on the local task set.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tokio::sync::Notify;

use super::{CompositorBinding, RegistrationToken};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    RegisterTrigger { id: u32, modifiers: u32, keysym: u32 },
    BindAction { id: u32, description: String },
    DestroyTrigger(u32),
    DestroyAction(u32),
}

#[derive(Debug)]
pub struct MockTrigger {
    pub id: u32,
    pub keysym: u32,
}

#[derive(Debug)]
pub struct MockAction {
    pub id: u32,
}

pub struct MockCompositor {
    ready: Cell<bool>,
    next_id: Cell<u32>,
    next_token: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    live_triggers: RefCell<HashSet<u32>>,
    live_actions: RefCell<HashSet<u32>>,
    failing_keysyms: RefCell<HashSet<u32>>,
    failing_actions: RefCell<HashSet<String>>,
    gates: RefCell<HashMap<u32, Rc<Notify>>>,
}

impl Default for MockCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompositor {
    pub fn new() -> Self {
        Self {
            ready: Cell::new(true),
            next_id: Cell::new(1),
            next_token: Cell::new(1),
            calls: RefCell::new(Vec::new()),
            live_triggers: RefCell::new(HashSet::new()),
            live_actions: RefCell::new(HashSet::new()),
            failing_keysyms: RefCell::new(HashSet::new()),
            failing_actions: RefCell::new(HashSet::new()),
            gates: RefCell::new(HashMap::new()),
        }
    }

    /// Behave as if discovery found neither manager.
    pub fn without_capabilities() -> Self {
        let mock = Self::new();
        mock.ready.set(false);
        mock
    }

    /// Answer `failed` to every trigger registered for `keysym`.
    pub fn fail_trigger(&self, keysym: u32) {
        self.failing_keysyms.borrow_mut().insert(keysym);
    }

    /// Never issue a token for actions named `description`.
    pub fn fail_action(&self, description: &str) {
        self.failing_actions
            .borrow_mut()
            .insert(description.to_string());
    }

    /// Hold trigger completions for `keysym` until the returned gate is notified.
    pub fn gate_trigger(&self, keysym: u32) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.gates.borrow_mut().insert(keysym, gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn live_triggers(&self) -> usize {
        self.live_triggers.borrow().len()
    }

    pub fn live_actions(&self) -> usize {
        self.live_actions.borrow().len()
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl CompositorBinding for MockCompositor {
    type Trigger = MockTrigger;
    type Action = MockAction;

    fn capabilities_ready(&self) -> bool {
        self.ready.get()
    }

    async fn register_trigger(&self, modifiers: u32, keysym: u32) -> Option<MockTrigger> {
        let id = self.allocate_id();
        self.calls.borrow_mut().push(Call::RegisterTrigger {
            id,
            modifiers,
            keysym,
        });

        let gate = self.gates.borrow().get(&keysym).cloned();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        if self.failing_keysyms.borrow().contains(&keysym) {
            // The compositor destroys its side; the proxy is gone with it
            return None;
        }
        self.live_triggers.borrow_mut().insert(id);
        Some(MockTrigger { id, keysym })
    }

    async fn bind_action(
        &self,
        description: &str,
        _trigger: &MockTrigger,
    ) -> Option<(MockAction, RegistrationToken)> {
        let id = self.allocate_id();
        self.calls.borrow_mut().push(Call::BindAction {
            id,
            description: description.to_string(),
        });
        tokio::task::yield_now().await;

        if self.failing_actions.borrow().contains(description) {
            return None;
        }
        let n = self.next_token.get();
        self.next_token.set(n + 1);
        self.live_actions.borrow_mut().insert(id);
        Some((MockAction { id }, RegistrationToken::new(format!("token-{}", n))))
    }

    fn destroy_trigger(&self, trigger: MockTrigger) {
        self.calls.borrow_mut().push(Call::DestroyTrigger(trigger.id));
        self.live_triggers.borrow_mut().remove(&trigger.id);
    }

    fn destroy_action(&self, action: MockAction) {
        self.calls.borrow_mut().push(Call::DestroyAction(action.id));
        self.live_actions.borrow_mut().remove(&action.id);
    }
}

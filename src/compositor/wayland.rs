//! Wayland backend for [`CompositorBinding`].
//!
//! Discovery binds the two input trigger globals. Requests are issued from
//! whichever local task needs them and flushed immediately; every reply is
//! delivered by [`EventPump`], a local task that reads the connection when the
//! socket becomes readable and dispatches into [`WaylandState`].

use std::io::ErrorKind;
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use wayland_client::backend::WaylandError;
use wayland_client::globals::{registry_queue_init, GlobalListContents};
use wayland_client::protocol::{wl_callback, wl_registry};
use wayland_client::{delegate_noop, Connection, Dispatch, EventQueue, Proxy, QueueHandle};

use super::protocol::{
    ext_input_trigger_action_control_v1, ext_input_trigger_action_v1, ext_input_trigger_v1,
    ExtInputTriggerActionControlV1, ExtInputTriggerActionManagerV1, ExtInputTriggerActionV1,
    ExtInputTriggerRegistrationManagerV1, ExtInputTriggerV1,
};
use super::{ActivationEvent, CompositorBinding, RegistrationToken};
use crate::error::GatekeeperError;

const REGISTRATION_MANAGER: &str = "ext_input_trigger_registration_manager_v1";
const ACTION_MANAGER: &str = "ext_input_trigger_action_manager_v1";

/// One-shot reply slot attached to a proxy as its user data.
pub struct Pending<T>(Mutex<Option<oneshot::Sender<T>>>);

impl<T> Pending<T> {
    fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self(Mutex::new(Some(tx))), rx)
    }

    fn resolve(&self, value: T) {
        if let Some(tx) = self.0.lock().take() {
            let _ = tx.send(value);
        }
    }
}

/// User data of a subscribed action.
pub struct ActionData {
    token: RegistrationToken,
    unavailable: AtomicBool,
}

/// Dispatch target for every proxy created by the backend.
pub struct WaylandState {
    activations: mpsc::UnboundedSender<ActivationEvent>,
}

/// Action side of a bound shortcut: the control object and the subscription.
pub struct WaylandAction {
    control: ExtInputTriggerActionControlV1,
    action: ExtInputTriggerActionV1,
}

struct Link {
    conn: Connection,
    qh: QueueHandle<WaylandState>,
    registration: Option<ExtInputTriggerRegistrationManagerV1>,
    actions: Option<ExtInputTriggerActionManagerV1>,
}

impl Link {
    fn flush(&self) {
        match self.conn.flush() {
            Ok(()) => {}
            // The pump flushes again before it next waits
            Err(WaylandError::Io(e)) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!(error = %e, "Failed to flush Wayland connection"),
        }
    }
}

pub struct WaylandCompositor {
    link: Option<Link>,
}

impl WaylandCompositor {
    /// Connect to `$WAYLAND_DISPLAY` and bind the input trigger globals.
    ///
    /// Missing globals are not an error: the compositor comes back with
    /// `capabilities_ready() == false` and every bind request is refused.
    pub fn connect(
        activations: mpsc::UnboundedSender<ActivationEvent>,
    ) -> Result<(Self, EventPump), GatekeeperError> {
        info!("Connecting to Wayland display");
        let conn = Connection::connect_to_env()
            .map_err(|e| GatekeeperError::Wayland(e.to_string()))?;
        let (globals, queue) = registry_queue_init::<WaylandState>(&conn)
            .map_err(|e| GatekeeperError::Wayland(e.to_string()))?;
        let qh = queue.handle();

        let registration = globals
            .bind::<ExtInputTriggerRegistrationManagerV1, _, _>(&qh, 1..=1, ())
            .map_err(|e| warn!(interface = REGISTRATION_MANAGER, error = %e, "Global not bound"))
            .ok();
        let actions = globals
            .bind::<ExtInputTriggerActionManagerV1, _, _>(&qh, 1..=1, ())
            .map_err(|e| warn!(interface = ACTION_MANAGER, error = %e, "Global not bound"))
            .ok();

        info!(
            registration = registration.is_some(),
            actions = actions.is_some(),
            "Wayland discovery finished"
        );

        let pump = EventPump {
            conn: conn.clone(),
            queue,
            state: WaylandState { activations },
        };
        let compositor = Self {
            link: Some(Link {
                conn,
                qh,
                registration,
                actions,
            }),
        };
        Ok((compositor, pump))
    }

    /// A compositor with no connection; every bind is refused.
    pub fn disconnected() -> Self {
        Self { link: None }
    }
}

impl CompositorBinding for WaylandCompositor {
    type Trigger = ExtInputTriggerV1;
    type Action = WaylandAction;

    fn capabilities_ready(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|l| l.registration.is_some() && l.actions.is_some())
    }

    async fn register_trigger(&self, modifiers: u32, keysym: u32) -> Option<ExtInputTriggerV1> {
        let link = self.link.as_ref()?;
        let registration = link.registration.as_ref()?;

        let (pending, rx) = Pending::<bool>::new();
        let trigger =
            registration.register_keyboard_sym_trigger(modifiers, keysym, &link.qh, pending);
        link.flush();
        debug!(modifiers, keysym, "Trigger requested");

        match rx.await {
            Ok(true) => Some(trigger),
            _ => {
                trigger.destroy();
                link.flush();
                None
            }
        }
    }

    async fn bind_action(
        &self,
        description: &str,
        trigger: &ExtInputTriggerV1,
    ) -> Option<(WaylandAction, RegistrationToken)> {
        let link = self.link.as_ref()?;
        let (registration, actions) = (link.registration.as_ref()?, link.actions.as_ref()?);

        let (pending, rx) = Pending::<String>::new();
        let control = registration.get_action_control(description.to_string(), &link.qh, pending);
        control.add_input_trigger_event(trigger);
        link.flush();

        let token = match rx.await {
            Ok(token) if !token.is_empty() => RegistrationToken::new(token),
            _ => {
                control.destroy();
                link.flush();
                return None;
            }
        };

        let data = ActionData {
            token: token.clone(),
            unavailable: AtomicBool::new(false),
        };
        let action = actions.get_input_trigger_action(token.as_str().to_string(), &link.qh, data);

        // Begin/end must be subscribed before the binding is reported
        let (pending, rx) = Pending::<()>::new();
        link.conn.display().sync(&link.qh, pending);
        link.flush();
        let synced = rx.await.is_ok();

        let unavailable = action
            .data::<ActionData>()
            .is_some_and(|d| d.unavailable.load(Ordering::Relaxed));
        if !synced || unavailable {
            action.destroy();
            control.destroy();
            link.flush();
            return None;
        }

        Some((WaylandAction { control, action }, token))
    }

    fn destroy_trigger(&self, trigger: ExtInputTriggerV1) {
        trigger.destroy();
        if let Some(link) = &self.link {
            link.flush();
        }
    }

    fn destroy_action(&self, action: WaylandAction) {
        action.action.destroy();
        action.control.destroy();
        if let Some(link) = &self.link {
            link.flush();
        }
    }
}

/// Reads and dispatches the Wayland connection. Run it as a local task.
pub struct EventPump {
    conn: Connection,
    queue: EventQueue<WaylandState>,
    state: WaylandState,
}

impl EventPump {
    pub async fn run(mut self) -> Result<(), GatekeeperError> {
        let fd = self.conn.backend().poll_fd().as_raw_fd();
        let fd = AsyncFd::with_interest(fd, Interest::READABLE)
            .map_err(|e| GatekeeperError::Wayland(e.to_string()))?;

        loop {
            self.queue
                .dispatch_pending(&mut self.state)
                .map_err(|e| GatekeeperError::Wayland(e.to_string()))?;
            match self.queue.flush() {
                Ok(()) => {}
                Err(WaylandError::Io(e)) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return Err(GatekeeperError::Wayland(e.to_string())),
            }

            let Some(guard) = self.queue.prepare_read() else {
                continue;
            };
            let mut ready = fd
                .readable()
                .await
                .map_err(|e| GatekeeperError::Wayland(e.to_string()))?;
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(e)) if e.kind() == ErrorKind::WouldBlock => {
                    ready.clear_ready();
                }
                Err(e) => return Err(GatekeeperError::Wayland(e.to_string())),
            }
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for WaylandState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

delegate_noop!(WaylandState: ExtInputTriggerRegistrationManagerV1);
delegate_noop!(WaylandState: ExtInputTriggerActionManagerV1);

impl Dispatch<wl_callback::WlCallback, Pending<()>> for WaylandState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_callback::WlCallback,
        event: wl_callback::Event,
        data: &Pending<()>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            data.resolve(());
        }
    }
}

impl Dispatch<ExtInputTriggerV1, Pending<bool>> for WaylandState {
    fn event(
        _state: &mut Self,
        _proxy: &ExtInputTriggerV1,
        event: ext_input_trigger_v1::Event,
        data: &Pending<bool>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            ext_input_trigger_v1::Event::Done => data.resolve(true),
            ext_input_trigger_v1::Event::Failed => data.resolve(false),
            _ => {}
        }
    }
}

impl Dispatch<ExtInputTriggerActionControlV1, Pending<String>> for WaylandState {
    fn event(
        _state: &mut Self,
        _proxy: &ExtInputTriggerActionControlV1,
        event: ext_input_trigger_action_control_v1::Event,
        data: &Pending<String>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let ext_input_trigger_action_control_v1::Event::Done { token } = event {
            data.resolve(token);
        }
    }
}

impl Dispatch<ExtInputTriggerActionV1, ActionData> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &ExtInputTriggerActionV1,
        event: ext_input_trigger_action_v1::Event,
        data: &ActionData,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let activation = match event {
            ext_input_trigger_action_v1::Event::Begin { time, .. } => ActivationEvent::Begin {
                token: data.token.clone(),
                timestamp: time,
            },
            ext_input_trigger_action_v1::Event::End { time, .. } => ActivationEvent::End {
                token: data.token.clone(),
                timestamp: time,
            },
            ext_input_trigger_action_v1::Event::Unavailable => {
                warn!(token = %data.token, "Compositor reports action unavailable");
                data.unavailable.store(true, Ordering::Relaxed);
                return;
            }
            _ => return,
        };
        // Receiver gone means the broker loop is shutting down
        let _ = state.activations.send(activation);
    }
}

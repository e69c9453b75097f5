//! The broker loop.
//!
//! One `select!` multiplexes portal requests, console commands and compositor
//! activations. Requests that may suspend (BindShortcuts, rebinds) run as
//! local tasks so the loop keeps serving other sessions meanwhile.

use std::rc::Rc;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::batch::{BoundShortcut, ShortcutRequest};
use crate::broker::Broker;
use crate::compositor::{ActivationEvent, CompositorBinding};
use crate::error::RequestError;
use crate::stdin_commands::ConsoleCommand;

/// A portal method call forwarded from the D-Bus side.
#[derive(Debug)]
pub enum PortalRequest {
    CreateSession {
        session_handle: String,
        app_id: String,
        client: String,
        /// `true` if the session already existed
        reply: oneshot::Sender<bool>,
    },
    BindShortcuts {
        session_handle: String,
        shortcuts: Vec<ShortcutRequest>,
        reply: oneshot::Sender<Result<Vec<BoundShortcut>, RequestError>>,
    },
    ListShortcuts {
        session_handle: String,
        reply: oneshot::Sender<Result<Vec<(String, String)>, RequestError>>,
    },
    CloseSession {
        session_handle: String,
        reply: oneshot::Sender<bool>,
    },
    ClientVanished {
        client: String,
    },
}

/// Handle one portal request. Replies are dropped silently if the caller
/// went away.
pub async fn handle_request<C: CompositorBinding + 'static>(
    broker: Rc<Broker<C>>,
    request: PortalRequest,
) {
    match request {
        PortalRequest::CreateSession {
            session_handle,
            app_id,
            client,
            reply,
        } => {
            let _ = reply.send(broker.create_session(&session_handle, &app_id, &client));
        }
        PortalRequest::BindShortcuts {
            session_handle,
            shortcuts,
            reply,
        } => {
            let result = broker.bind_shortcuts(&session_handle, shortcuts).await;
            let _ = reply.send(result);
        }
        PortalRequest::ListShortcuts {
            session_handle,
            reply,
        } => {
            let _ = reply.send(broker.list_shortcuts(&session_handle));
        }
        PortalRequest::CloseSession {
            session_handle,
            reply,
        } => {
            let _ = reply.send(broker.close_session(&session_handle));
        }
        PortalRequest::ClientVanished { client } => {
            broker.client_vanished(&client);
        }
    }
}

/// Execute a console command. Output goes to stdout, one JSON object per line.
pub async fn handle_console_command<C: CompositorBinding + 'static>(
    broker: Rc<Broker<C>>,
    command: ConsoleCommand,
) {
    let request_id = command.request_id().map(str::to_string);
    match command {
        ConsoleCommand::List { .. } => {
            let sessions = broker.snapshot();
            info!(request_id = ?request_id, sessions = sessions.len(), "Listing sessions");
            for session in sessions {
                match serde_json::to_string(&session) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(error = %e, "Failed to serialize session"),
                }
            }
        }
        ConsoleCommand::UpdateShortcut {
            session,
            shortcut_id,
            trigger,
            ..
        } => match broker.update_shortcut(&session, &shortcut_id, &trigger).await {
            Ok(changed) => info!(
                request_id = ?request_id,
                session = %session,
                shortcut_id = %changed.id,
                token = %changed.token,
                "Console rebind succeeded"
            ),
            Err(e) => warn!(
                request_id = ?request_id,
                session = %session,
                shortcut_id = %shortcut_id,
                error = %e,
                "Console rebind failed"
            ),
        },
        ConsoleCommand::CloseSession { session, .. } => {
            let closed = broker.close_session(&session);
            info!(request_id = ?request_id, session = %session, closed, "Console close");
        }
    }
}

async fn next_command(
    console: &Option<async_channel::Receiver<ConsoleCommand>>,
) -> Option<ConsoleCommand> {
    match console {
        Some(rx) => rx.recv().await.ok(),
        None => std::future::pending().await,
    }
}

/// Run until the portal request channel closes. Must run inside a `LocalSet`.
pub async fn run<C: CompositorBinding + 'static>(
    broker: Rc<Broker<C>>,
    requests: async_channel::Receiver<PortalRequest>,
    mut console: Option<async_channel::Receiver<ConsoleCommand>>,
    mut activations: mpsc::UnboundedReceiver<ActivationEvent>,
) {
    info!("Broker loop started");
    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Ok(request) => {
                    tokio::task::spawn_local(handle_request(broker.clone(), request));
                }
                Err(_) => {
                    info!("Portal request channel closed");
                    break;
                }
            },
            Some(event) = activations.recv() => {
                broker.route_activation(&event);
            }
            command = next_command(&console) => match command {
                Some(command) => {
                    tokio::task::spawn_local(handle_console_command(broker.clone(), command));
                }
                None => {
                    info!("Console closed");
                    console = None;
                }
            },
        }
    }
    broker.shutdown();
    info!("Broker loop stopped");
}

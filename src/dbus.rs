//! D-Bus surface: the `org.freedesktop.impl.portal.GlobalShortcuts`
//! implementation, per-session `org.freedesktop.impl.portal.Session` objects,
//! and delivery of notifications back to clients.
//!
//! Method handlers run on zbus' executor and never touch broker state. They
//! forward a [`PortalRequest`] into the loop and await the reply on a oneshot.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use zbus::fdo;
use zbus::message::Header;
use zbus::names::BusName;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};
use zbus::{interface, Connection, ObjectServer, SignalContext};

use crate::batch::{BoundShortcut, ShortcutRequest};
use crate::error::{GatekeeperError, ResultExt, Response};
use crate::notify::PortalNotifier;
use crate::registry::ActivationTarget;
use crate::service::PortalRequest;

/// Interface clients implement at their session path to receive activations.
const CLIENT_INTERFACE: &str = "org.freedesktop.portal.GlobalShortcuts";

type Results = HashMap<String, OwnedValue>;

fn owned(value: Value<'_>) -> fdo::Result<OwnedValue> {
    value
        .try_to_owned()
        .map_err(|e| fdo::Error::Failed(e.to_string()))
}

fn string_option(options: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    match options.get(key).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str().to_string()),
        _ => None,
    }
}

/// `a(sa{sv})` with one `trigger_action_token` entry per shortcut.
fn shortcut_tokens(shortcuts: &[BoundShortcut]) -> fdo::Result<Vec<(String, Results)>> {
    shortcuts
        .iter()
        .map(|s| {
            let mut entry = Results::new();
            entry.insert(
                "trigger_action_token".to_string(),
                owned(Value::from(s.token.as_str()))?,
            );
            Ok((s.id.clone(), entry))
        })
        .collect()
}

fn shortcut_descriptions(shortcuts: Vec<(String, String)>) -> fdo::Result<Vec<(String, Results)>> {
    shortcuts
        .into_iter()
        .map(|(id, description)| {
            let mut entry = Results::new();
            entry.insert("description".to_string(), owned(Value::from(description))?);
            Ok((id, entry))
        })
        .collect()
}

fn shortcuts_result(list: Vec<(String, Results)>) -> fdo::Result<Results> {
    let mut results = Results::new();
    results.insert("shortcuts".to_string(), owned(Value::from(list))?);
    Ok(results)
}

/// Served at the configured object path.
pub struct GlobalShortcutsPortal {
    requests: async_channel::Sender<PortalRequest>,
}

impl GlobalShortcutsPortal {
    pub fn new(requests: async_channel::Sender<PortalRequest>) -> Self {
        Self { requests }
    }
}

async fn ask<T>(
    requests: &async_channel::Sender<PortalRequest>,
    make: impl FnOnce(oneshot::Sender<T>) -> PortalRequest,
) -> fdo::Result<T> {
    let (tx, rx) = oneshot::channel();
    requests
        .send(make(tx))
        .await
        .map_err(|_| fdo::Error::Failed("broker is not running".into()))?;
    rx.await
        .map_err(|_| fdo::Error::Failed("broker dropped the request".into()))
}

#[interface(name = "org.freedesktop.impl.portal.GlobalShortcuts")]
impl GlobalShortcutsPortal {
    async fn create_session(
        &self,
        #[zbus(header)] header: Header<'_>,
        #[zbus(object_server)] server: &ObjectServer,
        _request_handle: OwnedObjectPath,
        session_handle: OwnedObjectPath,
        app_id: String,
        _options: HashMap<String, OwnedValue>,
    ) -> fdo::Result<(u32, Results)> {
        let client = header
            .sender()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let handle = session_handle.as_str().to_string();

        let already_exists = ask(&self.requests, |reply| PortalRequest::CreateSession {
            session_handle: handle.clone(),
            app_id,
            client,
            reply,
        })
        .await?;

        if !already_exists {
            let session = SessionObject {
                handle: handle.clone(),
                requests: self.requests.clone(),
            };
            server
                .at(handle.as_str(), session)
                .await
                .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        }
        Ok((Response::Success.code(), Results::new()))
    }

    async fn bind_shortcuts(
        &self,
        _request_handle: OwnedObjectPath,
        session_handle: OwnedObjectPath,
        shortcuts: Vec<(String, HashMap<String, OwnedValue>)>,
        _parent_window: String,
        _options: HashMap<String, OwnedValue>,
    ) -> fdo::Result<(u32, Results)> {
        let shortcuts: Vec<ShortcutRequest> = shortcuts
            .into_iter()
            .map(|(id, options)| ShortcutRequest {
                description: string_option(&options, "description").unwrap_or_else(|| id.clone()),
                preferred_trigger: string_option(&options, "preferred_trigger"),
                id,
            })
            .collect();

        let result = ask(&self.requests, |reply| PortalRequest::BindShortcuts {
            session_handle: session_handle.as_str().to_string(),
            shortcuts,
            reply,
        })
        .await?;

        match result {
            Ok(bound) => Ok((
                Response::Success.code(),
                shortcuts_result(shortcut_tokens(&bound)?)?,
            )),
            Err(e) => {
                info!(session = %session_handle, error = %e, "BindShortcuts refused");
                Ok((e.response().code(), Results::new()))
            }
        }
    }

    async fn list_shortcuts(
        &self,
        _request_handle: OwnedObjectPath,
        session_handle: OwnedObjectPath,
    ) -> fdo::Result<(u32, Results)> {
        let result = ask(&self.requests, |reply| PortalRequest::ListShortcuts {
            session_handle: session_handle.as_str().to_string(),
            reply,
        })
        .await?;

        match result {
            Ok(listed) => Ok((
                Response::Success.code(),
                shortcuts_result(shortcut_descriptions(listed)?)?,
            )),
            Err(e) => Ok((e.response().code(), Results::new())),
        }
    }

    #[zbus(signal)]
    async fn shortcuts_changed(
        ctxt: &SignalContext<'_>,
        session_handle: ObjectPath<'_>,
        shortcuts: Vec<(String, Results)>,
    ) -> zbus::Result<()>;

    #[zbus(property, name = "version")]
    fn version(&self) -> u32 {
        1
    }
}

/// Exported at each session handle while the session exists.
pub struct SessionObject {
    handle: String,
    requests: async_channel::Sender<PortalRequest>,
}

#[interface(name = "org.freedesktop.impl.portal.Session")]
impl SessionObject {
    async fn close(&self) -> fdo::Result<()> {
        let handle = self.handle.clone();
        let closed = ask(&self.requests, |reply| PortalRequest::CloseSession {
            session_handle: handle,
            reply,
        })
        .await?;
        debug!(session = %self.handle, closed, "Session.Close");
        Ok(())
    }

    #[zbus(signal)]
    async fn closed(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    #[zbus(property, name = "version")]
    fn version(&self) -> u32 {
        1
    }
}

/// Open the session bus connection with the portal object served.
///
/// The well-known name is requested separately with [`request_name`] once the
/// broker is ready to answer.
pub async fn connect(
    object_path: &str,
    requests: async_channel::Sender<PortalRequest>,
) -> Result<Connection, GatekeeperError> {
    let conn = zbus::connection::Builder::session()?
        .serve_at(object_path, GlobalShortcutsPortal::new(requests))?
        .build()
        .await?;
    info!(
        object_path,
        unique_name = ?conn.unique_name().map(|n| n.to_string()),
        "Connected to session bus"
    );
    Ok(conn)
}

pub async fn request_name(conn: &Connection, bus_name: &str) -> Result<(), GatekeeperError> {
    conn.request_name(bus_name).await?;
    info!(bus_name, "Bus name acquired");
    Ok(())
}

/// Forward `NameOwnerChanged` disappearances of unique names to the broker.
pub async fn watch_clients(
    conn: Connection,
    requests: async_channel::Sender<PortalRequest>,
) -> Result<(), GatekeeperError> {
    let proxy = fdo::DBusProxy::new(&conn).await?;
    let mut changes = proxy.receive_name_owner_changed().await?;

    while let Some(signal) = changes.next().await {
        let Ok(args) = signal.args() else {
            continue;
        };
        let BusName::Unique(name) = args.name() else {
            continue;
        };
        if args.new_owner().is_some() {
            continue;
        }
        let client = name.to_string();
        debug!(client = %client, "Unique name released");
        if requests
            .send(PortalRequest::ClientVanished { client })
            .await
            .is_err()
        {
            break;
        }
    }
    Ok(())
}

/// [`PortalNotifier`] over the bus connection. Every delivery is spawned so
/// the loop never waits on a client.
pub struct DbusNotifier {
    conn: Connection,
    object_path: String,
}

impl DbusNotifier {
    pub fn new(conn: Connection, object_path: impl Into<String>) -> Self {
        Self {
            conn,
            object_path: object_path.into(),
        }
    }

    fn call_client(&self, target: &ActivationTarget, method: &'static str, timestamp: u32) {
        let conn = self.conn.clone();
        let target = target.clone();
        tokio::spawn(async move {
            let options: HashMap<String, OwnedValue> = HashMap::new();
            conn.call_method(
                Some(target.client.as_str()),
                target.session_handle.as_str(),
                Some(CLIENT_INTERFACE),
                method,
                &(target.shortcut_id.as_str(), timestamp, options),
            )
            .await
            .warn_on_err();
        });
    }
}

impl PortalNotifier for DbusNotifier {
    fn activated(&self, target: &ActivationTarget, timestamp: u32) {
        self.call_client(target, "Activated", timestamp);
    }

    fn deactivated(&self, target: &ActivationTarget, timestamp: u32) {
        self.call_client(target, "Deactivated", timestamp);
    }

    fn shortcuts_changed(&self, session_handle: &str, shortcuts: &[BoundShortcut]) {
        let Some(changed) = shortcut_tokens(shortcuts).warn_on_err() else {
            return;
        };
        let conn = self.conn.clone();
        let object_path = self.object_path.clone();
        let session_handle = session_handle.to_string();
        tokio::spawn(async move {
            let result: zbus::Result<()> = async {
                let ctxt = SignalContext::new(&conn, object_path.as_str())?;
                let session = ObjectPath::try_from(session_handle.as_str())?;
                GlobalShortcutsPortal::shortcuts_changed(&ctxt, session, changed).await
            }
            .await;
            result.warn_on_err();
        });
    }

    fn session_closed(&self, session_handle: &str) {
        let conn = self.conn.clone();
        let session_handle = session_handle.to_string();
        tokio::spawn(async move {
            let result: zbus::Result<bool> = async {
                let ctxt = SignalContext::new(&conn, session_handle.as_str())?;
                SessionObject::closed(&ctxt).await?;
                conn.object_server()
                    .remove::<SessionObject, _>(session_handle.as_str())
                    .await
            }
            .await;
            match result {
                Ok(removed) => debug!(session = %session_handle, removed, "Session object dropped"),
                Err(e) => warn!(session = %session_handle, error = %e, "Failed to drop session object"),
            }
        });
    }
}

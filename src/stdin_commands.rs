//! Interactive console commands via stdin.
//!
//! Enabled with `--show-shortcuts`. Lets whoever runs the service inspect
//! sessions and rebind shortcuts without a GUI.
//!
//! # Protocol
//!
//! Commands are sent as JSON objects, one per line (JSONL format):
//!
//! ```json
//! {"type": "list"}
//! {"type": "updateShortcut", "session": "/org/freedesktop/portal/desktop/session/1_42/t", "shortcutId": "q", "trigger": "<Alt>q"}
//! {"type": "closeSession", "session": "/org/freedesktop/portal/desktop/session/1_42/t"}
//! ```

use tracing::{debug, info, warn};

/// Console commands.
///
/// All commands support an optional `requestId` field. When present, it is
/// logged with every line the command produces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConsoleCommand {
    /// Print every session and its bound shortcuts
    List {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Rebind one shortcut to a new accelerator
    UpdateShortcut {
        session: String,
        #[serde(rename = "shortcutId")]
        shortcut_id: String,
        trigger: String,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Close a session and release its bindings
    CloseSession {
        session: String,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
}

impl ConsoleCommand {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::List { request_id }
            | Self::UpdateShortcut { request_id, .. }
            | Self::CloseSession { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// Start a thread that listens on stdin for console commands.
/// Returns an async_channel::Receiver that can be awaited from the loop.
///
/// Uses a bounded channel with capacity of 100; a human typing commands never
/// gets close. The thread exits when stdin closes or the receiver is dropped.
pub fn start_stdin_listener() -> async_channel::Receiver<ConsoleCommand> {
    use std::io::BufRead;

    let (tx, rx) = async_channel::bounded(100);

    std::thread::spawn(move || {
        info!("Console command listener started");
        let stdin = std::io::stdin();
        let reader = stdin.lock();

        for line in reader.lines() {
            match line {
                Ok(line) if !line.trim().is_empty() => {
                    debug!(line = %line, "Console input");
                    match serde_json::from_str::<ConsoleCommand>(&line) {
                        Ok(cmd) => {
                            // send_blocking is used since we're in a sync thread
                            if tx.send_blocking(cmd).is_err() {
                                info!("Console channel closed, exiting");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to parse console command");
                        }
                    }
                }
                Ok(_) => {} // Empty line, ignore
                Err(e) => {
                    warn!(error = %e, "Error reading stdin");
                    break;
                }
            }
        }
        info!("Console command listener exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_deserialization() {
        let cmd: ConsoleCommand = serde_json::from_str(r#"{"type": "list"}"#).unwrap();
        assert_eq!(cmd, ConsoleCommand::List { request_id: None });
    }

    #[test]
    fn test_update_shortcut_deserialization() {
        let json = r#"{"type": "updateShortcut", "session": "/s/1", "shortcutId": "q", "trigger": "<Alt>q", "requestId": "req-7"}"#;
        let cmd: ConsoleCommand = serde_json::from_str(json).unwrap();
        match &cmd {
            ConsoleCommand::UpdateShortcut {
                session,
                shortcut_id,
                trigger,
                ..
            } => {
                assert_eq!(session, "/s/1");
                assert_eq!(shortcut_id, "q");
                assert_eq!(trigger, "<Alt>q");
            }
            _ => panic!("Expected UpdateShortcut command"),
        }
        assert_eq!(cmd.request_id(), Some("req-7"));
    }

    #[test]
    fn test_close_session_deserialization() {
        let cmd: ConsoleCommand =
            serde_json::from_str(r#"{"type": "closeSession", "session": "/s/1"}"#).unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::CloseSession {
                session: "/s/1".into(),
                request_id: None
            }
        );
        assert_eq!(cmd.request_id(), None);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let json = r#"{"type": "updateShortcut", "session": "/s/1", "shortcutId": "q"}"#;
        assert!(serde_json::from_str::<ConsoleCommand>(json).is_err());
    }

    #[test]
    fn test_unknown_type_fails() {
        assert!(serde_json::from_str::<ConsoleCommand>(r#"{"type": "show"}"#).is_err());
        assert!(serde_json::from_str::<ConsoleCommand>("not json").is_err());
    }
}

//! Gatekeeper - global shortcuts portal backend
//!
//! Applications ask, over the portal D-Bus interface, for named shortcuts.
//! Each accepted shortcut is registered with the compositor as an input
//! trigger plus an action; compositor begin/end events are routed back to
//! the owning client as Activated/Deactivated.

pub mod accelerator;
pub mod batch;
pub mod broker;
pub mod compositor;
pub mod config;
pub mod dbus;
pub mod error;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod router;
pub mod service;
pub mod stdin_commands;

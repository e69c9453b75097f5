//! Default configuration values

/// Well-known name the portal frontend looks up for this backend
pub const DEFAULT_BUS_NAME: &str = "org.freedesktop.impl.portal.desktop.mir";

/// Object path the GlobalShortcuts implementation is served at
pub const DEFAULT_OBJECT_PATH: &str = "/org/freedesktop/portal/desktop";

pub const CONFIG_DIR_NAME: &str = "gatekeeper";
pub const CONFIG_FILE_NAME: &str = "config.json";

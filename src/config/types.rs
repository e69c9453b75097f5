//! Configuration type definitions

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::prompt::PromptPolicy;

/// Service configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_bus_name")]
    pub bus_name: String,
    #[serde(default = "default_object_path")]
    pub object_path: String,
    /// How BindShortcuts requests are confirmed (default: acceptPreferred)
    #[serde(default)]
    pub prompt: PromptPolicy,
    /// Accelerator used for shortcuts that arrive without a preferred trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_trigger: Option<String>,
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

fn default_bus_name() -> String {
    DEFAULT_BUS_NAME.to_string()
}

fn default_object_path() -> String {
    DEFAULT_OBJECT_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bus_name: default_bus_name(),
            object_path: default_object_path(),
            prompt: PromptPolicy::default(),
            fallback_trigger: None,
            log_filter: None,
        }
    }
}

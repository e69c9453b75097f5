//! Configuration module - service settings
//!
//! This module provides functionality for:
//! - Loading configuration from `$XDG_CONFIG_HOME/gatekeeper/config.json`
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_BUS_NAME, DEFAULT_OBJECT_PATH};
pub use loader::{default_config_path, load_config_from};
pub use types::Config;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

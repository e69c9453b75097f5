use super::*;
use crate::prompt::PromptPolicy;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.bus_name, DEFAULT_BUS_NAME);
    assert_eq!(config.object_path, DEFAULT_OBJECT_PATH);
    assert_eq!(config.prompt, PromptPolicy::AcceptPreferred);
    assert_eq!(config.fallback_trigger, None);
    assert_eq!(config.log_filter, None);
}

#[test]
fn test_empty_object_uses_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_camel_case_fields() {
    let json = r#"{
        "busName": "org.example.Portal",
        "objectPath": "/org/example/portal",
        "prompt": "decline",
        "fallbackTrigger": "<Super>F12",
        "logFilter": "debug"
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.bus_name, "org.example.Portal");
    assert_eq!(config.object_path, "/org/example/portal");
    assert_eq!(config.prompt, PromptPolicy::Decline);
    assert_eq!(config.fallback_trigger.as_deref(), Some("<Super>F12"));
    assert_eq!(config.log_filter.as_deref(), Some("debug"));
}

#[test]
fn test_serialization_skips_unset_options() {
    let json = serde_json::to_string(&Config::default()).unwrap();
    assert!(json.contains("\"busName\""));
    assert!(json.contains("\"acceptPreferred\""));
    assert!(!json.contains("fallbackTrigger"));
    assert!(!json.contains("logFilter"));
}

#[test]
fn test_load_missing_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.json"));
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_malformed_file_falls_back() {
    let file = write_config("{ \"busName\": ");
    assert_eq!(load_config_from(file.path()), Config::default());
}

#[test]
fn test_load_wrong_type_falls_back() {
    let file = write_config(r#"{"prompt": "maybe"}"#);
    assert_eq!(load_config_from(file.path()), Config::default());
}

#[test]
fn test_load_partial_file() {
    let file = write_config(r#"{"prompt": "decline"}"#);
    let config = load_config_from(file.path());
    assert_eq!(config.prompt, PromptPolicy::Decline);
    assert_eq!(config.bus_name, DEFAULT_BUS_NAME);
}

#[test]
fn test_invalid_fallback_trigger_is_dropped() {
    let file = write_config(r#"{"fallbackTrigger": "<Hyper>x"}"#);
    assert_eq!(load_config_from(file.path()).fallback_trigger, None);

    let file = write_config(r#"{"fallbackTrigger": "Ctrl+Alt+T"}"#);
    assert_eq!(
        load_config_from(file.path()).fallback_trigger.as_deref(),
        Some("Ctrl+Alt+T")
    );
}

#[test]
fn test_default_config_path_shape() {
    let path = default_config_path();
    assert!(path.ends_with("gatekeeper/config.json"));
}

//! Tests for layered configuration loading.

use super::*;
use crate::TransportMode;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only look at the given temp layout.
fn isolated_options(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = Some(root.join("missing-system.json5"));
    options.user_config_path = Some(root.join("missing-user.json5"));
    options
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = FluencyConfig::load_from_str("{}").expect("config");
    assert_eq!(config.proxy.port, 3001);
    assert_eq!(config.proxy.defaults.model, "gpt-4o-mini");
    assert_eq!(config.proxy.defaults.max_tokens, 1000);
    assert_eq!(config.generation.transport, TransportMode::Proxy);
    assert_eq!(config.generation.test_max_tokens, 2000);
    assert_eq!(config.quota.max_requests, 50);
    assert_eq!(config.quota.window_hours, 24);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = FluencyConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

/// Reject invalid transport names.
#[test]
fn rejects_invalid_transport() {
    let err =
        FluencyConfig::load_from_str(r#"{ generation: { transport: "carrier-pigeon" } }"#)
            .unwrap_err();
    assert!(format!("{err}").contains("generation.transport"));
}

/// Reject ports that do not fit in u16.
#[test]
fn rejects_out_of_range_port() {
    let err = FluencyConfig::load_from_str(r#"{ proxy: { port: 70000 } }"#).unwrap_err();
    assert!(format!("{err}").contains("proxy.port"));
}

/// A zero quota ceiling would refuse every request.
#[test]
fn rejects_zero_quota() {
    let err = FluencyConfig::load_from_str(r#"{ quota: { max_requests: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("quota.max_requests"));
}

/// JSON5 comments and trailing commas are accepted.
#[test]
fn accepts_json5_syntax() {
    let json5 = r#"{
        // local development
        generation: { transport: "direct", api_key: "sk-test", },
    }"#;
    let config = FluencyConfig::load_from_str(json5).expect("config");
    assert_eq!(config.generation.transport, TransportMode::Direct);
    assert_eq!(config.generation.api_key.as_deref(), Some("sk-test"));
}

/// Ensure cwd config overrides user config and runtime overrides both.
#[test]
fn layered_config_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(&user_config, "{ proxy: { port: 4000, host: \"127.0.0.1\" } }");
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ proxy: { port: 5000 }, quota: { max_requests: 10 } }",
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, "{ quota: { max_requests: 3 } }");

    let mut options = isolated_options(root, &cwd).with_runtime_path(&runtime);
    options.user_config_path = Some(user_config);

    let layered = FluencyConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 3);
    assert_eq!(layered.config.proxy.port, 5000);
    assert_eq!(layered.config.proxy.host, "127.0.0.1");
    assert_eq!(layered.config.quota.max_requests, 3);
    assert_eq!(layered.layers[2].source, ConfigLayerSource::Runtime);
}

/// Missing optional layers are skipped; a missing runtime layer is an error.
#[test]
fn missing_runtime_layer_fails() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path(), temp.path())
        .with_runtime_path(temp.path().join("nope.json5"));
    let err = FluencyConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

/// Schema errors name the offending layer.
#[test]
fn layer_errors_include_label() {
    let temp = TempDir::new().expect("tmp");
    write_json5(
        &temp.path().join(DEFAULT_CONFIG_FILE),
        "{ store: { provider: \"postgres\" } }",
    );
    let err = FluencyConfig::load_layered_with_options(isolated_options(temp.path(), temp.path()))
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("store.provider"));
}

/// Environment overrides fill ports, origins, and empty key slots.
#[test]
fn env_overrides_apply() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PORT", "8081"),
        ("CLIENT_URL", "https://app.example"),
        ("OPENAI_API_KEY", "sk-env"),
        ("FLUENCY_PROXY_URL", "http://proxy.internal"),
    ]);
    let mut config = FluencyConfig::load_from_str(r#"{ generation: { api_key: "sk-file" } }"#)
        .expect("config");
    config
        .apply_env_overrides_with(|name| vars.get(name).map(|value| value.to_string()))
        .expect("overrides");
    assert_eq!(config.proxy.port, 8081);
    assert_eq!(
        config.proxy.allowed_origin.as_deref(),
        Some("https://app.example")
    );
    assert_eq!(config.proxy.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.generation.api_key.as_deref(), Some("sk-file"));
    assert_eq!(config.generation.proxy_url, "http://proxy.internal");
}

/// A malformed PORT is reported rather than ignored.
#[test]
fn env_override_rejects_bad_port() {
    let mut config = FluencyConfig::default();
    let err = config
        .apply_env_overrides_with(|name| (name == "PORT").then(|| "eighty".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::EnvVar { name: "PORT", ref value } if value == "eighty"
    ));
}

/// Zero ceilings and unknown store providers are rejected with the offending key.
#[test]
fn validate_names_the_rejected_key() {
    let mut config = FluencyConfig::default();
    config.validate().expect("defaults are valid");

    config.quota.max_requests = 0;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidField { ref path, .. } if path == "quota.max_requests"
    ));

    let mut config = FluencyConfig::default();
    config.store.provider = "postgres".to_string();
    let err = config.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "config key store.provider rejected: unsupported provider postgres"
    );
}

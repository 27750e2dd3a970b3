//! Configuration schema for Fluency.

use crate::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Environment variable holding the provider API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the proxy listening port.
pub const ENV_PORT: &str = "PORT";
/// Environment variable holding the allowed CORS origin.
pub const ENV_CLIENT_URL: &str = "CLIENT_URL";
/// Environment variable holding the proxy base URL used by clients.
pub const ENV_PROXY_URL: &str = "FLUENCY_PROXY_URL";

/// Root config for Fluency.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FluencyConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl FluencyConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> FluencyConfigBuilder {
        FluencyConfigBuilder::new()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// The provider key only fills slots that the config files left empty.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.proxy.port = port.trim().parse().map_err(|_| ConfigError::EnvVar {
                name: ENV_PORT,
                value: port.clone(),
            })?;
            debug!("port overridden from env (port={})", self.proxy.port);
        }
        if let Some(origin) = lookup(ENV_CLIENT_URL).filter(|value| !value.trim().is_empty()) {
            debug!("allowed origin overridden from env");
            self.proxy.allowed_origin = Some(origin);
        }
        if let Some(url) = lookup(ENV_PROXY_URL).filter(|value| !value.trim().is_empty()) {
            debug!("proxy url overridden from env");
            self.generation.proxy_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|value| !value.trim().is_empty()) {
            if self.proxy.api_key.is_none() {
                self.proxy.api_key = Some(key.clone());
            }
            if self.generation.api_key.is_none() {
                self.generation.api_key = Some(key);
            }
        }
        Ok(())
    }
}

/// Builder for assembling a `FluencyConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct FluencyConfigBuilder {
    config: FluencyConfig,
}

impl FluencyConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: FluencyConfig::default(),
        }
    }

    /// Replace the proxy server configuration.
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = proxy;
        self
    }

    /// Replace the generation client configuration.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Replace the request quota configuration.
    pub fn quota(mut self, quota: QuotaConfig) -> Self {
        self.config.quota = quota;
        self
    }

    /// Replace the store configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Finalize and return the built `FluencyConfig`.
    pub fn build(self) -> FluencyConfig {
        self.config
    }
}

/// Completion proxy server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin; any origin when unset.
    #[serde(default)]
    pub allowed_origin: Option<String>,
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub defaults: CompletionDefaults,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: None,
            upstream_base_url: default_upstream_base_url(),
            api_key: None,
            defaults: CompletionDefaults::default(),
        }
    }
}

/// Parameters applied when a completion request omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for CompletionDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// How the generation client reaches the language model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Through the completion proxy.
    #[default]
    Proxy,
    /// Straight to the provider with a client-held key.
    Direct,
}

/// Generation client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub transport: TransportMode,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    /// Client-held provider key, required for the direct transport.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_test_max_tokens")]
    pub test_max_tokens: u32,
    #[serde(default = "default_max_tokens")]
    pub feedback_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::default(),
            proxy_url: default_proxy_url(),
            upstream_base_url: default_upstream_base_url(),
            api_key: None,
            model: default_model(),
            test_max_tokens: default_test_max_tokens(),
            feedback_max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            question_count: default_question_count(),
        }
    }
}

/// Client-side request quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_hours: default_window_hours(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_provider")]
    pub provider: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_store_provider(),
            path: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_upstream_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_proxy_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_test_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_question_count() -> usize {
    5
}

fn default_max_requests() -> u32 {
    50
}

fn default_window_hours() -> u32 {
    24
}

/// Default storage provider name.
fn default_store_provider() -> String {
    "file".to_string()
}

//! Relay configuration
//!
//! Everything is read from the environment once at startup. Lookups go
//! through a closure so tests never have to mutate the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `CHAT_RELAY_ADDR` | `127.0.0.1:3000` |
//! | `CHAT_RELAY_SYSTEM_PROMPT` | `You are a helpful AI assistant.` |
//! | `CHAT_RELAY_TIMEOUT_SECS` | `120` |
//! | `<PROVIDER>_API_KEY` | unset (server-side default key per provider) |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::client::HttpConfig;
use crate::registry::ProviderRegistry;
use crate::types::redact_key;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub const ENV_ADDR: &str = "CHAT_RELAY_ADDR";
pub const ENV_SYSTEM_PROMPT: &str = "CHAT_RELAY_SYSTEM_PROMPT";
pub const ENV_TIMEOUT_SECS: &str = "CHAT_RELAY_TIMEOUT_SECS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the relay binary and router.
#[derive(Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Prepended to conversations that do not start with a system message.
    /// Empty disables the prompt.
    pub system_prompt: String,
    pub http: HttpConfig,
    provider_keys: HashMap<String, SecretString>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            http: HttpConfig::default(),
            provider_keys: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keyed: Vec<&str> = self.provider_keys.keys().map(String::as_str).collect();
        keyed.sort_unstable();
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("system_prompt", &self.system_prompt)
            .field("http", &self.http)
            .field("provider_keys", &keyed)
            .finish()
    }
}

/// `openrouter` -> `OPENROUTER_API_KEY`.
pub fn api_key_var(provider_id: &str) -> String {
    let id: String = provider_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{id}_API_KEY")
}

impl RelayConfig {
    /// Read from the process environment.
    pub fn from_env(registry: &ProviderRegistry) -> Result<Self, ConfigError> {
        Self::from_lookup(registry, |var| std::env::var(var).ok())
    }

    /// Read through an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup<F>(registry: &ProviderRegistry, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get(ENV_ADDR) {
            config.bind_addr = addr.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: ENV_ADDR,
                    value: addr.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(prompt) = lookup(ENV_SYSTEM_PROMPT) {
            config.system_prompt = prompt;
        }

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.http.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        for descriptor in registry.list() {
            if let Some(key) = get(&api_key_var(&descriptor.id)) {
                tracing::info!(
                    target: "chat_relay::http",
                    provider = %descriptor.id,
                    key = %redact_key(&key),
                    "server-side API key configured"
                );
                config
                    .provider_keys
                    .insert(descriptor.id.clone(), SecretString::from(key));
            }
        }

        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_provider_key(
        mut self,
        provider_id: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.provider_keys
            .insert(provider_id.into(), SecretString::from(key.into()));
        self
    }

    /// Server-side key used when a request brings none.
    pub fn default_key(&self, provider_id: &str) -> Option<&str> {
        self.provider_keys
            .get(provider_id)
            .map(|k| k.expose_secret())
    }
}

//! Configuration management

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Voice-call provider (ElevenLabs Conversational AI) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub agent_id: String,
    pub agent_phone_number_id: String,
    pub from_number: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// The trigger endpoint refuses to place calls until both are set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.agent_id.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for HMAC-SHA256 signature checks; empty disables verification.
    pub secret: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            provider: ProviderConfig {
                api_key: env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
                agent_id: env::var("ELEVENLABS_AGENT_ID").unwrap_or_default(),
                agent_phone_number_id: env::var("ELEVENLABS_AGENT_PHONE_NUMBER_ID")
                    .unwrap_or_default(),
                from_number: env::var("ELEVENLABS_FROM_NUMBER").unwrap_or_default(),
                base_url: env::var("ELEVENLABS_BASE_URL").unwrap_or(defaults.provider.base_url),
                timeout_secs: defaults.provider.timeout_secs,
            },
            webhook: WebhookConfig {
                secret: env::var("ELEVENLABS_WEBHOOK_SECRET").unwrap_or_default(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            provider: ProviderConfig {
                api_key: String::new(),
                agent_id: String::new(),
                agent_phone_number_id: String::new(),
                from_number: String::new(),
                base_url: "https://api.elevenlabs.io".to_string(),
                timeout_secs: 30,
            },
            webhook: WebhookConfig {
                secret: String::new(),
            },
        }
    }
}

//! Configuration management

use crate::domain::dialog::BusinessContext;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub bridge: BridgeConfig,
    pub api: ApiConfig,
    pub telephony: TelephonyConfig,
    pub session: SessionConfig,
    pub business: BusinessContext,
}

/// Webhook server bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Control-channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub websocket_url: String,
    pub account_sid: String,
    /// Synthetic voice identifier attached to every speak command
    pub voice: String,
    pub reconnect_delay_secs: u64,
}

/// REST collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Bound on the external text-generation call
    pub generation_timeout_secs: u64,
}

/// Numbers used for outbound actions and webhook fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub outbound_number: String,
    pub forward_number: String,
}

/// Session lifecycle timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long an ended session stays readable before eviction
    pub retention_secs: u64,
    /// Pause between a transfer acknowledgment and the transfer
    pub transfer_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            websocket_url: "ws://localhost:8081/voice/ws".to_string(),
            account_sid: String::new(),
            voice: "Polly.Joanna".to_string(),
            reconnect_delay_secs: 5,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            request_timeout_secs: 10,
            generation_timeout_secs: 8,
        }
    }
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            outbound_number: String::new(),
            forward_number: String::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retention_secs: 30,
            transfer_delay_ms: 1000,
        }
    }
}

impl Config {
    /// Load from `voicebridge.toml` (if present) with `VOICEBRIDGE_*`
    /// environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("voicebridge").required(false))
            .add_source(config::Environment::with_prefix("VOICEBRIDGE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.bridge.reconnect_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.api.generation_timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.session.retention_secs)
    }

    pub fn transfer_delay(&self) -> Duration {
        Duration::from_millis(self.session.transfer_delay_ms)
    }
}

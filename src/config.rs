use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base configuration used by the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    /// Port of the health server, bound on all interfaces.
    pub port: u16,
    /// Path of the persisted session artifact.
    pub session_path: String,
    /// Device name shown in the phone's linked devices list.
    pub device_name: String,
    /// Pause before and after the typing indicator, in milliseconds.
    pub typing_delay_ms: u64,
    /// Wait before restarting the client after a disconnect, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Wait before retrying a failed client start, in milliseconds.
    pub init_retry_delay_ms: u64,
    /// Maximum number of client restarts; `None` retries forever.
    pub max_restarts: Option<u32>,
    /// URL pinged periodically to keep the hosting platform awake.
    pub keepalive_url: Option<String>,
    /// Interval between keep-alive pings, in seconds.
    pub keepalive_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            session_path: "./session.json".into(),
            device_name: "aetronics-bot".into(),
            typing_delay_ms: 1000,
            reconnect_delay_ms: 5000,
            init_retry_delay_ms: 10_000,
            max_restarts: None,
            keepalive_url: None,
            keepalive_interval_secs: 300,
        }
    }
}

impl BotConfig {
    /// Override the health server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the session artifact path.
    pub fn with_session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Override the linked device name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Override the simulated typing delay.
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay_ms = millis(delay);
        self
    }

    /// Override the wait before reconnecting after a disconnect.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_ms = millis(delay);
        self
    }

    /// Override the wait before retrying a failed start.
    pub fn with_init_retry_delay(mut self, delay: Duration) -> Self {
        self.init_retry_delay_ms = millis(delay);
        self
    }

    /// Cap the number of client restarts.
    pub fn with_max_restarts(mut self, max: Option<u32>) -> Self {
        self.max_restarts = max;
        self
    }

    /// Enable the keep-alive ping against a URL.
    pub fn with_keepalive(mut self, url: impl Into<String>, interval: Duration) -> Self {
        self.keepalive_url = Some(url.into());
        self.keepalive_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use debate_presenter::{PresenterConfig, DEFAULT_MAX_ITEM_DELAY};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Error loading client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level client configuration.
///
/// Layered as: defaults, then an optional TOML file, then environment
/// variables, then command-line flags (applied by the binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the debate backend.
    pub api_base: String,
    /// Requested "thinking" delay per message.
    pub per_message_delay_ms: u64,
    /// Upper bound applied to the per-message delay. Only lowers the
    /// built-in 1200 ms cap.
    pub max_message_delay_ms: u64,
    /// Pause between one message resolving and the next appearing.
    pub inter_message_gap_ms: u64,
    /// HTTP timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Colored terminal output.
    pub color: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".into(),
            per_message_delay_ms: 900,
            max_message_delay_ms: 1200,
            inter_message_gap_ms: 200,
            request_timeout_secs: None,
            color: true,
        }
    }
}

impl ClientConfig {
    /// Defaults, overlaid with `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// Load from a TOML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DEBATE_API_BASE").filter(|v| !v.trim().is_empty()) {
            self.api_base = url.trim().to_string();
        }
        if let Some(ms) = u64_from(&lookup, "DEBATE_MESSAGE_DELAY_MS") {
            self.per_message_delay_ms = ms;
        }
        if let Some(secs) = u64_from(&lookup, "DEBATE_REQUEST_TIMEOUT_SECS").filter(|v| *v > 0) {
            self.request_timeout_secs = Some(secs);
        }
        // https://no-color.org: any non-empty value disables color.
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
    }

    pub fn per_message_delay(&self) -> Duration {
        Duration::from_millis(self.per_message_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn presenter_config(&self) -> PresenterConfig {
        let mut max_item_delay = Duration::from_millis(self.max_message_delay_ms);
        if max_item_delay > DEFAULT_MAX_ITEM_DELAY {
            warn!(
                requested_ms = self.max_message_delay_ms,
                cap_ms = DEFAULT_MAX_ITEM_DELAY.as_millis() as u64,
                "max_message_delay_ms above the cap, clamping"
            );
            max_item_delay = DEFAULT_MAX_ITEM_DELAY;
        }
        PresenterConfig {
            max_item_delay,
            inter_message_gap: Duration::from_millis(self.inter_message_gap_ms),
        }
    }
}

fn u64_from(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<u64> {
    let raw = lookup(var)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(var, value = %raw, error = %e, "ignoring invalid environment value");
            None
        }
    }
}

//! User configuration loaded from TOML

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use etrace_capture::BridgeConfig;
use etrace_view::DEFAULT_FADE_LEVEL;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Foreground weight for rows failing a filter in fade mode
    pub fade_level: f32,

    /// Redraw and new-row pickup interval
    pub tick_rate_ms: u64,

    /// Where exports are written
    pub export_dir: PathBuf,

    pub serial: SerialConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub reconnect_backoff_ms: u64,
    pub read_timeout_ms: u64,
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fade_level: DEFAULT_FADE_LEVEL,
            tick_rate_ms: 100,
            export_dir: PathBuf::from("."),
            serial: SerialConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            reconnect_backoff_ms: 500,
            read_timeout_ms: 500,
            read_buffer_size: 4096,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if present.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.fade_level = config.fade_level.clamp(0.0, 1.0);
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/etrace/config.toml`, else the platform config dir
    pub fn default_path() -> Option<PathBuf> {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("etrace").join("config.toml"));
        }
        dirs::config_dir().map(|dir| dir.join("etrace").join("config.toml"))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }

    pub fn bridge_config(&self, device: &str) -> BridgeConfig {
        BridgeConfig {
            baud_rate: self.serial.baud_rate,
            reconnect_backoff: Duration::from_millis(self.serial.reconnect_backoff_ms),
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms.max(1)),
            read_buffer_size: self.serial.read_buffer_size.max(1),
            ..BridgeConfig::new(device)
        }
    }
}

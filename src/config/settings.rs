//! Scan settings and paths.
//!
//! Settings can come from a JSON file given explicitly or from the
//! XDG-compliant config directory, and fall back to built-in defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::CancelPolicy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Port probed when none is configured (the ROS master XML-RPC port).
pub const DEFAULT_PORTS: [u16; 1] = [11311];

/// Default concurrency ceiling.
pub const DEFAULT_RATE: usize = 1000;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/aztarna)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn discover() -> Option<Self> {
        let project = ProjectDirs::from("org", "aztarna", "aztarna")?;
        Some(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Caller-facing scan configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Ports probed on every target, in order.
    pub ports: Vec<u16>,
    /// Enable deeper, slower probing.
    pub extended: bool,
    /// Concurrency ceiling.
    pub rate: usize,
    /// Deadline for a single probe in milliseconds.
    pub probe_timeout_ms: Option<u64>,
    /// Maximum probe launches per second.
    pub probes_per_second: Option<u32>,
    /// Fate of in-flight probes on cancellation.
    pub cancel_policy: CancelPolicy,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            extended: false,
            rate: DEFAULT_RATE,
            probe_timeout_ms: None,
            probes_per_second: None,
            cancel_policy: CancelPolicy::Drain,
        }
    }
}

impl ScanSettings {
    /// Set the ports.
    pub fn with_ports(mut self, ports: impl Into<Vec<u16>>) -> Self {
        self.ports = ports.into();
        self
    }

    /// Enable or disable extended probing.
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Set the concurrency ceiling.
    pub fn with_rate(mut self, rate: usize) -> Self {
        self.rate = rate;
        self
    }

    /// Set the per-probe deadline.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Limit probe launches per second.
    pub fn with_probes_per_second(mut self, per_second: u32) -> Self {
        self.probes_per_second = Some(per_second);
        self
    }

    /// Set the cancellation policy.
    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }

    /// Check the settings before any probing starts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rate == 0 || self.rate > Semaphore::MAX_PERMITS {
            return Err(ConfigError::InvalidRate(self.rate));
        }
        if self.ports.is_empty() {
            return Err(ConfigError::NoPorts);
        }
        if self.probes_per_second == Some(0) {
            return Err(ConfigError::InvalidPacing);
        }
        Ok(())
    }

    /// Load settings from the default location, or defaults if absent.
    pub fn load() -> ConfigResult<Self> {
        match Paths::discover().map(|p| p.settings_file()) {
            Some(file) if file.exists() => Self::load_from(&file),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

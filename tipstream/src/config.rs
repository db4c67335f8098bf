use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tsp_payout::{AnomalyThresholds, PayoutRates};

/// Main configuration for Tipstream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub data: DataConfig,

    /// Collaborator services (fraud screening, notifications). All optional;
    /// an unset fraud URL means tips are allowed without screening.
    #[serde(default)]
    pub peers: PeerConfig,

    #[serde(default)]
    pub payout: PayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the HTTP API
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the ledger snapshot and the payout chain
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join("ledger_snapshot.json")
    }

    pub fn chain_path(&self) -> PathBuf {
        self.dir.join("payout_chain.json")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Base URL of the fraud screening service (e.g. `http://127.0.0.1:8082`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_url: Option<String>,

    /// Base URL of the notification service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_url: Option<String>,

    /// Shared secret for signing internal requests (HMAC-SHA256)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// USD per 1,000,000 qualified short-form views
    #[serde(default = "default_per_million_short")]
    pub per_million_short_usd: f64,

    /// USD per 1,000,000 qualified long-form views
    #[serde(default = "default_per_million_long")]
    pub per_million_long_usd: f64,

    /// Anomaly score at which a payout is flagged for review
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,

    /// Anomaly score at which a payout is held
    #[serde(default = "default_hold_threshold")]
    pub hold_threshold: f64,
}

fn default_per_million_short() -> f64 {
    500.0
}

fn default_per_million_long() -> f64 {
    1000.0
}

fn default_review_threshold() -> f64 {
    0.3
}

fn default_hold_threshold() -> f64 {
    0.6
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            per_million_short_usd: default_per_million_short(),
            per_million_long_usd: default_per_million_long(),
            review_threshold: default_review_threshold(),
            hold_threshold: default_hold_threshold(),
        }
    }
}

impl PayoutConfig {
    pub fn rates(&self) -> PayoutRates {
        PayoutRates {
            per_million_short_usd: self.per_million_short_usd,
            per_million_long_usd: self.per_million_long_usd,
        }
    }

    pub fn thresholds(&self) -> AnomalyThresholds {
        AnomalyThresholds {
            review: self.review_threshold,
            hold: self.hold_threshold,
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        // Restrictive permissions; the file may hold a shared secret
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}

/// Get the default data directory path
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tipstream"))
        .unwrap_or_else(|| PathBuf::from(".tipstream"))
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 9000;
        config.peers.fraud_url = Some("http://127.0.0.1:8082".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
        assert_eq!(
            loaded.peers.fraud_url.as_deref(),
            Some("http://127.0.0.1:8082")
        );
        assert!(loaded.peers.shared_secret.is_none());
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.payout.per_million_short_usd, 500.0);
        assert_eq!(config.payout.per_million_long_usd, 1000.0);
        assert_eq!(config.payout.review_threshold, 0.3);
        assert_eq!(config.payout.hold_threshold, 0.6);
        assert!(config.peers.fraud_url.is_none());
    }

    #[test]
    fn test_data_paths() {
        let data = DataConfig {
            dir: PathBuf::from("/tmp/ts"),
        };
        assert_eq!(
            data.snapshot_path(),
            PathBuf::from("/tmp/ts/ledger_snapshot.json")
        );
        assert_eq!(data.chain_path(), PathBuf::from("/tmp/ts/payout_chain.json"));
    }
}

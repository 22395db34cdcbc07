//! # Configuration Management Module
//!
//! Centralized, TOML-backed configuration for the APRS BBS with defaults and
//! validation.
//!
//! ## Configuration Structure
//!
//! - [`BbsConfig`] - station identity and login software string
//! - [`AprsIsConfig`] - relay address, passcode and connection timeouts
//! - [`AckConfig`] - limits on the pending-acknowledgment table
//! - [`BeaconConfig`] - optional periodic object beacon
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aprsbbs::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Station: {}", config.bbs.callsign);
//!     println!("Relay: {}:{}", config.aprs_is.server, config.aprs_is.port);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bbs]
//! callsign = "N0CALL-10"
//!
//! [aprs_is]
//! server = "rotate.aprs2.net"
//! port = 14580
//! # passcode = 12345   # derived from the callsign when omitted
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Precedence: CLI args > environment (`APRS_PASSCODE`) > config file > defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::aprs::passcode;
use crate::validation::validate_callsign;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BbsConfig {
    /// Station identity the BBS logs in as and answers to.
    pub callsign: String,
    #[serde(default = "default_software_name")]
    pub software_name: String,
    #[serde(default = "default_software_version")]
    pub software_version: String,
    /// Server-side filter sent with the login line. Defaults to messages for our callsign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn default_software_name() -> String {
    "APRSBBS".to_string()
}

fn default_software_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprsIsConfig {
    pub server: String,
    pub port: u16,
    /// Login passcode. Derived from the base callsign when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<u32>,
    /// Only try IPv4 addresses when resolving the server.
    #[serde(default)]
    pub ipv4_only: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How long to wait for the server banner after sending login.
    #[serde(default = "default_banner_timeout_secs")]
    pub banner_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_banner_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckConfig {
    /// Pending acknowledgments older than this are dropped (seconds).
    pub pending_ttl_secs: u64,
    /// Upper bound on the pending table; the oldest entry is evicted beyond it.
    pub max_pending: usize,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: 30 * 60,
            max_pending: 1024,
        }
    }
}

/// Configuration for the periodic object beacon.
///
/// When enabled, the BBS announces itself as an APRS object at a fixed
/// position every `interval_minutes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub enabled: bool,
    pub name: String,
    /// Decimal degrees, north positive.
    pub latitude: f64,
    /// Decimal degrees, east positive.
    pub longitude: f64,
    pub symbol_table: String,
    pub symbol_code: String,
    pub comment: String,
    pub interval_minutes: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: "BBS".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            symbol_table: "/".to_string(),
            symbol_code: "B".to_string(),
            comment: "APRS BBS - send 'help'".to_string(),
            interval_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bbs: BbsConfig,
    pub aprs_is: AprsIsConfig,
    #[serde(default)]
    pub acks: AckConfig,
    #[serde(default)]
    pub beacon: BeaconConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Check values that would otherwise fail at runtime. Normalizes the callsign.
    pub fn validate(&mut self) -> Result<()> {
        self.bbs.callsign = validate_callsign(&self.bbs.callsign)
            .map_err(|e| anyhow!("Invalid bbs.callsign '{}': {}", self.bbs.callsign, e))?;
        if self.aprs_is.server.trim().is_empty() {
            return Err(anyhow!("aprs_is.server must not be empty"));
        }
        if self.aprs_is.port == 0 {
            return Err(anyhow!("aprs_is.port must be non-zero"));
        }
        if self.acks.max_pending == 0 {
            return Err(anyhow!("acks.max_pending must be at least 1"));
        }
        if self.beacon.enabled {
            if self.beacon.symbol_table.chars().count() != 1
                || self.beacon.symbol_code.chars().count() != 1
            {
                return Err(anyhow!(
                    "beacon.symbol_table and beacon.symbol_code must be single characters"
                ));
            }
            if self.beacon.interval_minutes == 0 {
                return Err(anyhow!("beacon.interval_minutes must be at least 1"));
            }
            if !(-90.0..=90.0).contains(&self.beacon.latitude)
                || !(-180.0..=180.0).contains(&self.beacon.longitude)
            {
                return Err(anyhow!("beacon position out of range"));
            }
        }
        Ok(())
    }

    /// Configured passcode, or the one derived from the callsign.
    pub fn effective_passcode(&self) -> u32 {
        self.aprs_is
            .passcode
            .unwrap_or_else(|| passcode::generate(&self.bbs.callsign))
    }

    /// Configured login filter, or `filter m/CALL`.
    pub fn effective_filter(&self) -> String {
        match &self.bbs.filter {
            Some(f) if !f.trim().is_empty() => f.clone(),
            _ => format!("filter m/{}", self.bbs.callsign.to_ascii_uppercase()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bbs: BbsConfig {
                callsign: "N0CALL".to_string(),
                software_name: default_software_name(),
                software_version: default_software_version(),
                filter: None,
            },
            aprs_is: AprsIsConfig {
                server: "rotate.aprs2.net".to_string(),
                port: 14580,
                passcode: None,
                ipv4_only: false,
                connect_timeout_secs: default_connect_timeout_secs(),
                banner_timeout_secs: default_banner_timeout_secs(),
            },
            acks: AckConfig::default(),
            beacon: BeaconConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml(&serialized).unwrap();
        assert_eq!(parsed.bbs.callsign, "N0CALL");
        assert_eq!(parsed.aprs_is.port, 14580);
        assert!(!parsed.beacon.enabled);
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
            [bbs]
            callsign = "w1aw-5"

            [aprs_is]
            server = "noam.aprs2.net"
            port = 14580
            "#,
        )
        .unwrap();
        assert_eq!(cfg.acks.max_pending, 1024);
        assert_eq!(cfg.aprs_is.connect_timeout_secs, 10);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.bbs.software_name, "APRSBBS");
    }

    #[test]
    fn validate_normalizes_callsign_and_derives_defaults() {
        let mut cfg = Config::default();
        cfg.bbs.callsign = "n0call-10".to_string();
        cfg.validate().unwrap();
        assert_eq!(cfg.bbs.callsign, "N0CALL-10");
        assert_eq!(cfg.effective_filter(), "filter m/N0CALL-10");
        assert_eq!(cfg.effective_passcode(), passcode::generate("N0CALL"));
        cfg.aprs_is.passcode = Some(42);
        assert_eq!(cfg.effective_passcode(), 42);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.bbs.callsign = "bad call".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.beacon.enabled = true;
        cfg.beacon.symbol_code = "BB".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.aprs_is.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn beacon_config_serde() {
        let beacon = BeaconConfig {
            enabled: true,
            interval_minutes: 15,
            ..BeaconConfig::default()
        };
        let serialized = serde_json::to_string(&beacon).unwrap();
        assert!(serialized.contains("\"enabled\":true"));
        let back: BeaconConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back.interval_minutes, 15);
        assert_eq!(back.symbol_code, "B");
    }
}

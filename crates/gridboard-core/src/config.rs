//! Board configuration.
//!
//! [`BoardConfig`] collects every tunable of the control loop. All fields
//! have defaults (see [`constants`](crate::constants)), so a configuration
//! file only needs to list what it overrides:
//!
//! ```
//! use gridboard_core::{BoardConfig, DeviceKind};
//!
//! let config = BoardConfig::from_toml_str(r#"
//!     grace_period_ms = 750
//!
//!     [[channels]]
//!     kind = "coal"
//!     analog_input = 1
//! "#).unwrap();
//!
//! assert_eq!(config.grace_period_ms, 750);
//! assert_eq!(config.driver_interval_ms, 200);
//! assert_eq!(config.channels[0].kind, DeviceKind::Coal);
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{DeviceKind, Error, Result};

/// A locally controlled device kind and the analog input that drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Device kind the channel controls.
    pub kind: DeviceKind,

    /// Analog input (knob) index read for the live percentage.
    ///
    /// Ignored for unregulated kinds.
    #[serde(default)]
    pub analog_input: u8,
}

/// Tunables for the framing, inventory, driver and heartbeat layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Largest payload the local decoder accepts and the encoder emits.
    pub max_payload: usize,

    /// Grace period before an inventory decrease is committed.
    pub grace_period_ms: u64,

    /// Minimum spacing between attraction driver runs.
    pub driver_interval_ms: u64,

    /// Spacing between status requests.
    pub status_request_interval_ms: u64,

    /// Silence after which the relay is considered disconnected.
    pub status_timeout_ms: u64,

    /// Coefficient above which wind turbines spin.
    pub wind_threshold: f32,

    /// Coefficient above which hydro runs.
    pub hydro_threshold: f32,

    /// Coefficient above which photovoltaic shows its active light.
    pub solar_threshold: f32,

    /// Blink period of the aggregate displays while disconnected.
    pub blink_interval_ms: u64,

    /// Locally controlled kinds.
    pub channels: Vec<ChannelConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            max_payload: MAX_PAYLOAD_MASTER,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            driver_interval_ms: DEFAULT_DRIVER_INTERVAL_MS,
            status_request_interval_ms: DEFAULT_STATUS_REQUEST_INTERVAL_MS,
            status_timeout_ms: DEFAULT_STATUS_TIMEOUT_MS,
            wind_threshold: DEFAULT_COEFFICIENT_THRESHOLD,
            hydro_threshold: DEFAULT_COEFFICIENT_THRESHOLD,
            solar_threshold: DEFAULT_COEFFICIENT_THRESHOLD,
            blink_interval_ms: DEFAULT_BLINK_INTERVAL_MS,
            channels: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Toml` for syntax or type errors and `Error::Config`
    /// if validation fails.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: BoardConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`BoardConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Profile used by the relay side of the link (smaller payload cap).
    #[must_use]
    pub fn relay_profile() -> Self {
        Self {
            max_payload: MAX_PAYLOAD_RELAY,
            ..Self::default()
        }
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload < COMMAND_PAYLOAD_LEN || self.max_payload > u8::MAX as usize {
            return Err(Error::Config(format!(
                "max_payload must be {COMMAND_PAYLOAD_LEN}..=255, got {}",
                self.max_payload
            )));
        }
        if self.driver_interval_ms == 0 || self.status_request_interval_ms == 0 {
            return Err(Error::Config("intervals must be non-zero".to_string()));
        }
        if self.status_timeout_ms <= self.status_request_interval_ms {
            return Err(Error::Config(format!(
                "status_timeout_ms ({}) must exceed status_request_interval_ms ({})",
                self.status_timeout_ms, self.status_request_interval_ms
            )));
        }
        for (name, value) in [
            ("wind_threshold", self.wind_threshold),
            ("hydro_threshold", self.hydro_threshold),
            ("solar_threshold", self.solar_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within 0..=1, got {value}")));
            }
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.kind) {
                return Err(Error::Config(format!(
                    "duplicate channel for {}",
                    channel.kind
                )));
            }
        }
        Ok(())
    }

    /// Coefficient threshold for a coefficient-gated kind.
    #[must_use]
    pub fn coefficient_threshold(&self, kind: DeviceKind) -> f32 {
        match kind {
            DeviceKind::Wind => self.wind_threshold,
            DeviceKind::Hydro => self.hydro_threshold,
            DeviceKind::Photovoltaic => self.solar_threshold,
            _ => DEFAULT_COEFFICIENT_THRESHOLD,
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn driver_interval(&self) -> Duration {
        Duration::from_millis(self.driver_interval_ms)
    }

    pub fn status_request_interval(&self) -> Duration {
        Duration::from_millis(self.status_request_interval_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = BoardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_payload, 250);
        assert_eq!(config.grace_period(), Duration::from_millis(500));
    }

    #[test]
    fn test_relay_profile_caps_payload() {
        let config = BoardConfig::relay_profile();
        assert_eq!(config.max_payload, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BoardConfig::from_toml_str("").unwrap();
        assert_eq!(config, BoardConfig::default());
    }

    #[test]
    fn test_timeout_must_exceed_request_interval() {
        let err = BoardConfig::from_toml_str(
            "status_request_interval_ms = 3000\nstatus_timeout_ms = 3000\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let err = BoardConfig::from_toml_str("wind_threshold = 1.5").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let doc = r#"
            [[channels]]
            kind = "gas"
            analog_input = 1

            [[channels]]
            kind = "gas"
            analog_input = 2
        "#;
        let err = BoardConfig::from_toml_str(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate channel for Gas"));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let doc = "[[channels]]\nkind = \"fusion\"\n";
        assert!(matches!(
            BoardConfig::from_toml_str(doc).unwrap_err(),
            Error::Toml(_)
        ));
    }

    #[test]
    fn test_zero_max_payload_rejected() {
        assert!(BoardConfig::from_toml_str("max_payload = 0").is_err());
    }

    #[rstest]
    #[case(1, false)]
    #[case(2, true)]
    #[case(255, true)]
    #[case(256, false)]
    fn test_max_payload_must_fit_a_command(#[case] max_payload: usize, #[case] valid: bool) {
        let config = BoardConfig {
            max_payload,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn test_coefficient_threshold_per_kind() {
        let config = BoardConfig {
            wind_threshold: 0.3,
            hydro_threshold: 0.7,
            ..BoardConfig::default()
        };
        assert_eq!(config.coefficient_threshold(DeviceKind::Wind), 0.3);
        assert_eq!(config.coefficient_threshold(DeviceKind::Hydro), 0.7);
        assert_eq!(config.coefficient_threshold(DeviceKind::Photovoltaic), 0.5);
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "driver_interval_ms = 100").unwrap();
        let config = BoardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.driver_interval_ms, 100);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = BoardConfig::from_path("/nonexistent/gridboard.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

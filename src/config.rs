// Timeouts, topics, drive geometry
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_BASE: &str = "mecanum/cmd/base"; // commands
pub const TOPIC_RT_WHEELS: &str = "mecanum/rt/wheels"; // wheel targets
pub const TOPIC_DRIVE_STATE: &str = "mecanum/state/drive"; // telemetry
pub const TOPIC_HEALTH: &str = "mecanum/state/health"; // health status

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid drive config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Geometry and limits of the four-wheel base.
///
/// Distances are in inches and times in seconds, but nothing depends on the unit
/// as long as every field uses the same one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Distance from the center of the base to the wheel contact circle
    pub wheel_base_radius: f64,

    /// Effective rolling diameter of each wheel: [front left, front right, back left, back right]
    pub wheel_diameters: [f64; 4],

    /// Fraction of velocity lost when driving along one wheel axis.
    /// 0.0 = no slippage, 1.0 = complete slippage
    pub slip_fraction: f64,

    /// Fastest a wheel surface can move
    pub max_wheel_speed: f64,

    /// Acceleration a wheel can reach from standstill without slipping
    pub max_wheel_acceleration_from_stop: f64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            wheel_base_radius: 8.25,
            wheel_diameters: [3.8; 4],
            slip_fraction: 0.1,
            max_wheel_speed: 48.0,
            max_wheel_acceleration_from_stop: 100.0,
        }
    }
}

impl DriveConfig {
    /// Load a TOML config file. Missing fields take their default value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("wheel_base_radius", self.wheel_base_radius)?;
        for &diameter in &self.wheel_diameters {
            positive("wheel_diameters", diameter)?;
        }
        positive("max_wheel_speed", self.max_wheel_speed)?;
        positive(
            "max_wheel_acceleration_from_stop",
            self.max_wheel_acceleration_from_stop,
        )?;

        // A slip fraction of 1.0 would leave nothing to divide the request by
        if !(0.0..1.0).contains(&self.slip_fraction) {
            return Err(ConfigError::Invalid {
                field: "slip_fraction",
                reason: format!("must be in [0, 1), got {}", self.slip_fraction),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and positive, got {}", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DriveConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = DriveConfig::from_toml("slip_fraction = 0.2\nmax_wheel_speed = 60.0\n").unwrap();
        assert_eq!(config.slip_fraction, 0.2);
        assert_eq!(config.max_wheel_speed, 60.0);
        assert_eq!(config.wheel_base_radius, 8.25);
        assert_eq!(config.wheel_diameters, [3.8; 4]);
    }

    #[test]
    fn test_rejects_full_slip() {
        let err = DriveConfig::from_toml("slip_fraction = 1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "slip_fraction",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_positive_geometry() {
        let config = DriveConfig {
            wheel_diameters: [3.8, 3.8, 0.0, 3.8],
            ..DriveConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "wheel_diameters",
                ..
            })
        ));

        let config = DriveConfig {
            max_wheel_speed: f64::NAN,
            ..DriveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            DriveConfig::from_toml("wheel_base_radius = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DriveConfig::load("/nonexistent/drive.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}

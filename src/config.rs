//! Configuration module
//!
//! Loaded from a TOML file (`~/.config/fleet-charging/config.toml` by
//! default). Every section and field is optional.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [charging]
//! auto_schedule_delay_secs = 5
//! scheduled_start_poll_secs = 1
//! suspension_poll_secs = 60
//! tick_interval_secs = 1
//! event_history_cap = 50      # 0 keeps every event
//!
//! [vehicle]
//! nickname = "kEVin"
//! model = "Mini Cooper E"
//! battery_capacity = 32.6
//! initial_charge = 21.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::charging::DEFAULT_EVENT_HISTORY_CAP;
use crate::support::errors::ConfigError;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "FLEET_CONFIG";

/// Default config path: `<config dir>/fleet-charging/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("fleet-charging"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub charging: ChargingConfig,
    pub vehicle: VehicleConfig,
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let charging = &self.charging;
        let intervals = [
            ("charging.scheduled_start_poll_secs", charging.scheduled_start_poll_secs),
            ("charging.suspension_poll_secs", charging.suspension_poll_secs),
            ("charging.tick_interval_secs", charging.tick_interval_secs),
        ];
        for (name, secs) in intervals {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }

        if !(0.0..=100.0).contains(&self.vehicle.initial_charge) {
            return Err(ConfigError::Invalid(
                "vehicle.initial_charge must be within 0–100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `fleet_charging=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Timings of the charging orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// Idle time before a charge is scheduled automatically
    pub auto_schedule_delay_secs: u64,
    /// How often an awaiting schedule checks its start time
    pub scheduled_start_poll_secs: u64,
    /// How often a suspension checks its deadline
    pub suspension_poll_secs: u64,
    /// Interval between battery ticks while charging
    pub tick_interval_secs: u64,
    /// Events kept per session; 0 keeps every event
    pub event_history_cap: usize,
}

impl ChargingConfig {
    pub fn auto_schedule_delay(&self) -> Duration {
        Duration::from_secs(self.auto_schedule_delay_secs)
    }

    pub fn scheduled_start_poll(&self) -> Duration {
        Duration::from_secs(self.scheduled_start_poll_secs)
    }

    pub fn suspension_poll(&self) -> Duration {
        Duration::from_secs(self.suspension_poll_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn history_cap(&self) -> Option<usize> {
        match self.event_history_cap {
            0 => None,
            cap => Some(cap),
        }
    }
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            auto_schedule_delay_secs: 5,
            scheduled_start_poll_secs: 1,
            suspension_poll_secs: 60,
            tick_interval_secs: 1,
            event_history_cap: DEFAULT_EVENT_HISTORY_CAP,
        }
    }
}

/// Vehicle simulated by the command-line runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub nickname: String,
    pub model: String,
    pub battery_capacity: f64,
    pub initial_charge: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            nickname: "kEVin".to_string(),
            model: "Mini Cooper E".to_string(),
            battery_capacity: 32.6,
            initial_charge: 21.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.charging.auto_schedule_delay(), Duration::from_secs(5));
        assert_eq!(config.charging.suspension_poll(), Duration::from_secs(60));
        assert_eq!(config.charging.history_cap(), Some(50));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [charging]
            tick_interval_secs = 2
            event_history_cap = 0

            [vehicle]
            nickname = "Sparky"
            "#,
        )
        .unwrap();

        assert_eq!(config.charging.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.charging.scheduled_start_poll(), Duration::from_secs(1));
        assert_eq!(config.charging.history_cap(), None);
        assert_eq!(config.vehicle.nickname, "Sparky");
        assert_eq!(config.vehicle.model, "Mini Cooper E");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = AppConfig::from_toml("[charging]\ntick_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[charging\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/fleet-charging.toml")).unwrap();
        assert_eq!(config.vehicle.initial_charge, 21.0);
    }
}

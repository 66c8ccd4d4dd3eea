//! Configuration loaded from `fleetline.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work.
//! The `GEMINI_API_KEY` environment variable takes precedence over the file.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::fleet::MotionParams;
use crate::geo::DEFAULT_JITTER_THRESHOLD_MILES;

pub const DEFAULT_CONFIG_FILE: &str = "fleetline.toml";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetlineConfig {
    /// Intelligence service API key.
    #[serde(default)]
    pub api_key: String,

    /// Model used for every intelligence request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Service endpoint; overridable for proxies and tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retries for rate-limited or failed service calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default)]
    pub fleet: FleetConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub settings: Settings,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

/// Fleet simulation tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub step: f64,
    pub arrival_threshold: f64,
    pub completion_bonus: f64,
    pub tick_interval_ms: u64,
    pub notification_limit: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        let motion = MotionParams::default();
        Self {
            step: motion.step,
            arrival_threshold: motion.arrival_threshold,
            completion_bonus: motion.completion_bonus,
            tick_interval_ms: 16,
            notification_limit: 5,
        }
    }
}

impl FleetConfig {
    pub fn motion(&self) -> MotionParams {
        MotionParams {
            step: self.step,
            arrival_threshold: self.arrival_threshold,
            completion_bonus: self.completion_bonus,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub jitter_threshold_miles: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            jitter_threshold_miles: DEFAULT_JITTER_THRESHOLD_MILES,
        }
    }
}

/// Driver vehicle and preference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Miles per gallon.
    pub mpg: f64,
    /// Dollars per gallon.
    pub fuel_cost: f64,
    /// Percentage of earnings set aside for tax.
    pub tax_rate: f64,
    pub notifications: NotificationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mpg: 25.0,
            fuel_cost: 3.50,
            tax_rate: 15.0,
            notifications: NotificationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub high_value_alerts: bool,
    pub shift_reminders: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            high_value_alerts: true,
            shift_reminders: false,
        }
    }
}

impl Default for FleetlineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            fleet: FleetConfig::default(),
            tracking: TrackingConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl FleetlineConfig {
    /// Load `fleetline.toml` from the working directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<FleetlineConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            config.api_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fleet = &self.fleet;
        if !(fleet.step > 0.0) {
            bail!("fleet.step must be positive, got {}", fleet.step);
        }
        if !(fleet.arrival_threshold > 0.0) {
            bail!("fleet.arrival_threshold must be positive, got {}", fleet.arrival_threshold);
        }
        if fleet.completion_bonus < 0.0 {
            bail!("fleet.completion_bonus must not be negative");
        }
        if fleet.tick_interval_ms == 0 {
            bail!("fleet.tick_interval_ms must be at least 1");
        }
        if !(self.tracking.jitter_threshold_miles >= 0.0) {
            bail!("tracking.jitter_threshold_miles must not be negative");
        }
        let s = &self.settings;
        if s.mpg < 0.0 || s.fuel_cost < 0.0 || !(0.0..=100.0).contains(&s.tax_rate) {
            bail!("settings: mpg and fuel_cost must be >= 0 and tax_rate within 0-100");
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

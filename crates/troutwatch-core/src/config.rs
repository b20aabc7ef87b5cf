//! Configuration loading and typed config structures for Troutwatch.
//!
//! The configuration lives in `troutwatch.yaml` (path overridable with
//! `TROUTWATCH_CONFIG`). Every field has a default, so an empty file or
//! no file at all yields a working setup: serve `./public` and
//! `./data.txt` on port 3000, run `python3 getdat.py` on `/run`, and
//! refresh the dashboard every 30 seconds.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::matcher::SensorMatcher;
use crate::zone::{DisplayRange, Thresholds};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TroutwatchConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Data producer invocation.
    #[serde(default)]
    pub producer: ProducerConfig,

    /// Dashboard refresh and alert tiles.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "PORT";
/// Environment variable overriding `producer.program`.
pub const PRODUCER_ENV: &str = "TROUTWATCH_PRODUCER";

impl TroutwatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `PORT` overrides `server.port`
    /// - `TROUTWATCH_PRODUCER` overrides `producer.program`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply overrides from
    /// the process environment.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::load(yaml, |key| std::env::var(key).ok())
    }

    /// Parse configuration from a YAML string, apply overrides resolved
    /// through `lookup`, and validate the result.
    pub fn load<F>(yaml: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_yaml(yaml)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML string. No environment is consulted; an
    /// empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORT` and `TROUTWATCH_PRODUCER` overrides resolved through
    /// `lookup`. A blank producer value is ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(PORT_ENV) {
            self.server.port = val
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid {PORT_ENV} {val:?}: {e}")))?;
        }
        if let Some(val) = lookup(PRODUCER_ENV)
            && !val.trim().is_empty()
        {
            self.producer.program = val;
        }
        Ok(())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producer.program.trim().is_empty() {
            return Err(ConfigError::Invalid("producer.program is empty".to_owned()));
        }
        if self.producer.timeout_ms == 0 {
            return Err(ConfigError::Invalid("producer.timeout_ms must be > 0".to_owned()));
        }
        if self.dashboard.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.refresh_interval_ms must be > 0".to_owned(),
            ));
        }
        if self.dashboard.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.fetch_timeout_ms must be > 0".to_owned(),
            ));
        }
        for alert in &self.dashboard.alerts {
            alert.validate()?;
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served as static files.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Text file written by the producer and served at `/data.txt`.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            data_file: default_data_file(),
        }
    }
}

/// How to run the external data producer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProducerConfig {
    /// Executable to launch.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments passed to the executable.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Working directory of the child process.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Watchdog: the child is killed after this many milliseconds.
    #[serde(default = "default_producer_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: default_working_dir(),
            timeout_ms: default_producer_timeout_ms(),
        }
    }
}

/// Dashboard refresh settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    /// URL of the data text. When unset the data file is read directly.
    #[serde(default)]
    pub source_url: Option<String>,

    /// Delay before the first refresh cycle.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Interval between refresh cycles.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Request timeout for the HTTP source.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Alert tiles, in display order.
    #[serde(default = "default_alerts")]
    pub alerts: Vec<AlertConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            startup_delay_ms: default_startup_delay_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            alerts: default_alerts(),
        }
    }
}

/// One threshold alert tile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlertConfig {
    /// Tile identifier (constant across refreshes).
    pub id: String,

    /// Tile title and muted label.
    pub title: String,

    /// Short sensor label prefixed to the zone caption.
    pub label: String,

    /// Header glyph.
    #[serde(default = "default_alert_icon")]
    pub icon: String,

    /// Token groups: every group needs one token present in the name.
    pub tokens: Vec<Vec<String>>,

    /// Cold threshold (inclusive).
    pub cold: f64,

    /// Hot threshold (inclusive).
    pub hot: f64,

    /// Slider minimum.
    #[serde(default = "default_range_min")]
    pub min: f64,

    /// Slider maximum.
    #[serde(default = "default_range_max")]
    pub max: f64,
}

impl AlertConfig {
    /// Matcher built from the token groups.
    pub fn matcher(&self) -> SensorMatcher {
        SensorMatcher::from_token_groups(&self.tokens)
    }

    /// Threshold pair.
    pub const fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.cold, self.hot)
    }

    /// Slider range.
    pub const fn range(&self) -> DisplayRange {
        DisplayRange::new(self.min, self.max)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Invalid("alert id is empty".to_owned()));
        }
        if self.tokens.iter().all(Vec::is_empty) {
            return Err(ConfigError::Invalid(format!("alert {} has no tokens", self.id)));
        }
        if self.cold.is_nan() || self.hot.is_nan() || self.cold >= self.hot {
            return Err(ConfigError::Invalid(format!(
                "alert {}: cold ({}) must be below hot ({})",
                self.id, self.cold, self.hot
            )));
        }
        if self.min.is_nan() || self.max.is_nan() || self.min >= self.max {
            return Err(ConfigError::Invalid(format!(
                "alert {}: min ({}) must be below max ({})",
                self.id, self.min, self.max
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.txt")
}

fn default_program() -> String {
    "python3".to_owned()
}

fn default_args() -> Vec<String> {
    vec!["getdat.py".to_owned()]
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_producer_timeout_ms() -> u64 {
    15_000
}

const fn default_startup_delay_ms() -> u64 {
    200
}

const fn default_refresh_interval_ms() -> u64 {
    30_000
}

const fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_alert_icon() -> String {
    "⚠".to_owned()
}

const fn default_range_min() -> f64 {
    -10.0
}

const fn default_range_max() -> f64 {
    35.0
}

fn tokens(groups: &[&[&str]]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|group| group.iter().map(|t| (*t).to_owned()).collect())
        .collect()
}

/// The two stock alert tiles: trout water temperature and air
/// temperature.
pub fn default_alerts() -> Vec<AlertConfig> {
    vec![
        AlertConfig {
            id: "warning-water-temp".to_owned(),
            title: "Water temperature alert (trout)".to_owned(),
            label: "Water".to_owned(),
            icon: default_alert_icon(),
            tokens: tokens(&[&["eau", "water"], &["truit", "trout"]]),
            cold: 8.0,
            hot: 22.0,
            min: default_range_min(),
            max: default_range_max(),
        },
        AlertConfig {
            id: "warning-air-temp".to_owned(),
            title: "Air temperature alert".to_owned(),
            label: "Air".to_owned(),
            icon: "🔥".to_owned(),
            tokens: tokens(&[&["air"], &["temp"]]),
            cold: 10.0,
            hot: 30.0,
            min: default_range_min(),
            max: default_range_max(),
        },
    ]
}

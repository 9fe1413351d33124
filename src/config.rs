//! Configuration loader plus strongly typed settings structures.
//!
//! Settings live in `~/.ref-demo/config.toml` (or `$REF_DEMO_DIR`). The
//! embedded defaults are written out on first run so there is always a file
//! to edit.

use crate::components::MeasureSettings;
use crate::data::document::Metrics;
use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// Embed default configuration at compile time
const DEFAULT_CONFIG: &str = include_str!("../defaults/config.toml");

/// Largest accepted `measure.units_per_cell`
pub const MAX_UNITS_PER_CELL: u32 = 1024;

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "REF_DEMO_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub measure: MeasureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub show_status_bar: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureConfig {
    #[serde(default = "default_units_per_cell")]
    pub units_per_cell: u32,
    #[serde(default = "default_large_threshold")]
    pub large_threshold: u32,
    #[serde(default = "default_large_color")]
    pub large_color: String,
    #[serde(default = "default_small_color")]
    pub small_color: String,
}

fn default_poll_timeout() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

fn default_units_per_cell() -> u32 {
    Metrics::default().units_per_cell
}

fn default_large_threshold() -> u32 {
    crate::components::LARGE_WIDTH_THRESHOLD
}

fn default_large_color() -> String {
    "red".to_string()
}

fn default_small_color() -> String {
    "blue".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout(),
            show_status_bar: true,
        }
    }
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            units_per_cell: default_units_per_cell(),
            large_threshold: default_large_threshold(),
            large_color: default_large_color(),
            small_color: default_small_color(),
        }
    }
}

/// Problem found by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    Error(String),
    Warning(String),
}

impl ConfigIssue {
    pub fn message(&self) -> &str {
        match self {
            ConfigIssue::Error(msg) | ConfigIssue::Warning(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ConfigIssue::Error(_))
    }
}

/// Parse a color name or `#rrggbb` hex string
pub fn parse_color(value: &str) -> Option<Color> {
    Color::from_str(value.trim()).ok()
}

impl Config {
    /// Load from the data directory, extracting defaults on first run
    pub fn load() -> Result<Self> {
        Self::extract_defaults()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a custom file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
        let config = Self::parse(&contents)
            .context(format!("Failed to parse config file: {:?}", path))?;

        for issue in config.validate() {
            tracing::warn!("Config: {}", issue.message());
        }
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Embedded defaults, as written on first run
    #[cfg(test)]
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG).context("Failed to parse embedded default config")
    }

    /// Report unusable values. Errors make the value fall back to its default.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(1..=MAX_UNITS_PER_CELL).contains(&self.measure.units_per_cell) {
            issues.push(ConfigIssue::Error(format!(
                "measure.units_per_cell must be between 1 and {}",
                MAX_UNITS_PER_CELL
            )));
        }
        if self.measure.large_threshold == 0 {
            issues.push(ConfigIssue::Warning(
                "measure.large_threshold is 0: every text will count as large".to_string(),
            ));
        }
        for (key, value) in [
            ("measure.large_color", &self.measure.large_color),
            ("measure.small_color", &self.measure.small_color),
        ] {
            if parse_color(value).is_none() {
                issues.push(ConfigIssue::Error(format!(
                    "{} = {:?} is not a color name or #rrggbb",
                    key, value
                )));
            }
        }
        if self.measure.large_color.eq_ignore_ascii_case(&self.measure.small_color) {
            issues.push(ConfigIssue::Warning(
                "measure.large_color and measure.small_color are the same".to_string(),
            ));
        }
        if self.ui.poll_timeout_ms == 0 {
            issues.push(ConfigIssue::Warning(
                "ui.poll_timeout_ms is 0: the event loop will spin".to_string(),
            ));
        }

        issues
    }

    pub fn metrics(&self) -> Metrics {
        match self.measure.units_per_cell {
            units_per_cell @ 1..=MAX_UNITS_PER_CELL => Metrics { units_per_cell },
            _ => Metrics::default(),
        }
    }

    pub fn measure_settings(&self) -> MeasureSettings {
        let defaults = MeasureSettings::default();
        MeasureSettings {
            large_threshold: self.measure.large_threshold,
            large_color: parse_color(&self.measure.large_color).unwrap_or(defaults.large_color),
            small_color: parse_color(&self.measure.small_color).unwrap_or(defaults.small_color),
        }
    }

    /// Write the embedded config if no file exists yet (idempotent)
    fn extract_defaults() -> Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create data directory {:?}", parent))?;
        }
        fs::write(&path, DEFAULT_CONFIG).context("Failed to write default config.toml")?;
        tracing::info!("Extracted default config to {:?}", path);
        Ok(())
    }

    /// Get the base data directory (~/.ref-demo/)
    /// Can be overridden with REF_DEMO_DIR environment variable
    pub fn base_dir() -> Result<PathBuf> {
        if let Ok(custom_dir) = std::env::var(DIR_ENV) {
            return Ok(PathBuf::from(custom_dir));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".ref-demo"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::RefExamples;
    use crate::core::ports::{DocumentMeta, RecordingMeta};
    use crate::core::runtime::Runtime;
    use std::rc::Rc;

    #[test]
    fn test_embedded_defaults_parse() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.ui.poll_timeout_ms, 16);
        assert!(config.ui.show_status_bar);
        assert_eq!(config.metrics(), Metrics { units_per_cell: 8 });
        assert_eq!(config.measure_settings(), MeasureSettings::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::parse("[measure]\nlarge_threshold = 80\n").unwrap();
        assert_eq!(config.measure.large_threshold, 80);
        assert_eq!(config.measure.units_per_cell, 8);
        assert_eq!(config.ui.poll_timeout_ms, 16);

        let empty = Config::parse("").unwrap();
        assert_eq!(empty.measure.large_color, "red");
    }

    #[test]
    fn test_hex_and_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let config = Config::parse(
            "[measure]\nunits_per_cell = 0\nlarge_color = \"mauve-ish\"\n",
        )
        .unwrap();
        let issues = config.validate();
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 2);

        // Errors fall back instead of failing
        assert_eq!(config.metrics(), Metrics::default());
        assert_eq!(config.measure_settings().large_color, Color::Red);
    }

    #[test]
    fn test_huge_units_per_cell_is_rejected_and_mounts() {
        let config = Config::parse("[measure]\nunits_per_cell = 400000000\n").unwrap();
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.is_error()));
        assert_eq!(config.metrics(), Metrics::default());

        let meta = Rc::new(RecordingMeta::new());
        let mut runtime = Runtime::new(config.metrics());
        runtime
            .mount(RefExamples::new(meta.clone(), config.measure_settings()))
            .unwrap();
        assert_eq!(meta.title().as_deref(), Some("Width:104"));
    }

    #[test]
    fn test_load_extracts_defaults_into_data_dir() {
        let dir = std::env::temp_dir().join(format!("ref-demo-config-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        std::env::set_var(DIR_ENV, &dir);

        let config = Config::load().unwrap();
        let written = fs::read_to_string(dir.join("config.toml")).unwrap();
        assert_eq!(written, DEFAULT_CONFIG);
        assert_eq!(config.metrics(), Metrics::default());

        // An edited file is kept on the next load
        fs::write(dir.join("config.toml"), "[measure]\nlarge_threshold = 90\n").unwrap();
        let config = Config::load().unwrap();
        assert_eq!(config.measure.large_threshold, 90);

        std::env::remove_var(DIR_ENV);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(Config::parse("[measure\nunits_per_cell = 1").is_err());
    }
}

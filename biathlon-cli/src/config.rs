//! Application settings loading and parsing

use anyhow::{bail, Context, Result};
use biathlon_report::{
    check_time_format, DurationTemplate, EventKind, NarrationTable, TableFormat,
    DEFAULT_DELTA_FORMAT, DEFAULT_DURATION_TEMPLATE, DEFAULT_TIME_FORMAT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application settings (loaded from settings.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub race: RaceConfig,
    #[serde(default)]
    pub run: RunConfig,
    /// Narration template overrides keyed by event code
    #[serde(default)]
    pub narration: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_config_path")]
    pub config: PathBuf,
    #[serde(default = "default_events_path")]
    pub events: PathBuf,
    #[serde(default = "default_output_log_path")]
    pub output_log: PathBuf,
    #[serde(default = "default_result_table_path")]
    pub result_table: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config: default_config_path(),
            events: default_events_path(),
            output_log: default_output_log_path(),
            result_table: default_result_table_path(),
        }
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_events_path() -> PathBuf {
    PathBuf::from("events")
}

fn default_output_log_path() -> PathBuf {
    PathBuf::from("output_events_log.txt")
}

fn default_result_table_path() -> PathBuf {
    PathBuf::from("result_table.txt")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatConfig {
    /// strftime format of event timestamps and the race start
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// strftime format of the start interval
    #[serde(default = "default_delta_format")]
    pub delta_format: String,
    /// printf-style template for durations in the result table
    #[serde(default = "default_duration_template")]
    pub duration_template: String,
    pub not_started: Option<String>,
    pub not_finished: Option<String>,
    /// Narrate events sorted by time instead of arrival order
    #[serde(default)]
    pub chronological_log: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            delta_format: default_delta_format(),
            duration_template: default_duration_template(),
            not_started: None,
            not_finished: None,
            chronological_log: false,
        }
    }
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_delta_format() -> String {
    DEFAULT_DELTA_FORMAT.to_string()
}

fn default_duration_template() -> String {
    DEFAULT_DURATION_TEMPLATE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceConfig {
    #[serde(default = "default_targets")]
    pub targets_per_firing_line: u32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            targets_per_firing_line: default_targets(),
        }
    }
}

fn default_targets() -> u32 {
    5
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// Stop at the first failed stage instead of logging and continuing
    #[serde(default)]
    pub fail_fast: bool,
}

impl AppConfig {
    /// Build the result-table format from the format section
    pub fn table_format(&self) -> Result<TableFormat> {
        let template = DurationTemplate::parse(&self.format.duration_template)
            .context("Invalid duration template")?;

        let defaults = TableFormat::default();
        Ok(TableFormat::new(template).with_labels(
            self.format
                .not_started
                .clone()
                .unwrap_or(defaults.not_started),
            self.format
                .not_finished
                .clone()
                .unwrap_or(defaults.not_finished),
        ))
    }

    /// Build the narration table, applying overrides from the narration section
    pub fn narration_table(&self) -> Result<NarrationTable> {
        let mut table = NarrationTable::default();
        for (code, template) in &self.narration {
            let code: i64 = code
                .trim()
                .parse()
                .with_context(|| format!("Narration key {:?} is not an event code", code))?;
            let kind = EventKind::from_code(code);
            if !kind.is_known() {
                bail!("Narration key {} is not a known event code", code);
            }
            table = table.with_template(kind, template.clone());
        }
        Ok(table)
    }

    /// Check the settings before any stage runs
    pub fn validate(&self) -> Result<()> {
        check_time_format(&self.format.time_format).context("Invalid time_format")?;
        check_time_format(&self.format.delta_format).context("Invalid delta_format")?;
        self.table_format()?;
        self.narration_table()?;
        Ok(())
    }
}

/// Load settings from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [paths]
            events = "race/events"

            [format]
            duration_template = "%d:%02d:%02d.%03d"
            not_finished = "DNF"

            [race]
            targets_per_firing_line = 3

            [narration]
            4 = "Competitor {competitor} is off"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.paths.events, PathBuf::from("race/events"));
        assert_eq!(config.paths.config, PathBuf::from("config.json"));
        assert_eq!(config.format.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(config.race.targets_per_firing_line, 3);
        assert!(!config.run.fail_fast);
        assert!(config.validate().is_ok());

        let format = config.table_format().unwrap();
        assert_eq!(format.not_started, "NotStarted");
        assert_eq!(format.not_finished, "DNF");

        let table = config.narration_table().unwrap();
        assert_eq!(
            table.template(EventKind::Started),
            "Competitor {competitor} is off"
        );
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.paths.result_table, PathBuf::from("result_table.txt"));
        assert_eq!(config.race.targets_per_firing_line, 5);
        assert_eq!(config.format.duration_template, DEFAULT_DURATION_TEMPLATE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = AppConfig::default();
        config.format.duration_template = "%02d:%02d".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.narration.insert("12".to_string(), "nope".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.narration.insert("start".to_string(), "nope".to_string());
        assert!(config.validate().is_err());
    }
}

use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};

/// Parallel execution strategy for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Divide-and-conquer for random-access sources, round-robin for
    /// streams.
    #[default]
    Auto,
    DivideAndConquer,
    RoundRobin,
}

/// Configuration for a scan.
///
/// Values can be loaded from `$XDG_CONFIG_HOME/mtscan/config.yaml` and a
/// local `.mtscan.yaml`; CLI arguments take precedence via
/// [`merge_with_cli`](Self::merge_with_cli). The pattern itself never comes
/// from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// The search pattern; `?` matches any single byte.
    #[serde(skip)]
    pub pattern: String,

    /// Line delimiter byte.
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,

    /// Parallel strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Number of worker threads.
    /// Defaults to the number of CPU cores.
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to report only the total count instead of every finding.
    #[serde(default)]
    pub stats_only: bool,
}

fn default_delimiter() -> u8 {
    b'\n'
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get().max(1)).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            delimiter: default_delimiter(),
            strategy: Strategy::default(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            stats_only: false,
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations.
    pub fn load() -> ScanResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally adding a custom file with the
    /// highest precedence. Missing files are skipped.
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // global config
            dirs::config_dir().map(|dir| dir.join("mtscan/config.yaml")),
            // local config
            Some(PathBuf::from(".mtscan.yaml")),
            // custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|error| ScanError::config_error(error.to_string()))
    }

    /// Merges CLI arguments over configuration file values.
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        if !cli_config.pattern.is_empty() {
            self.pattern = cli_config.pattern;
        }
        if cli_config.delimiter != default_delimiter() {
            self.delimiter = cli_config.delimiter;
        }
        if cli_config.strategy != Strategy::Auto {
            self.strategy = cli_config.strategy;
        }
        self.thread_count = cli_config.thread_count;
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if cli_config.stats_only {
            self.stats_only = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn loads_values_from_a_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            strategy: "round-robin"
            thread_count: 4
            log_level: "debug"
            stats_only: true
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = ScanConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.strategy, Strategy::RoundRobin);
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.log_level, "debug");
        assert!(config.stats_only);
        // the pattern never comes from a file
        assert!(config.pattern.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ScanConfig::load_from(Some(Path::new("does-not-exist.yaml"))).unwrap();
        assert_eq!(config.strategy, Strategy::Auto);
        assert_eq!(config.delimiter, b'\n');
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn cli_values_take_precedence() {
        let file_config = ScanConfig {
            pattern: String::new(),
            delimiter: b'\n',
            strategy: Strategy::DivideAndConquer,
            thread_count: NonZeroUsize::new(2).unwrap(),
            log_level: "debug".to_string(),
            stats_only: false,
        };

        let cli_config = ScanConfig {
            pattern: "?ad".to_string(),
            delimiter: b'\n',
            strategy: Strategy::RoundRobin,
            thread_count: NonZeroUsize::new(8).unwrap(),
            log_level: "warn".to_string(),
            stats_only: true,
        };

        let merged = file_config.merge_with_cli(cli_config);
        assert_eq!(merged.pattern, "?ad");
        assert_eq!(merged.strategy, Strategy::RoundRobin);
        assert_eq!(merged.thread_count, NonZeroUsize::new(8).unwrap());
        // CLI log level was the default, so the file value survives
        assert_eq!(merged.log_level, "debug");
        assert!(merged.stats_only);
    }

    #[test]
    fn auto_strategy_defers_to_the_file() {
        let file_config = ScanConfig {
            strategy: Strategy::RoundRobin,
            ..ScanConfig::default()
        };
        let merged = file_config.merge_with_cli(ScanConfig::default());
        assert_eq!(merged.strategy, Strategy::RoundRobin);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"thread_count: \"not a number\"\n").unwrap();

        assert!(ScanConfig::load_from(Some(&config_path)).is_err());
    }
}

//! Configuration management for parsdoc.
//!
//! Settings start from defaults, are overridden by an optional config file
//! (TOML or JSON) and finally by command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config filename looked up in the working directory.
pub const LOCAL_CONFIG_FILENAME: &str = "parsdoc.toml";

/// Default output directory (relative to the working directory).
pub const DEFAULT_OUTPUT_DIR: &str = "output";

const FAILED_LOG_FILENAME: &str = "failed_files.log";
const REPORT_LOG_FILENAME: &str = "conversion_report.log";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Tunable constants for classification, scoring and acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Average characters per page at or above which a document is `text`.
    pub text_threshold_chars_per_page: f64,
    /// Characters per page at which text classification confidence saturates.
    pub text_confidence_saturation: f64,
    /// Characters per page treated as a fully dense page by the scorer.
    pub expected_chars_per_page: f64,
    pub text_base_weight: f64,
    /// Weight of character density in the text score; the rest is a constant.
    pub text_char_weight: f64,
    pub empty_page_penalty: f64,
    pub image_base_weight: f64,
    /// Weight of character density in the image score; the rest is OCR confidence.
    pub image_char_weight: f64,
    /// OCR confidence assumed when the engine reported none.
    pub default_ocr_confidence: f64,
    /// Records scoring below this are flagged `low_integrity`.
    pub min_integrity: f64,
    /// Minimum trimmed characters of usable text.
    pub min_text_chars: usize,
    pub max_paragraph_len: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            text_threshold_chars_per_page: 80.0,
            text_confidence_saturation: 1000.0,
            expected_chars_per_page: 400.0,
            text_base_weight: 0.90,
            text_char_weight: 0.6,
            empty_page_penalty: 0.20,
            image_base_weight: 0.80,
            image_char_weight: 0.5,
            default_ocr_confidence: 0.75,
            min_integrity: 0.85,
            min_text_chars: 50,
            max_paragraph_len: 1200,
        }
    }
}

impl Policy {
    /// Reject weights outside `[0, 1]` and non-positive baselines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("text_base_weight", self.text_base_weight),
            ("text_char_weight", self.text_char_weight),
            ("empty_page_penalty", self.empty_page_penalty),
            ("image_base_weight", self.image_base_weight),
            ("image_char_weight", self.image_char_weight),
            ("default_ocr_confidence", self.default_ocr_confidence),
            ("min_integrity", self.min_integrity),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let positive_fields = [
            ("text_threshold_chars_per_page", self.text_threshold_chars_per_page),
            ("text_confidence_saturation", self.text_confidence_saturation),
            ("expected_chars_per_page", self.expected_chars_per_page),
        ];
        for (name, value) in positive_fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.max_paragraph_len == 0 {
            return Err(ConfigError::InvalidPolicy(
                "max_paragraph_len must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    /// Tesseract model to use.
    pub language: String,
    /// Model used when `language` is not installed.
    pub fallback_language: String,
    /// Rasterization resolution.
    pub dpi: u32,
    /// Per-document OCR deadline. `None` disables it.
    pub timeout_secs: Option<u64>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "fas".to_string(),
            fallback_language: "eng".to_string(),
            dpi: 300,
            timeout_secs: None,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory receiving one JSON file per converted document.
    pub output_dir: PathBuf,
    /// Failure log path; defaults to a file inside `output_dir`.
    pub failed_log: Option<PathBuf>,
    /// Report log path; defaults to a file inside `output_dir`.
    pub report_log: Option<PathBuf>,
    /// Documents processed concurrently.
    pub workers: usize,
    pub ocr: OcrSettings,
    pub policy: Policy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            failed_log: None,
            report_log: None,
            workers: default_workers(),
            ocr: OcrSettings::default(),
            policy: Policy::default(),
        }
    }
}

/// One worker per available core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Settings {
    /// Create settings writing into a custom output directory.
    pub fn with_output_dir(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            ..Default::default()
        }
    }

    pub fn failed_log_path(&self) -> PathBuf {
        self.failed_log
            .clone()
            .unwrap_or_else(|| self.output_dir.join(FAILED_LOG_FILENAME))
    }

    pub fn report_log_path(&self) -> PathBuf {
        self.report_log
            .clone()
            .unwrap_or_else(|| self.output_dir.join(REPORT_LOG_FILENAME))
    }

    /// Validate values that cannot be checked by the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidSetting(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.ocr.dpi == 0 {
            return Err(ConfigError::InvalidSetting(
                "ocr.dpi must be at least 1".to_string(),
            ));
        }
        self.policy.validate()
    }
}

/// `[ocr]` table of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Partial tables are completed from `Policy::default()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific file path.
    /// TOML for `.toml` files, JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            _ => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref output_dir) = self.output_dir {
            settings.output_dir = self.resolve_path(output_dir, base_dir);
        }
        if let Some(ref failed_log) = self.failed_log {
            settings.failed_log = Some(self.resolve_path(failed_log, base_dir));
        }
        if let Some(ref report_log) = self.report_log {
            settings.report_log = Some(self.resolve_path(report_log, base_dir));
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(ref language) = self.ocr.language {
            settings.ocr.language = language.clone();
        }
        if let Some(ref fallback) = self.ocr.fallback_language {
            settings.ocr.fallback_language = fallback.clone();
        }
        if let Some(dpi) = self.ocr.dpi {
            settings.ocr.dpi = dpi;
        }
        if let Some(timeout) = self.ocr.timeout_secs {
            settings.ocr.timeout_secs = Some(timeout);
        }
        if let Some(ref policy) = self.policy {
            settings.policy = policy.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Candidate config files, in lookup order.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILENAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("parsdoc").join("config.toml"));
    }
    candidates
}

/// Load settings from the discovered (or explicit) config file.
///
/// An explicit `config_path` must exist; discovered candidates are optional.
/// The resulting settings are validated before being returned.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => match config_candidates().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!("Using config file {}", path.display());
                Config::load_from_path(&path).await?
            }
            None => Config::default(),
        },
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);
    settings.validate()?;

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(Policy::default().validate().is_ok());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_weight_outside_unit_interval() {
        let policy = Policy {
            text_char_weight: 1.5,
            ..Policy::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("text_char_weight"));
    }

    #[test]
    fn rejects_zero_baseline() {
        let policy = Policy {
            expected_chars_per_page: 0.0,
            ..Policy::default()
        };
        assert!(matches!(policy.validate(), Err(ConfigError::InvalidPolicy(_))));
    }

    #[test]
    fn rejects_zero_workers() {
        let settings = Settings {
            workers: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidSetting(_))));
    }

    #[test]
    fn logs_default_into_output_dir() {
        let settings = Settings::with_output_dir(PathBuf::from("/tmp/out"));
        assert_eq!(settings.failed_log_path(), PathBuf::from("/tmp/out/failed_files.log"));
        assert_eq!(
            settings.report_log_path(),
            PathBuf::from("/tmp/out/conversion_report.log")
        );
    }

    #[test]
    fn parses_partial_toml_policy() {
        let toml = r#"
            workers = 2
            output_dir = "json"

            [ocr]
            dpi = 200

            [policy]
            min_integrity = 0.7
        "#;
        let config = Config::parse(Path::new("parsdoc.toml"), toml).unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/corpus"));

        assert_eq!(settings.workers, 2);
        assert_eq!(settings.output_dir, PathBuf::from("/srv/corpus/json"));
        assert_eq!(settings.ocr.dpi, 200);
        assert_eq!(settings.ocr.language, "fas");
        assert_eq!(settings.policy.min_integrity, 0.7);
        assert_eq!(settings.policy.max_paragraph_len, 1200);
    }

    #[test]
    fn parses_json_by_default() {
        let config =
            Config::parse(Path::new("parsdoc.json"), r#"{"ocr": {"timeout_secs": 90}}"#).unwrap();
        assert_eq!(config.ocr.timeout_secs, Some(90));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let err = Config::parse(Path::new("bad.toml"), "workers = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[tokio::test]
    async fn explicit_config_path_must_exist() {
        let options = LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/parsdoc.toml")),
        };
        let err = load_settings_with_options(options).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn loads_config_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "output_dir = \"records\"\nfailed_log = \"~/failed.log\"\n").unwrap();

        let (settings, config) = load_settings_with_options(LoadOptions {
            config_path: Some(path.clone()),
        })
        .await
        .unwrap();

        assert_eq!(config.source_path, Some(path));
        assert_eq!(settings.output_dir, dir.path().join("records"));
        let failed = settings.failed_log_path();
        assert!(failed.is_absolute() || !failed.starts_with("~"));
        assert!(failed.ends_with("failed.log"));
    }
}

//! Run configuration.
//!
//! Every setting has a default, so a configuration file only needs the keys it
//! changes. Command line flags are applied on top of the loaded file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::extract::StepExtractor;
use crate::locator::{ArtifactLocator, SearchScope};
use crate::provider::QuantityKind;
use crate::steps::StepEnumerator;

/// Directory name that marks the simulation folder of a project.
pub const DEFAULT_MARKER: &str = "3_SIMULACION";
/// Extension of result files.
pub const DEFAULT_EXTENSION: &str = "rst";
/// Default per-artifact time limit in seconds.
pub const DEFAULT_ARTIFACT_TIMEOUT_SECS: u64 = 600;

/// Layout of the delimited text output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvOptions {
    /// Column delimiter.
    pub delimiter: char,
    /// Character written in place of the decimal point.
    pub decimal_separator: char,
    /// Output encoding. Only UTF-8 is supported.
    pub encoding: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: '.',
            encoding: "utf-8".to_owned(),
        }
    }
}

impl CsvOptions {
    /// Check that the options describe a readable file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCsvOptions`] for a non-ASCII or quoting
    /// delimiter, a delimiter equal to the decimal separator, a digit used as
    /// decimal separator or an unsupported encoding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidCsvOptions(reason));
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return invalid(format!("delimiter {:?} is not usable", self.delimiter));
        }
        if !self.decimal_separator.is_ascii() || self.decimal_separator.is_ascii_digit() {
            return invalid(format!(
                "decimal separator {:?} is not usable",
                self.decimal_separator
            ));
        }
        if self.delimiter == self.decimal_separator {
            return invalid("delimiter and decimal separator must differ".to_owned());
        }
        let encoding = self.encoding.to_ascii_lowercase();
        if encoding != "utf-8" && encoding != "utf8" {
            return invalid(format!("encoding {:?} is not supported", self.encoding));
        }
        Ok(())
    }

    /// Delimiter as the single byte the writer expects.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b';')
    }

    /// Render a number with the configured decimal separator.
    #[must_use]
    pub fn format_number(&self, value: f64) -> String {
        let text = value.to_string();
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

/// Settings of one batch run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    /// Directory name beneath which artifacts are searched.
    pub marker: String,
    /// Extension of result files, without the dot.
    pub extension: String,
    /// Whether artifacts must sit beneath a marker directory.
    pub require_marker: bool,
    /// Quantities to extract.
    pub quantities: Vec<QuantityKind>,
    /// Number of artifacts processed concurrently.
    pub workers: usize,
    /// Time limit for processing one artifact, in seconds.
    pub artifact_timeout_secs: u64,
    /// Fixed number of steps to use instead of the provider's step axis.
    pub forced_step_count: Option<usize>,
    /// Whether a header-only file is written when no rows were produced.
    pub write_empty: bool,
    /// Output layout.
    pub csv: CsvOptions,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_owned(),
            extension: DEFAULT_EXTENSION.to_owned(),
            require_marker: true,
            quantities: QuantityKind::ALL.to_vec(),
            workers: 1,
            artifact_timeout_secs: DEFAULT_ARTIFACT_TIMEOUT_SECS,
            forced_step_count: None,
            write_empty: true,
            csv: CsvOptions::default(),
        }
    }
}

impl HarvestConfig {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnreadableFile`] or [`ConfigError::InvalidFile`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every setting before a run starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] or [`ConfigError::InvalidCsvOptions`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(ConfigError::InvalidSetting {
                name,
                reason: reason.to_owned(),
            })
        };
        if self.require_marker && self.marker.trim().is_empty() {
            return invalid("marker", "must not be empty");
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return invalid("extension", "must not be empty");
        }
        if self.quantities.is_empty() {
            return invalid("quantities", "at least one quantity is required");
        }
        if self.workers == 0 {
            return invalid("workers", "must be at least 1");
        }
        if self.artifact_timeout_secs == 0 {
            return invalid("artifact_timeout_secs", "must be at least 1");
        }
        if self.forced_step_count == Some(0) {
            return invalid("forced_step_count", "must be at least 1");
        }
        self.csv.validate()
    }

    /// Time limit for one artifact.
    #[must_use]
    pub fn artifact_timeout(&self) -> Duration {
        Duration::from_secs(self.artifact_timeout_secs)
    }

    /// Locator for this configuration.
    #[must_use]
    pub fn locator(&self) -> ArtifactLocator {
        let scope = if self.require_marker {
            SearchScope::UnderMarker
        } else {
            SearchScope::Anywhere
        };
        ArtifactLocator::new(self.marker.clone(), self.extension.clone()).with_scope(scope)
    }

    /// Step enumerator for this configuration.
    #[must_use]
    pub fn step_enumerator(&self) -> StepEnumerator {
        self.forced_step_count
            .map_or_else(StepEnumerator::new, StepEnumerator::forced)
    }

    /// Step extractor for this configuration.
    #[must_use]
    pub fn extractor(&self) -> StepExtractor {
        StepExtractor::new(&self.quantities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HarvestConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.csv.delimiter, ';');
        assert_eq!(config.marker, DEFAULT_MARKER);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("harvest.json");
        fs::write(
            &path,
            r#"{ "workers": 4, "quantities": ["displacement", "stress"], "csv": { "delimiter": "," } }"#,
        )
        .expect("write config");

        let config = HarvestConfig::from_json_file(&path).expect("config loads");
        assert_eq!(config.workers, 4);
        assert_eq!(
            config.quantities,
            vec![QuantityKind::Displacement, QuantityKind::Stress]
        );
        assert_eq!(config.csv.delimiter, ',');
        assert_eq!(config.csv.decimal_separator, '.');
        assert_eq!(config.extension, DEFAULT_EXTENSION);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("harvest.json");
        fs::write(&path, r#"{ "wrokers": 4 }"#).expect("write config");
        assert!(matches!(
            HarvestConfig::from_json_file(&path),
            Err(ConfigError::InvalidFile { .. })
        ));
    }

    #[test]
    fn rejects_clashing_separators() {
        let options = CsvOptions {
            delimiter: ',',
            decimal_separator: ',',
            ..CsvOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidCsvOptions(_))
        ));
    }

    #[test]
    fn rejects_other_encodings() {
        let options = CsvOptions {
            encoding: "latin-1".to_owned(),
            ..CsvOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn rejects_zero_workers() {
        let config = HarvestConfig {
            workers: 0,
            ..HarvestConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { name: "workers", .. })
        ));
    }

    #[test]
    fn formats_numbers_with_decimal_comma() {
        let options = CsvOptions {
            delimiter: ';',
            decimal_separator: ',',
            ..CsvOptions::default()
        };
        assert_eq!(options.format_number(12.5), "12,5");
        assert_eq!(CsvOptions::default().format_number(0.25), "0.25");
    }
}

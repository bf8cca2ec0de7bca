use crate::common::constants::{DATABASE_PREFIX, REPORT_NAME, ZERO_THRESHOLD};
use crate::domain::{Failure, HymError, HymResult};
use crate::transcribe::{ClosurePolicy, TranscribeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of a conversion run. Every key is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionOptions {
    #[serde(default)]
    pub closure: ClosurePolicy,
    #[serde(rename = "axisAverage", default)]
    pub axis_average: bool,
    #[serde(rename = "zeroThreshold", default = "default_zero_threshold")]
    pub zero_threshold: f32,
    #[serde(rename = "writeAscii", default)]
    pub write_ascii: bool,
    #[serde(rename = "databasePrefix", default = "default_database_prefix")]
    pub database_prefix: String,
    #[serde(rename = "reportName", default = "default_report_name")]
    pub report_name: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            closure: ClosurePolicy::default(),
            axis_average: false,
            zero_threshold: default_zero_threshold(),
            write_ascii: false,
            database_prefix: default_database_prefix(),
            report_name: default_report_name(),
        }
    }
}

impl ConversionOptions {
    pub fn from_json(source: &str) -> HymResult<Self> {
        let options: Self = serde_json::from_str(source).map_err(|source| {
            HymError::new(
                Failure::OptionsFormat,
                format!("conversion options are malformed: {}", source),
            )
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> HymResult<()> {
        if !self.zero_threshold.is_finite() || self.zero_threshold < 0.0 {
            return Err(HymError::new(
                Failure::OptionsValue,
                format!(
                    "zeroThreshold must be a finite non-negative number, got {}",
                    self.zero_threshold
                ),
            ));
        }
        for (key, value) in [
            ("databasePrefix", &self.database_prefix),
            ("reportName", &self.report_name),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(HymError::new(
                    Failure::OptionsValue,
                    format!("{} must be a plain file name, got '{}'", key, value),
                ));
            }
        }
        Ok(())
    }

    pub fn transcribe_options(&self) -> TranscribeOptions {
        TranscribeOptions {
            closure: self.closure,
            axis_average: self.axis_average,
            zero_threshold: self.zero_threshold,
        }
    }
}

pub fn load_conversion_options(path: &Path) -> HymResult<ConversionOptions> {
    let source = fs::read_to_string(path).map_err(|source| {
        HymError::new(
            Failure::OptionsRead,
            format!(
                "options file '{}' could not be read: {}",
                path.display(),
                source
            ),
        )
    })?;
    ConversionOptions::from_json(&source)
}

fn default_zero_threshold() -> f32 {
    ZERO_THRESHOLD
}

fn default_database_prefix() -> String {
    DATABASE_PREFIX.to_string()
}

fn default_report_name() -> String {
    REPORT_NAME.to_string()
}

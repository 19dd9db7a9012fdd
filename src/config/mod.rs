pub mod cli;
pub mod toml_config;

use crate::utils::error::{DidError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use crate::core::estimator::{z_for_confidence_level, DEFAULT_CONFIDENCE_Z};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;

/// Where the estimator's panels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Raw per-observation CSV, summarized before estimation.
    Raw { path: String },
    /// Two pre-built per-region pivot CSVs.
    Pivots { treated: String, untreated: String },
}

impl Validate for InputSource {
    fn validate(&self) -> Result<()> {
        match self {
            InputSource::Raw { path } => {
                validation::validate_path("input.raw_path", path)?;
                validation::validate_file_extension("input.raw_path", path, &["csv"])
            }
            InputSource::Pivots { treated, untreated } => {
                validation::validate_path("input.treated_pivot", treated)?;
                validation::validate_file_extension("input.treated_pivot", treated, &["csv"])?;
                validation::validate_path("input.untreated_pivot", untreated)?;
                validation::validate_file_extension("input.untreated_pivot", untreated, &["csv"])?;
                if treated == untreated {
                    return Err(DidError::ConfigValidationError {
                        field: "input.untreated_pivot".to_string(),
                        message: "treated and untreated pivots must be different files".to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Header names of the raw CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default)]
pub struct ColumnMapping {
    #[cfg_attr(feature = "cli", arg(long = "region-column", default_value = "dma"))]
    pub region: String,

    #[cfg_attr(feature = "cli", arg(long = "date-column", default_value = "date"))]
    pub date: String,

    #[cfg_attr(feature = "cli", arg(long = "revenue-column", default_value = "revenue"))]
    pub revenue: String,

    #[cfg_attr(feature = "cli", arg(long = "period-column", default_value = "treatment_period"))]
    pub period: String,

    #[cfg_attr(feature = "cli", arg(long = "group-column", default_value = "search_stays_on"))]
    pub group: String,

    #[cfg_attr(feature = "cli", arg(long, default_value = "%Y-%m-%d"))]
    pub date_format: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            region: "dma".to_string(),
            date: "date".to_string(),
            revenue: "revenue".to_string(),
            period: "treatment_period".to_string(),
            group: "search_stays_on".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Validate for ColumnMapping {
    fn validate(&self) -> Result<()> {
        validation::validate_distinct_columns(
            "input.columns",
            &[
                self.region.as_str(),
                self.date.as_str(),
                self.revenue.as_str(),
                self.period.as_str(),
                self.group.as_str(),
            ],
        )?;
        validation::validate_non_empty_string("input.columns.date_format", &self.date_format)
    }
}

pub fn flag_from_u8(field: &str, value: u8) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DidError::InvalidConfigValueError {
            field: field.to_string(),
            value: other.to_string(),
            reason: "Flag must be 0 or 1".to_string(),
        }),
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "paidsearch-did")]
#[command(about = "Difference-in-differences estimate of a paid-search shutdown on regional revenue")]
pub struct CliConfig {
    /// Raw observations CSV
    #[arg(long, default_value = "input/PaidSearch.csv")]
    pub input: String,

    /// Start from pivot tables instead of raw data
    #[arg(long, requires = "untreated_pivot")]
    pub treated_pivot: Option<String>,

    #[arg(long, requires = "treated_pivot")]
    pub untreated_pivot: Option<String>,

    #[arg(long, default_value = "output")]
    pub output_path: String,

    #[arg(long, default_value = "temp")]
    pub pivot_dir: String,

    #[arg(long, help = "Do not write the per-region pivot tables")]
    pub no_pivots: bool,

    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_Z, conflicts_with = "confidence_level")]
    pub confidence_z: f64,

    /// Two-sided confidence level, converted to a Normal quantile
    #[arg(long)]
    pub confidence_level: Option<f64>,

    #[arg(long, value_delimiter = ',', default_value = "text,latex,json")]
    pub formats: Vec<String>,

    /// Group flag value marking treated rows (0 = search goes off)
    #[arg(long, default_value_t = 0)]
    pub treated_flag: u8,

    #[arg(long, help = "Write the daily revenue series")]
    pub export_series: bool,

    #[command(flatten)]
    pub columns: ColumnMapping,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log memory and timing per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_source(&self) -> Result<InputSource> {
        match (&self.treated_pivot, &self.untreated_pivot) {
            (Some(treated), Some(untreated)) => Ok(InputSource::Pivots {
                treated: treated.clone(),
                untreated: untreated.clone(),
            }),
            (None, None) => Ok(InputSource::Raw {
                path: self.input.clone(),
            }),
            _ => Err(DidError::ConfigValidationError {
                field: "treated_pivot".to_string(),
                message: "--treated-pivot and --untreated-pivot must be given together"
                    .to_string(),
            }),
        }
    }

    fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    fn treated_group_flag(&self) -> bool {
        self.treated_flag != 0
    }

    fn confidence_z(&self) -> Result<f64> {
        match self.confidence_level {
            Some(level) => z_for_confidence_level(level),
            None => Ok(self.confidence_z),
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn pivot_dir(&self) -> Option<&str> {
        (!self.no_pivots).then_some(self.pivot_dir.as_str())
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn export_series(&self) -> bool {
        self.export_series
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.input_source()?.validate()?;
        self.columns.validate()?;
        validation::validate_path("output_path", &self.output_path)?;
        if !self.no_pivots {
            validation::validate_path("pivot_dir", &self.pivot_dir)?;
        }
        validation::validate_output_formats("formats", &self.formats)?;
        flag_from_u8("treated_flag", self.treated_flag)?;
        validation::validate_range("confidence_z", self.confidence_z()?, 0.0, 10.0)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["paidsearch-did"]);

        assert_eq!(
            config.input_source().unwrap(),
            InputSource::Raw {
                path: "input/PaidSearch.csv".to_string()
            }
        );
        assert_eq!(config.pivot_dir(), Some("temp"));
        assert_eq!(config.confidence_z().unwrap(), 1.96);
        assert!(!config.treated_group_flag());
        assert_eq!(config.columns, ColumnMapping::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_pivot_input_and_confidence_level() {
        let config = CliConfig::parse_from([
            "paidsearch-did",
            "--treated-pivot",
            "temp/treated_pivot.csv",
            "--untreated-pivot",
            "temp/untreated_pivot.csv",
            "--confidence-level",
            "0.9",
            "--no-pivots",
        ]);

        assert!(matches!(config.input_source().unwrap(), InputSource::Pivots { .. }));
        assert!((config.confidence_z().unwrap() - 1.644854).abs() < 1e-5);
        assert_eq!(config.pivot_dir(), None);
    }

    #[test]
    fn test_cli_requires_both_pivots() {
        let result = CliConfig::try_parse_from(["paidsearch-did", "--treated-pivot", "a.csv"]);
        assert!(result.is_err());

        // 繞過 clap 時仍由 input_source 擋下
        let mut config = CliConfig::parse_from(["paidsearch-did"]);
        config.treated_pivot = Some("temp/treated_pivot.csv".to_string());
        assert!(config.input_source().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_rejects_bad_flag_and_format() {
        let config = CliConfig::parse_from(["paidsearch-did", "--treated-flag", "2"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["paidsearch-did", "--formats", "text,pdf"]);
        assert!(config.validate().is_err());
    }
}

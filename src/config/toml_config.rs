use crate::config::{flag_from_u8, ColumnMapping, InputSource};
use crate::core::estimator::{z_for_confidence_level, DEFAULT_CONFIDENCE_Z};
use crate::core::ConfigProvider;
use crate::utils::error::{DidError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub analysis: AnalysisConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub estimation: EstimationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub raw_path: Option<String>,
    pub treated_pivot: Option<String>,
    pub untreated_pivot: Option<String>,
    #[serde(default)]
    pub treated_group_flag: u8,
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimationConfig {
    pub confidence_z: Option<f64>,
    pub confidence_level: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    #[serde(default = "default_true")]
    pub write_pivots: bool,
    #[serde(default = "default_pivot_dir")]
    pub pivot_dir: String,
    #[serde(default)]
    pub export_series: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_formats(),
            write_pivots: true,
            pivot_dir: default_pivot_dir(),
            export_series: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" or "json"
    pub log_format: Option<String>,
}

fn default_output_path() -> String {
    "output".to_string()
}

fn default_formats() -> Vec<String> {
    vec!["text".to_string(), "latex".to_string(), "json".to_string()]
}

fn default_pivot_dir() -> String {
    "temp".to_string()
}

fn default_true() -> bool {
    true
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DidError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DidError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("analysis.name", &self.analysis.name)?;
        self.resolve_input()?.validate()?;
        self.input.columns.validate()?;
        flag_from_u8("input.treated_group_flag", self.input.treated_group_flag)?;

        if self.estimation.confidence_z.is_some() && self.estimation.confidence_level.is_some() {
            return Err(DidError::ConfigValidationError {
                field: "estimation".to_string(),
                message: "set either confidence_z or confidence_level, not both".to_string(),
            });
        }
        validation::validate_range("estimation.confidence_z", self.confidence_z()?, 0.0, 10.0)?;

        validation::validate_path("output.path", &self.output.path)?;
        if self.output.write_pivots {
            validation::validate_path("output.pivot_dir", &self.output.pivot_dir)?;
        }
        validation::validate_output_formats("output.formats", &self.output.formats)?;

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(DidError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 原始資料與樞紐表只能擇一
    pub fn resolve_input(&self) -> Result<InputSource> {
        let input = &self.input;
        match (&input.raw_path, &input.treated_pivot, &input.untreated_pivot) {
            (Some(path), None, None) => Ok(InputSource::Raw { path: path.clone() }),
            (None, Some(treated), Some(untreated)) => Ok(InputSource::Pivots {
                treated: treated.clone(),
                untreated: untreated.clone(),
            }),
            (None, None, None) => Err(DidError::MissingConfigError {
                field: "input.raw_path".to_string(),
            }),
            (Some(_), _, _) => Err(DidError::ConfigValidationError {
                field: "input".to_string(),
                message: "raw_path cannot be combined with pivot inputs".to_string(),
            }),
            (None, _, _) => Err(DidError::ConfigValidationError {
                field: "input".to_string(),
                message: "treated_pivot and untreated_pivot must be given together".to_string(),
            }),
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> &str {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .unwrap_or("compact")
    }
}

impl ConfigProvider for TomlConfig {
    fn input_source(&self) -> Result<InputSource> {
        self.resolve_input()
    }

    fn columns(&self) -> &ColumnMapping {
        &self.input.columns
    }

    fn treated_group_flag(&self) -> bool {
        self.input.treated_group_flag != 0
    }

    fn confidence_z(&self) -> Result<f64> {
        match (self.estimation.confidence_z, self.estimation.confidence_level) {
            (Some(z), _) => Ok(z),
            (None, Some(level)) => z_for_confidence_level(level),
            (None, None) => Ok(DEFAULT_CONFIDENCE_Z),
        }
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn pivot_dir(&self) -> Option<&str> {
        self.output
            .write_pivots
            .then_some(self.output.pivot_dir.as_str())
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn export_series(&self) -> bool {
        self.output.export_series
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

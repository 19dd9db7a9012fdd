use thiserror::Error;

#[derive(Error, Debug)]
pub enum DidError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid input in {group} panel, region '{region}': {reason}")]
    InvalidInput {
        group: String,
        region: String,
        reason: String,
    },

    #[error("Degenerate sample in {group} panel: {regions} region(s), at least 2 are required")]
    DegenerateSample { group: String, regions: usize },

    #[error("Empty panel: {group} panel has no regions")]
    EmptyPanel { group: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, DidError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Estimation,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DidError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DidError::CsvError(_) | DidError::InvalidInput { .. } => ErrorCategory::Data,
            DidError::DegenerateSample { .. }
            | DidError::EmptyPanel { .. }
            | DidError::ProcessingError { .. } => ErrorCategory::Estimation,
            DidError::ConfigValidationError { .. }
            | DidError::InvalidConfigValueError { .. }
            | DidError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DidError::IoError(_) | DidError::SerializationError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data | ErrorCategory::Estimation | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => match self {
                // 檔案暫時被鎖或中斷，可重試
                DidError::IoError(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::Critical,
            },
        }
    }

    /// 針對每種錯誤給出下一步建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            DidError::CsvError(_) => {
                "Check that the input CSV has a header row and the configured column names".to_string()
            }
            DidError::IoError(_) => "Check that the input file exists and the output directory is writable".to_string(),
            DidError::SerializationError(_) => "Report this as a bug; the result could not be serialized".to_string(),
            DidError::InvalidInput { region, .. } => format!(
                "Fix or remove the rows for region '{}' (revenue must be positive, values finite)",
                region
            ),
            DidError::DegenerateSample { group, .. } => format!(
                "Provide at least two regions with both pre- and post-period data in the {} group",
                group
            ),
            DidError::EmptyPanel { group } => format!(
                "No {} regions were found; check the treated group flag and the group column",
                group
            ),
            DidError::ConfigValidationError { field, .. }
            | DidError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration", field)
            }
            DidError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            DidError::ProcessingError { .. } => "Inspect the input data for extreme values".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Data => format!("The input data was rejected: {}", self),
            ErrorCategory::Estimation => format!("The estimate could not be computed: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::Storage => format!("Reading or writing files failed: {}", self),
        }
    }

    /// 以退出碼表達嚴重程度，供 CLI 使用
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimation_errors_are_high_severity() {
        let err = DidError::DegenerateSample {
            group: "treated".to_string(),
            regions: 1,
        };
        assert_eq!(err.category(), ErrorCategory::Estimation);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("treated"));
    }

    #[test]
    fn test_invalid_input_names_group_and_region() {
        let err = DidError::InvalidInput {
            group: "untreated".to_string(),
            region: "501".to_string(),
            reason: "log_revenue_pre is not finite".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("untreated"));
        assert!(message.contains("501"));
        assert!(err.recovery_suggestion().contains("501"));
    }

    #[test]
    fn test_missing_file_is_critical() {
        let err = DidError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.exit_code(), 3);
    }
}

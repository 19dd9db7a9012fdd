use crate::utils::error::{DidError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const SUPPORTED_FORMATS: [&str; 3] = ["text", "latex", "json"];

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 閉區間檢查；NaN 一律視為不合法
pub fn validate_range(field_name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_output_formats(field_name: &str, formats: &[String]) -> Result<()> {
    if formats.is_empty() {
        return Err(DidError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one output format is required".to_string(),
        });
    }

    for format in formats {
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            return Err(DidError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    SUPPORTED_FORMATS.join(", ")
                ),
            });
        }
    }
    Ok(())
}

pub fn validate_distinct_columns(field_name: &str, columns: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        validate_non_empty_string(field_name, column)?;
        if !seen.insert(*column) {
            return Err(DidError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: column.to_string(),
                reason: "Column is mapped more than once".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output.path", "./output").is_ok());
        assert!(validate_path("output.path", "").is_err());
        assert!(validate_path("output.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("input.raw_path", "input/PaidSearch.csv", &["csv"]).is_ok());
        assert!(validate_file_extension("input.raw_path", "input/PaidSearch.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("input.raw_path", "input/PaidSearch.xlsx", &["csv"]).is_err());
        assert!(validate_file_extension("input.raw_path", "input/PaidSearch", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("estimation.confidence_z", 1.96, 0.0, 10.0).is_ok());
        assert!(validate_range("estimation.confidence_z", -1.0, 0.0, 10.0).is_err());
        assert!(validate_range("estimation.confidence_z", f64::NAN, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_validate_output_formats() {
        let formats = vec!["text".to_string(), "latex".to_string()];
        assert!(validate_output_formats("output.formats", &formats).is_ok());
        assert!(validate_output_formats("output.formats", &[]).is_err());
        assert!(validate_output_formats("output.formats", &["pdf".to_string()]).is_err());
    }

    #[test]
    fn test_validate_distinct_columns() {
        assert!(validate_distinct_columns("input.columns", &["dma", "date", "revenue"]).is_ok());
        assert!(validate_distinct_columns("input.columns", &["dma", "dma"]).is_err());
        assert!(validate_distinct_columns("input.columns", &["dma", " "]).is_err());
    }
}

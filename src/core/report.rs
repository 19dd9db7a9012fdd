//! Renders an [`EstimationResult`] for display. Numbers are rounded to four
//! decimals here only; the result itself keeps full precision.

use crate::domain::model::EstimationResult;
use crate::utils::error::{DidError, Result};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Latex,
    Json,
}

impl ReportFormat {
    /// Output file, relative to the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Text => "tables/did_table.txt",
            ReportFormat::Latex => "tables/did_table.tex",
            ReportFormat::Json => "did_result.json",
        }
    }

    pub fn render(&self, result: &EstimationResult) -> Result<String> {
        match self {
            ReportFormat::Text => Ok(render_text(result)),
            ReportFormat::Latex => Ok(render_latex(result)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "latex" => Ok(ReportFormat::Latex),
            "json" => Ok(ReportFormat::Json),
            other => Err(DidError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: "Valid formats: text, latex, json".to_string(),
            }),
        }
    }
}

pub fn render_text(result: &EstimationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8}{:>12}{:>12}{:>12}{:>12}",
        "Scale", "Estimate", "Std. Error", "CI Low", "CI High"
    );
    let _ = writeln!(out, "{}", "-".repeat(56));
    let _ = writeln!(
        out,
        "{:<8}{:>12.4}{:>12.4}{:>12.4}{:>12.4}",
        "Log",
        result.point_estimate,
        result.standard_error,
        result.ci_low,
        result.ci_high
    );
    // level 尺度沒有標準誤
    let _ = writeln!(
        out,
        "{:<8}{:>12.4}{:>12}{:>12.4}{:>12.4}",
        "Level", result.point_estimate_level, "-", result.ci_low_level, result.ci_high_level
    );
    let _ = writeln!(
        out,
        "Regions: {} treated, {} untreated; z = {:.4}",
        result.treated_regions, result.untreated_regions, result.confidence_z
    );
    out
}

pub fn render_latex(result: &EstimationResult) -> String {
    let mut out = String::new();
    out.push_str("\\begin{tabular}{lcccc}\n");
    out.push_str("\\hline\n");
    out.push_str(" & Estimate & Std. Error & CI Low & CI High \\\\\n");
    out.push_str("\\hline\n");
    let _ = writeln!(
        out,
        "Log scale & {:.4} & {:.4} & {:.4} & {:.4} \\\\",
        result.point_estimate, result.standard_error, result.ci_low, result.ci_high
    );
    let _ = writeln!(
        out,
        "Level scale & {:.4} & -- & {:.4} & {:.4} \\\\",
        result.point_estimate_level, result.ci_low_level, result.ci_high_level
    );
    out.push_str("\\hline\n");
    out.push_str("\\end{tabular}\n");
    out
}

/// Console summary, one value per line.
pub fn summary_lines(result: &EstimationResult) -> Vec<String> {
    vec![
        format!("Gamma hat: {:.4}", result.point_estimate),
        format!("Std Error: {:.4}", result.standard_error),
        format!("CI: [{:.4}, {:.4}]", result.ci_low, result.ci_high),
        format!(
            "Level effect: {:.4} [{:.4}, {:.4}]",
            result.point_estimate_level, result.ci_low_level, result.ci_high_level
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EstimationResult {
        let point = 0.15f64;
        let se = (0.01f64 / 3.0).sqrt();
        let (low, high) = (point - 1.96 * se, point + 1.96 * se);
        EstimationResult {
            point_estimate: point,
            standard_error: se,
            ci_low: low,
            ci_high: high,
            point_estimate_level: point.exp(),
            ci_low_level: low.exp(),
            ci_high_level: high.exp(),
            treated_mean_diff: 0.2,
            untreated_mean_diff: 0.05,
            treated_regions: 3,
            untreated_regions: 2,
            confidence_z: 1.96,
        }
    }

    #[test]
    fn test_latex_table_rounds_to_four_decimals() {
        let latex = render_latex(&sample());

        assert!(latex.starts_with("\\begin{tabular}{lcccc}\n"));
        assert!(latex.contains("Log scale & 0.1500 & 0.0577 & 0.0368 & 0.2632 \\\\\n"));
        assert!(latex.contains("Level scale & 1.1618 & -- & 1.0375 & 1.3010 \\\\\n"));
        assert!(latex.ends_with("\\end{tabular}\n"));
    }

    #[test]
    fn test_text_table_has_both_scales() {
        let text = render_text(&sample());
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("Std. Error"));
        assert!(lines[2].starts_with("Log"));
        assert!(lines[2].contains("0.1500"));
        assert!(lines[3].starts_with("Level"));
        assert!(lines[3].contains("1.1618"));
        assert!(!lines[3].contains("0.0577"));
    }

    #[test]
    fn test_json_keeps_full_precision() {
        let result = sample();
        let json = ReportFormat::Json.render(&result).unwrap();
        let parsed: EstimationResult = serde_json::from_str(&json).unwrap();

        assert!((parsed.standard_error - result.standard_error).abs() < 1e-15);
        assert!((parsed.ci_high_level - result.ci_high_level).abs() < 1e-15);
        assert_eq!(parsed.treated_regions, 3);
        assert!(json.contains("\"point_estimate\": 0.15"));
        assert!(!json.contains("standard_error_level"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("LaTeX".parse::<ReportFormat>().unwrap(), ReportFormat::Latex);
        assert_eq!("json".parse::<ReportFormat>().unwrap().file_name(), "did_result.json");
        assert!("pdf".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&sample());
        assert_eq!(lines[0], "Gamma hat: 0.1500");
        assert_eq!(lines[2], "CI: [0.0368, 0.2632]");
    }
}

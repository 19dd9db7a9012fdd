use crate::config::ColumnMapping;
use crate::domain::model::{
    DailyPoint, GroupPanel, Observation, Period, RegionSummary, TreatmentGroup,
};
use crate::utils::error::{DidError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct PivotInputRow {
    #[serde(alias = "dma")]
    region: String,
    log_revenue_pre: Option<f64>,
    log_revenue_post: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PivotOutputRow<'a> {
    region: &'a str,
    log_revenue_pre: f64,
    log_revenue_post: f64,
    log_revenue_diff: f64,
}

struct ColumnIndex {
    region: usize,
    date: usize,
    revenue: usize,
    period: usize,
    group: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, columns: &ColumnMapping) -> Result<Self> {
        let find = |field: &str, name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DidError::ConfigValidationError {
                    field: format!("input.columns.{}", field),
                    message: format!("column '{}' not found in CSV header", name),
                })
        };

        Ok(Self {
            region: find("region", &columns.region)?,
            date: find("date", &columns.date)?,
            revenue: find("revenue", &columns.revenue)?,
            period: find("period", &columns.period)?,
            group: find("group", &columns.group)?,
        })
    }
}

fn row_error(line: u64, region: &str, reason: String) -> DidError {
    DidError::InvalidInput {
        group: "raw".to_string(),
        region: if region.is_empty() {
            format!("<line {}>", line)
        } else {
            region.to_string()
        },
        reason: format!("line {}: {}", line, reason),
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "0" | "0.0" | "false" => Some(false),
        "1" | "1.0" | "true" => Some(true),
        _ => None,
    }
}

/// 只接受設定的格式，不猜測日月順序
pub fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format).ok()
}

/// Reads raw panel rows. Rows whose group flag equals `treated_group_flag`
/// are assigned to the treated arm; a period flag of 1 means post-period.
pub fn parse_observations(
    data: &[u8],
    columns: &ColumnMapping,
    treated_group_flag: bool,
) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    let index = ColumnIndex::resolve(reader.headers()?, columns)?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |i: usize| record.get(i).unwrap_or("");

        let region = field(index.region);
        if region.is_empty() {
            return Err(row_error(line, region, format!("empty '{}'", columns.region)));
        }

        let date = parse_date(field(index.date), &columns.date_format).ok_or_else(|| {
            row_error(line, region, format!("unparseable date '{}'", field(index.date)))
        })?;

        let revenue: f64 = field(index.revenue).parse().map_err(|_| {
            row_error(line, region, format!("unparseable revenue '{}'", field(index.revenue)))
        })?;

        let post = parse_flag(field(index.period)).ok_or_else(|| {
            row_error(line, region, format!("'{}' must be 0 or 1", columns.period))
        })?;
        let group_flag = parse_flag(field(index.group)).ok_or_else(|| {
            row_error(line, region, format!("'{}' must be 0 or 1", columns.group))
        })?;

        observations.push(Observation {
            region_id: region.to_string(),
            date,
            revenue,
            group: if group_flag == treated_group_flag {
                TreatmentGroup::Treated
            } else {
                TreatmentGroup::Untreated
            },
            period: if post { Period::Post } else { Period::Pre },
        });
    }

    Ok(observations)
}

/// Reads a per-region pivot table (`region`/`dma`, `log_revenue_pre`,
/// `log_revenue_post`). Any diff column is ignored and recomputed.
pub fn parse_pivot(data: &[u8], group: TreatmentGroup) -> Result<GroupPanel> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut regions = Vec::new();
    for row in reader.deserialize::<PivotInputRow>() {
        let row = row?;
        let missing = |column: &str| DidError::InvalidInput {
            group: group.to_string(),
            region: row.region.clone(),
            reason: format!("missing {}", column),
        };
        let pre = row.log_revenue_pre.ok_or_else(|| missing("log_revenue_pre"))?;
        let post = row.log_revenue_post.ok_or_else(|| missing("log_revenue_post"))?;
        regions.push(RegionSummary::new(row.region.clone(), pre, post));
    }

    GroupPanel::new(group, regions)
}

pub fn write_pivot(panel: &GroupPanel) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for region in panel.regions() {
        writer.serialize(PivotOutputRow {
            region: &region.region_id,
            log_revenue_pre: region.log_revenue_pre,
            log_revenue_post: region.log_revenue_post,
            log_revenue_diff: region.diff(),
        })?;
    }
    writer.into_inner().map_err(|e| DidError::IoError(e.into_error()))
}

pub fn write_daily_series(points: &[DailyPoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in points {
        writer.serialize(point)?;
    }
    writer.into_inner().map_err(|e| DidError::IoError(e.into_error()))
}

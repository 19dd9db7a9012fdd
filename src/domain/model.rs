use crate::utils::error::{DidError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 實驗組別：treated = 關閉付費搜尋的區域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentGroup {
    Treated,
    Untreated,
}

impl TreatmentGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentGroup::Treated => "treated",
            TreatmentGroup::Untreated => "untreated",
        }
    }
}

impl fmt::Display for TreatmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Pre,
    Post,
}

/// One raw row of the revenue panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub region_id: String,
    pub date: NaiveDate,
    pub revenue: f64,
    pub group: TreatmentGroup,
    pub period: Period,
}

/// Pre/post mean log revenue of a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region_id: String,
    pub log_revenue_pre: f64,
    pub log_revenue_post: f64,
}

impl RegionSummary {
    pub fn new(region_id: impl Into<String>, log_revenue_pre: f64, log_revenue_post: f64) -> Self {
        Self {
            region_id: region_id.into(),
            log_revenue_pre,
            log_revenue_post,
        }
    }

    pub fn diff(&self) -> f64 {
        self.log_revenue_post - self.log_revenue_pre
    }
}

/// All regions of one experimental arm. Region ids are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPanel {
    group: TreatmentGroup,
    regions: Vec<RegionSummary>,
}

impl GroupPanel {
    pub fn new(group: TreatmentGroup, regions: Vec<RegionSummary>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(regions.len());
        for region in &regions {
            if !seen.insert(region.region_id.as_str()) {
                return Err(DidError::InvalidInput {
                    group: group.to_string(),
                    region: region.region_id.clone(),
                    reason: "duplicate region id".to_string(),
                });
            }
        }

        Ok(Self { group, regions })
    }

    pub fn group(&self) -> TreatmentGroup {
        self.group
    }

    pub fn regions(&self) -> &[RegionSummary] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// DID estimate on the log scale plus its exponentiated counterparts.
///
/// There is deliberately no level-scale standard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub point_estimate: f64,
    pub standard_error: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub point_estimate_level: f64,
    pub ci_low_level: f64,
    pub ci_high_level: f64,
    pub treated_mean_diff: f64,
    pub untreated_mean_diff: f64,
    pub treated_regions: usize,
    pub untreated_regions: usize,
    pub confidence_z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRegion {
    pub group: TreatmentGroup,
    pub region_id: String,
    pub missing: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStats {
    pub observations: usize,
    pub treated_regions: usize,
    pub untreated_regions: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub dropped_regions: Vec<DroppedRegion>,
}

impl SampleStats {
    /// Regions seen in the input for one arm, complete or not.
    pub fn observed_regions(&self, group: TreatmentGroup) -> usize {
        let complete = match group {
            TreatmentGroup::Treated => self.treated_regions,
            TreatmentGroup::Untreated => self.untreated_regions,
        };
        complete + self.dropped_regions.iter().filter(|d| d.group == group).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    pub treated: GroupPanel,
    pub untreated: GroupPanel,
    pub stats: SampleStats,
}

/// 每日各組平均營收，對應原始分析的兩張時間序列圖的資料
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub treated_mean_revenue: Option<f64>,
    pub untreated_mean_revenue: Option<f64>,
    pub treated_mean_log_revenue: Option<f64>,
    pub untreated_mean_log_revenue: Option<f64>,
    /// untreated - treated, in logs
    pub log_gap: Option<f64>,
}

/// What the extract step hands to transform.
#[derive(Debug, Clone)]
pub enum ExtractedData {
    Observations(Vec<Observation>),
    Panels {
        treated: GroupPanel,
        untreated: GroupPanel,
    },
}

impl ExtractedData {
    pub fn describe(&self) -> String {
        match self {
            ExtractedData::Observations(rows) => format!("{} raw observations", rows.len()),
            ExtractedData::Panels { treated, untreated } => format!(
                "{} treated and {} untreated pivot rows",
                treated.len(),
                untreated.len()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub estimate: EstimationResult,
    pub treated: GroupPanel,
    pub untreated: GroupPanel,
    pub stats: Option<SampleStats>,
    pub daily_series: Vec<DailyPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_panel_rejects_duplicate_regions() {
        let err = GroupPanel::new(
            TreatmentGroup::Treated,
            vec![
                RegionSummary::new("500", 1.0, 1.1),
                RegionSummary::new("500", 2.0, 2.1),
            ],
        )
        .unwrap_err();

        match err {
            DidError::InvalidInput { group, region, .. } => {
                assert_eq!(group, "treated");
                assert_eq!(region, "500");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_region_diff_is_post_minus_pre() {
        let region = RegionSummary::new("501", 10.0, 10.5);
        assert_eq!(region.diff(), 0.5);
    }

    #[test]
    fn test_group_display() {
        assert_eq!(TreatmentGroup::Treated.to_string(), "treated");
        assert_eq!(TreatmentGroup::Untreated.to_string(), "untreated");
    }
}

use crate::domain::model::{
    DroppedRegion, GroupPanel, Observation, PanelSummary, Period, RegionSummary, SampleStats,
    TreatmentGroup,
};
use crate::utils::error::{DidError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
struct CellMean {
    sum: f64,
    count: usize,
}

impl CellMean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct RegionCells {
    pre: CellMean,
    post: CellMean,
}

impl RegionCells {
    fn cell_mut(&mut self, period: Period) -> &mut CellMean {
        match period {
            Period::Pre => &mut self.pre,
            Period::Post => &mut self.post,
        }
    }
}

/// Revenue must be strictly positive before taking the log.
pub fn ensure_positive_revenue(observation: &Observation) -> Result<()> {
    if observation.revenue.is_finite() && observation.revenue > 0.0 {
        return Ok(());
    }
    Err(DidError::InvalidInput {
        group: observation.group.to_string(),
        region: observation.region_id.clone(),
        reason: format!(
            "revenue must be positive and finite, got {} on {}",
            observation.revenue, observation.date
        ),
    })
}

/// Pivots raw observations into one pre/post mean log-revenue row per region
/// and arm. Regions lacking either period are dropped and reported in the
/// returned [`SampleStats`].
pub fn summarize(observations: &[Observation]) -> Result<PanelSummary> {
    let mut cells: BTreeMap<(TreatmentGroup, &str), RegionCells> = BTreeMap::new();
    let mut first_date: Option<NaiveDate> = None;
    let mut last_date: Option<NaiveDate> = None;

    for observation in observations {
        ensure_positive_revenue(observation)?;

        cells
            .entry((observation.group, observation.region_id.as_str()))
            .or_default()
            .cell_mut(observation.period)
            .add(observation.revenue.ln());

        first_date = Some(first_date.map_or(observation.date, |d| d.min(observation.date)));
        last_date = Some(last_date.map_or(observation.date, |d| d.max(observation.date)));
    }

    let mut treated = Vec::new();
    let mut untreated = Vec::new();
    let mut dropped_regions = Vec::new();

    for ((group, region_id), region_cells) in cells {
        let summary = match (region_cells.pre.mean(), region_cells.post.mean()) {
            (Some(pre), Some(post)) => RegionSummary::new(region_id, pre, post),
            (pre, _) => {
                let missing = if pre.is_none() { Period::Pre } else { Period::Post };
                tracing::warn!(
                    "⚠️ Dropping {} region '{}': no {:?}-period observations",
                    group,
                    region_id,
                    missing
                );
                dropped_regions.push(DroppedRegion {
                    group,
                    region_id: region_id.to_string(),
                    missing,
                });
                continue;
            }
        };

        match group {
            TreatmentGroup::Treated => treated.push(summary),
            TreatmentGroup::Untreated => untreated.push(summary),
        }
    }

    let stats = SampleStats {
        observations: observations.len(),
        treated_regions: treated.len(),
        untreated_regions: untreated.len(),
        first_date,
        last_date,
        dropped_regions,
    };

    tracing::info!(
        "Treated DMAs: {} observed, {} complete",
        stats.observed_regions(TreatmentGroup::Treated),
        stats.treated_regions
    );
    tracing::info!(
        "Untreated DMAs: {} observed, {} complete",
        stats.observed_regions(TreatmentGroup::Untreated),
        stats.untreated_regions
    );
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        tracing::info!("Date range: {} to {}", first, last);
    }

    Ok(PanelSummary {
        treated: GroupPanel::new(TreatmentGroup::Treated, treated)?,
        untreated: GroupPanel::new(TreatmentGroup::Untreated, untreated)?,
        stats,
    })
}

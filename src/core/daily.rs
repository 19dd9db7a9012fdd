use crate::domain::model::{DailyPoint, Observation, TreatmentGroup};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
struct DayTotals {
    revenue: f64,
    log_revenue: f64,
    count: usize,
}

impl DayTotals {
    fn mean_revenue(&self) -> Option<f64> {
        (self.count > 0).then(|| self.revenue / self.count as f64)
    }

    fn mean_log_revenue(&self) -> Option<f64> {
        (self.count > 0).then(|| self.log_revenue / self.count as f64)
    }
}

/// Per-day cross-regional averages for both arms, sorted by date.
///
/// Revenue is assumed positive; run [`crate::core::summarizer::summarize`]
/// first to reject bad rows.
pub fn daily_series(observations: &[Observation]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<chrono::NaiveDate, [DayTotals; 2]> = BTreeMap::new();

    for observation in observations {
        let slot = match observation.group {
            TreatmentGroup::Treated => 0,
            TreatmentGroup::Untreated => 1,
        };
        let totals = &mut days.entry(observation.date).or_default()[slot];
        totals.revenue += observation.revenue;
        totals.log_revenue += observation.revenue.ln();
        totals.count += 1;
    }

    days.into_iter()
        .map(|(date, [treated, untreated])| {
            let treated_log = treated.mean_log_revenue();
            let untreated_log = untreated.mean_log_revenue();
            DailyPoint {
                date,
                treated_mean_revenue: treated.mean_revenue(),
                untreated_mean_revenue: untreated.mean_revenue(),
                treated_mean_log_revenue: treated_log,
                untreated_mean_log_revenue: untreated_log,
                log_gap: untreated_log.zip(treated_log).map(|(u, t)| u - t),
            }
        })
        .collect()
}

use crate::adapters::csv_io;
use crate::config::InputSource;
use crate::core::daily::daily_series;
use crate::core::estimator::estimate;
use crate::core::report::ReportFormat;
use crate::core::summarizer::summarize;
use crate::core::{AnalysisResult, ConfigProvider, ExtractedData, Pipeline, Storage};
use crate::domain::model::{GroupPanel, TreatmentGroup};
use crate::utils::error::Result;
use std::path::Path;

/// 讀取面板資料、估計 DID、輸出報表
pub struct DidPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> DidPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn output_file(&self, name: &str) -> String {
        join_path(self.config.output_path(), name)
    }

    async fn read_pivot(&self, path: &str, group: TreatmentGroup) -> Result<GroupPanel> {
        tracing::debug!("Reading {} pivot from {}", group, path);
        let data = self.storage.read_file(path).await?;
        csv_io::parse_pivot(&data, group)
    }

    async fn write_pivots(&self, dir: &str, result: &AnalysisResult) -> Result<()> {
        for panel in [&result.treated, &result.untreated] {
            let path = join_path(dir, &format!("{}_pivot.csv", panel.group()));
            let data = csv_io::write_pivot(panel)?;
            self.storage.write_file(&path, &data).await?;
            tracing::info!("📄 Wrote {} pivot ({} regions) to {}", panel.group(), panel.len(), path);
        }
        Ok(())
    }
}

fn join_path(dir: &str, name: &str) -> String {
    Path::new(dir).join(name).to_string_lossy().into_owned()
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DidPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedData> {
        match self.config.input_source()? {
            InputSource::Raw { path } => {
                tracing::info!("🚀 Reading raw observations from: {}", path);
                let data = self.storage.read_file(&path).await?;
                let observations = csv_io::parse_observations(
                    &data,
                    self.config.columns(),
                    self.config.treated_group_flag(),
                )?;
                Ok(ExtractedData::Observations(observations))
            }
            InputSource::Pivots { treated, untreated } => {
                tracing::info!("🚀 Reading pivot tables: {} / {}", treated, untreated);
                Ok(ExtractedData::Panels {
                    treated: self.read_pivot(&treated, TreatmentGroup::Treated).await?,
                    untreated: self.read_pivot(&untreated, TreatmentGroup::Untreated).await?,
                })
            }
        }
    }

    async fn transform(&self, data: ExtractedData) -> Result<AnalysisResult> {
        let confidence_z = self.config.confidence_z()?;

        let (treated, untreated, stats, series) = match data {
            ExtractedData::Observations(observations) => {
                let summary = summarize(&observations)?;
                let series = if self.config.export_series() {
                    daily_series(&observations)
                } else {
                    Vec::new()
                };
                (summary.treated, summary.untreated, Some(summary.stats), series)
            }
            ExtractedData::Panels { treated, untreated } => (treated, untreated, None, Vec::new()),
        };

        let estimate = estimate(&treated, &untreated, confidence_z)?;
        tracing::info!(
            "📈 DID estimate {:.4} (se {:.4}, CI [{:.4}, {:.4}], z = {})",
            estimate.point_estimate,
            estimate.standard_error,
            estimate.ci_low,
            estimate.ci_high,
            confidence_z
        );
        tracing::debug!(
            "Mean pre-to-post change: treated {:.6}, untreated {:.6}",
            estimate.treated_mean_diff,
            estimate.untreated_mean_diff
        );

        Ok(AnalysisResult {
            estimate,
            treated,
            untreated,
            stats,
            daily_series: series,
        })
    }

    async fn load(&self, result: &AnalysisResult) -> Result<String> {
        for name in self.config.output_formats() {
            let format: ReportFormat = name.parse()?;
            let path = self.output_file(format.file_name());
            let rendered = format.render(&result.estimate)?;
            self.storage.write_file(&path, rendered.as_bytes()).await?;
            tracing::debug!("Wrote {:?} report to {}", format, path);
        }

        // 樞紐表只在由原始資料彙總時輸出
        if let (Some(dir), Some(_)) = (self.config.pivot_dir(), &result.stats) {
            self.write_pivots(dir, result).await?;
        }

        if !result.daily_series.is_empty() {
            let path = self.output_file("figures/daily_series.csv");
            let data = csv_io::write_daily_series(&result.daily_series)?;
            self.storage.write_file(&path, &data).await?;
            tracing::info!("📄 Wrote {} daily points to {}", result.daily_series.len(), path);
        }

        Ok(self.config.output_path().to_string())
    }
}

use crate::core::Pipeline;
use crate::domain::model::EstimationResult;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub estimate: EstimationResult,
}

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting DID analysis...");

        tracing::info!("Extracting data...");
        let data = self.pipeline.extract().await?;
        tracing::info!("Extracted {}", data.describe());
        self.monitor.log_phase("extract");

        tracing::info!("Estimating...");
        let result = self.pipeline.transform(data).await?;
        tracing::info!(
            "Estimated from {} treated and {} untreated regions",
            result.estimate.treated_regions,
            result.estimate.untreated_regions
        );
        self.monitor.log_phase("transform");

        tracing::info!("Writing reports...");
        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(RunOutcome {
            output_path,
            estimate: result.estimate,
        })
    }
}

use crate::config::{ColumnMapping, InputSource};
use crate::domain::model::{AnalysisResult, ExtractedData};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_source(&self) -> Result<InputSource>;
    fn columns(&self) -> &ColumnMapping;
    /// Value of the group flag column that marks a treated row.
    fn treated_group_flag(&self) -> bool;
    fn confidence_z(&self) -> Result<f64>;
    fn output_path(&self) -> &str;
    /// `None` disables pivot export.
    fn pivot_dir(&self) -> Option<&str>;
    fn output_formats(&self) -> &[String];
    fn export_series(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedData>;
    async fn transform(&self, data: ExtractedData) -> Result<AnalysisResult>;
    async fn load(&self, result: &AnalysisResult) -> Result<String>;
}

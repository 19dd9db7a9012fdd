pub mod daily;
pub mod engine;
pub mod estimator;
pub mod pipeline;
pub mod report;
pub mod summarizer;

pub use crate::domain::model::{AnalysisResult, ExtractedData};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

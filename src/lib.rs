pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig, ColumnMapping, InputSource};
pub use crate::core::{
    engine::{AnalysisEngine, RunOutcome},
    estimator::{estimate, estimate_default, DEFAULT_CONFIDENCE_Z},
    pipeline::DidPipeline,
};
pub use crate::domain::model::{EstimationResult, GroupPanel, RegionSummary, TreatmentGroup};
pub use crate::utils::error::{DidError, Result};

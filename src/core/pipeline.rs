pub use crate::app::pipelines::did_pipeline::DidPipeline;

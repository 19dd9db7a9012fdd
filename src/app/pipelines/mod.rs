pub mod did_pipeline;

// Adapters layer: tabular formats at the edge of the pipeline.

pub mod csv_io;

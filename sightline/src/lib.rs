// THEORY:
// This file is the entry point for the `sightline` library crate. It exposes the
// two pipelines (`VisibilityPipeline` on the calling thread, `ParallelPipeline`
// on tokio's blocking pool), their shared `PipelineConfig`, and the `io` helpers
// that turn a map image into a grid and a finished table into JSON. The grid,
// oracle, partitioner, engine and table live under `core_modules`.

pub mod core_modules;
pub mod error;
pub mod io;
pub mod parallel_pipeline;
pub mod pipeline;

pub use error::{Result, VisibilityError};

// THEORY:
// The `pipeline` module is the synchronous front door of the engine. It owns the
// configuration shared by both pipelines and runs the whole computation on the
// calling thread: partition, compute each chunk in turn, merge. This goes
// through the same chunk and merge path as the parallel pipeline, so its output
// can be compared with the parallel one directly.

use crate::core_modules::engine::compute_chunk;
use crate::core_modules::occupancy_grid::OccupancyGrid;
use crate::core_modules::partitioner::partition;
use crate::error::Result;
use log::{info, warn};
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::occupancy_grid::{Coordinate, FreeColor};
pub use crate::core_modules::visibility_table::VisibilityTable;

/// Worker count used when the requested one is out of range.
pub const DEFAULT_WORKERS: usize = 4;
/// Largest worker count accepted by default.
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Configuration shared by `VisibilityPipeline` and `ParallelPipeline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Requested worker count. Values `<= 0` or above `max_workers` fall back to `DEFAULT_WORKERS`.
    pub workers: i64,
    /// Upper bound on accepted worker counts.
    pub max_workers: usize,
    /// Pixel classification used when a grid is built from an image.
    pub free_color: FreeColor,
    /// Emit the `"blocked"` and `"all"` summary keys next to the table.
    pub include_summary: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().min(DEFAULT_MAX_WORKERS) as i64,
            max_workers: DEFAULT_MAX_WORKERS,
            free_color: FreeColor::default(),
            include_summary: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(workers: i64) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// The worker count actually used. Never zero, never above `max_workers`.
    pub fn resolved_workers(&self) -> usize {
        let max = self.max_workers.max(1);
        if self.workers >= 1 && self.workers as u64 <= max as u64 {
            return self.workers as usize;
        }
        let fallback = DEFAULT_WORKERS.min(max);
        warn!(
            "worker count {} outside 1..={}, using {}",
            self.workers, max, fallback
        );
        fallback
    }
}

/// Runs the whole visibility computation on the calling thread.
pub struct VisibilityPipeline {
    config: PipelineConfig,
}

impl VisibilityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generate_table(&self, grid: &OccupancyGrid) -> Result<VisibilityTable> {
        let started = Instant::now();
        let chunks = partition(grid.len(), self.config.resolved_workers());

        let mut table = VisibilityTable::new();
        for chunk in chunks {
            table.merge(compute_chunk(grid, chunk)?)?;
        }

        info!(
            "{}x{} grid: {} sources, {} visible pairs in {:.3}s (sequential)",
            grid.width(),
            grid.height(),
            table.len(),
            table.pair_count(),
            started.elapsed().as_secs_f64()
        );
        Ok(table)
    }
}

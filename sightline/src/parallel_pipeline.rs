// THEORY:
// The parallel pipeline runs one blocking task per work chunk. The line walks
// are pure CPU work and never yield, so every worker is started with
// `spawn_blocking` and gets an OS thread from tokio's blocking pool. The
// workers are spawned fresh for each grid and all joined before the call
// returns.
//
// Each task owns its `WorkChunk` and a clone of the grid `Arc`, and returns a
// local `VisibilityTable`. The grid is never written, so it is read from every
// thread without a lock. After every handle has resolved, the local tables are
// merged in worker order. If any worker errored or panicked, the whole grid
// fails: a partial table is never returned.

use crate::core_modules::engine::compute_chunk;
use crate::core_modules::occupancy_grid::OccupancyGrid;
use crate::core_modules::partitioner::partition;
use crate::core_modules::visibility_table::VisibilityTable;
use crate::error::{Result, VisibilityError};
use crate::pipeline::PipelineConfig;
use futures::future::join_all;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;

/// Merges joined worker results in worker order. The first failed, panicked or
/// overlapping worker fails the whole grid.
fn merge_joined(
    results: Vec<std::result::Result<Result<VisibilityTable>, JoinError>>,
) -> Result<VisibilityTable> {
    let mut table = VisibilityTable::new();
    for (worker, joined) in results.into_iter().enumerate() {
        let local = match joined {
            Ok(local) => local?,
            Err(join_error) => {
                return Err(VisibilityError::WorkerFailed {
                    worker,
                    reason: join_error.to_string(),
                });
            }
        };
        table.merge(local)?;
    }
    Ok(table)
}

pub struct ParallelPipeline {
    config: PipelineConfig,
}

impl ParallelPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Computes the full table with `config.resolved_workers()` blocking tasks.
    pub async fn generate_table(&self, grid: Arc<OccupancyGrid>) -> Result<VisibilityTable> {
        let started = Instant::now();
        let workers = self.config.resolved_workers();
        let chunks = partition(grid.len(), workers);

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                debug!(
                    "spawning worker {} for sources {}..{}",
                    chunk.worker, chunk.start, chunk.end
                );
                let grid = Arc::clone(&grid);
                tokio::task::spawn_blocking(move || compute_chunk(&grid, chunk))
            })
            .collect();

        let table = merge_joined(join_all(handles).await)?;

        info!(
            "{}x{} grid: {} sources, {} visible pairs in {:.3}s ({} workers)",
            grid.width(),
            grid.height(),
            table.len(),
            table.pair_count(),
            started.elapsed().as_secs_f64(),
            workers
        );
        Ok(table)
    }
}

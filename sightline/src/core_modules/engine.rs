// THEORY:
// The engine is the per-worker loop. For each source index in its chunk it
// asks the oracle about every cell on the grid and keeps the ones that come
// back visible. Targets are scanned column by column (x ascending, then y
// ascending inside each column), which fixes the order of every visible list.
//
// Each source is computed on its own. Visibility is symmetric, but an entry is
// never filled in from the mirror of an earlier one, so a chunk's output depends
// only on the grid and the chunk. The source itself is checked like any other
// target, so an open source always lists itself.
//
// A blocked source cannot see anything, since the oracle tests both endpoints.
// Such sources still get an entry, but it is written empty without walking any
// lines.

use crate::core_modules::line_of_sight::line_of_sight::can_see_between;
use crate::core_modules::occupancy_grid::{Coordinate, OccupancyGrid};
use crate::core_modules::partitioner::WorkChunk;
use crate::core_modules::visibility_table::VisibilityTable;
use crate::error::{Result, VisibilityError};
use log::debug;

/// Every cell visible from `source`, in column scan order.
pub fn visible_from(grid: &OccupancyGrid, source: Coordinate) -> Vec<Coordinate> {
    if !grid.is_open(source.x, source.y) {
        return Vec::new();
    }

    let mut visible = Vec::new();
    for x in 0..grid.width() as i32 {
        for y in 0..grid.height() as i32 {
            let target = Coordinate::new(x, y);
            if can_see_between(grid, source, target) {
                visible.push(target);
            }
        }
    }
    visible
}

/// Builds the local table for one worker's chunk.
pub fn compute_chunk(grid: &OccupancyGrid, chunk: WorkChunk) -> Result<VisibilityTable> {
    if chunk.start > chunk.end || chunk.end > grid.len() {
        return Err(VisibilityError::ChunkOutOfBounds {
            start: chunk.start,
            end: chunk.end,
            len: grid.len(),
        });
    }

    let mut table = VisibilityTable::new();
    for index in chunk.range() {
        let source = grid.coordinate_of(index).ok_or(VisibilityError::ChunkOutOfBounds {
            start: chunk.start,
            end: chunk.end,
            len: grid.len(),
        })?;
        table.insert(source, visible_from(grid, source))?;
    }

    debug!(
        "worker {} finished sources {}..{} ({} visible pairs)",
        chunk.worker,
        chunk.start,
        chunk.end,
        table.pair_count()
    );
    Ok(table)
}

// THEORY:
// The partitioner divides the linear index space `[0, width * height)` into one
// contiguous `WorkChunk` per worker. Every worker but the last gets exactly
// `total / workers` indices; the last one absorbs the remainder. The split is by
// count, not by cost, so a worker whose chunk covers a wide open hall does more
// line walks than one covering solid rock.
//
// Disjointness matters more than balance: each source cell must be owned by
// exactly one worker, because the merge step treats a repeated key as a broken
// partition.

use std::ops::Range;

/// A contiguous range of source indices owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkChunk {
    /// The worker that owns this chunk.
    pub worker: usize,
    /// First source index, inclusive.
    pub start: usize,
    /// One past the last source index.
    pub end: usize,
}

impl WorkChunk {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `total` indices into `workers` contiguous chunks that cover `[0, total)`.
/// A worker count of zero is treated as one.
pub fn partition(total: usize, workers: usize) -> Vec<WorkChunk> {
    let workers = workers.max(1);
    let chunk_size = total / workers;

    (0..workers)
        .map(|worker| {
            let start = worker * chunk_size;
            let end = if worker == workers - 1 {
                total
            } else {
                (worker + 1) * chunk_size
            };
            WorkChunk { worker, start, end }
        })
        .collect()
}

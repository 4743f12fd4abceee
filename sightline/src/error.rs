// THEORY:
// Every failure the engine can produce lives in one enum. The variants fall into
// three families, and callers branch on the family rather than the variant:
// - input errors (bad dimensions, bad buffers, undecodable images) end the work
//   for one image only;
// - invariant violations (a key written twice, a chunk outside the grid, a
//   worker that died) mean the partition is broken and must stop everything;
// - output errors (I/O and serialization) are reported while the computed
//   table stays with the caller.

use crate::core_modules::occupancy_grid::Coordinate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisibilityError {
    #[error("Grid has no cells ({width}x{height})")]
    EmptyGrid { width: u32, height: u32 },

    #[error("Grid {width}x{height} does not fit the coordinate range")]
    GridTooLarge { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Visibility entry for {0} written twice")]
    DuplicateKey(Coordinate),

    #[error("Work chunk {start}..{end} exceeds grid of {len} cells")]
    ChunkOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },

    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisibilityError {
    /// True when the error means the partition or merge invariants are broken.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            VisibilityError::DuplicateKey(_)
                | VisibilityError::ChunkOutOfBounds { .. }
                | VisibilityError::WorkerFailed { .. }
        )
    }

    /// True when the error was raised before the engine ran, because of the input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VisibilityError::EmptyGrid { .. }
                | VisibilityError::GridTooLarge { .. }
                | VisibilityError::BufferSize { .. }
                | VisibilityError::Image(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VisibilityError>;

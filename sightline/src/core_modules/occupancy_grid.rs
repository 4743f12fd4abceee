// THEORY:
// The `OccupancyGrid` is the map every other module reads. It is built once per
// image by classifying each RGBA pixel as open or blocked, after which the pixel
// buffer can be dropped. Cells live in one flat buffer with stride `width`
// (index = y * width + x), so a lookup is a bounds check plus one load.
//
// The grid is immutable after construction. Workers share it through an `Arc`
// without any locking. Reads outside `[0, width) x [0, height)` never touch the
// buffer: `cell` answers `None` and `is_open` answers `false`.

use crate::error::{Result, VisibilityError};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::cmp::Ordering;
use std::fmt;

const CHANNELS: usize = 4;

/// A cell position on the grid. Ordered by linear index (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Serialized as a two-element `[x, y]` array.
impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.x)?;
        pair.serialize_element(&self.y)?;
        pair.end()
    }
}

/// Decides which pixel colors count as open floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreeColor {
    /// Open iff red, green and blue are all 255. Alpha is ignored.
    #[default]
    ExactWhite,
    /// Open iff the Rec. 601 luma of the RGB channels is at least the threshold.
    LumaAtLeast(u8),
}

impl FreeColor {
    pub fn is_free(&self, red: u8, green: u8, blue: u8) -> bool {
        match *self {
            FreeColor::ExactWhite => red == 255 && green == 255 && blue == 255,
            FreeColor::LumaAtLeast(threshold) => {
                let luma = (299 * red as u32 + 587 * green as u32 + 114 * blue as u32) / 1000;
                luma >= threshold as u32
            }
        }
    }
}

/// Immutable open/blocked raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    /// The width of the grid in cells.
    width: u32,
    /// The height of the grid in cells.
    height: u32,
    /// Row-major cell flags, `true` for open.
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Classifies an RGBA8 buffer (4 bytes per pixel, row-major) into a grid.
    pub fn from_rgba(width: u32, height: u32, buffer: &[u8], free_color: FreeColor) -> Result<Self> {
        let len = Self::checked_len(width, height)?;
        let expected = len * CHANNELS;
        if buffer.len() != expected {
            return Err(VisibilityError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }

        let cells = buffer
            .chunks_exact(CHANNELS)
            .map(|px| free_color.is_free(px[0], px[1], px[2]))
            .collect();

        Ok(Self { width, height, cells })
    }

    /// Builds a grid from already-classified cells in row-major order.
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Result<Self> {
        let len = Self::checked_len(width, height)?;
        if cells.len() != len {
            return Err(VisibilityError::BufferSize {
                expected: len,
                actual: cells.len(),
            });
        }
        Ok(Self { width, height, cells })
    }

    fn checked_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(VisibilityError::EmptyGrid { width, height });
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(VisibilityError::GridTooLarge { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .ok_or(VisibilityError::GridTooLarge { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells, `width * height`.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `Some(open)` for in-bounds cells, `None` otherwise.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<bool> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width as usize + x as usize])
    }

    /// Out-of-bounds cells are never open.
    #[inline]
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).unwrap_or(false)
    }

    pub fn coordinate_of(&self, index: usize) -> Option<Coordinate> {
        if index >= self.cells.len() {
            return None;
        }
        let width = self.width as usize;
        Some(Coordinate::new((index % width) as i32, (index / width) as i32))
    }

    pub fn index_of(&self, coordinate: Coordinate) -> Option<usize> {
        self.cell(coordinate.x, coordinate.y)?;
        Some(coordinate.y as usize * self.width as usize + coordinate.x as usize)
    }

    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|open| **open).count()
    }

    /// All coordinates in linear-index order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        let width = self.width as usize;
        (0..self.cells.len()).map(move |i| Coordinate::new((i % width) as i32, (i / width) as i32))
    }

    /// Blocked coordinates in linear-index order.
    pub fn blocked(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.coordinates().filter(|c| !self.is_open(c.x, c.y))
    }
}

// THEORY:
// The `io` module sits at the edges of the engine. On the input side it decodes
// a map image, classifies its pixels into an `OccupancyGrid` and drops the
// decoded pixels. On the output side it names the artifact for an input and
// streams the table to disk as JSON. Nothing here touches the line walks.

use crate::core_modules::occupancy_grid::{Coordinate, FreeColor, OccupancyGrid};
use crate::core_modules::visibility_table::VisibilityTable;
use crate::error::Result;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const OUTPUT_EXTENSION: &str = "json";

/// Decodes the image at `path` and classifies it into a grid.
pub fn load_grid(path: &Path, free_color: FreeColor) -> Result<OccupancyGrid> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!("decoded {} ({}x{})", path.display(), width, height);
    OccupancyGrid::from_rgba(width, height, rgba.as_raw(), free_color)
}

/// The output path for `input`: same stem, `.json` extension, placed in `out_dir`
/// when given and next to the input otherwise.
pub fn output_path_for(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let renamed = input.with_extension(OUTPUT_EXTENSION);
    match (out_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}

/// The on-disk document: the table, optionally followed by the summary keys.
struct TableDocument<'a> {
    table: &'a VisibilityTable,
    summary: Option<&'a OccupancyGrid>,
}

impl Serialize for TableDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = if self.summary.is_some() { 2 } else { 0 };
        let mut map = serializer.serialize_map(Some(self.table.len() + extra))?;
        self.table.serialize_entries(&mut map)?;
        if let Some(grid) = self.summary {
            let blocked: Vec<Coordinate> = grid.blocked().collect();
            let all: Vec<Coordinate> = grid.coordinates().collect();
            map.serialize_entry("blocked", &blocked)?;
            map.serialize_entry("all", &all)?;
        }
        map.end()
    }
}

/// Writes `table` to `path` as JSON. With `summary`, adds the `"blocked"` and
/// `"all"` coordinate lists of that grid.
pub fn write_table(path: &Path, table: &VisibilityTable, summary: Option<&OccupancyGrid>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &TableDocument { table, summary })?;
    writer.flush()?;
    Ok(())
}

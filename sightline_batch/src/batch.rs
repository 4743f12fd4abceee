// THEORY:
// The batch driver walks a list of map images and produces one visibility table
// per image. Every image gets a fresh grid and a fresh set of workers; nothing
// carries over between images.
//
// Failures are sorted by family. An image that cannot be decoded is skipped. A
// table that cannot be written is kept in the outcome and the batch moves on.
// A broken partition (duplicate key, chunk outside the grid, dead worker)
// stops the batch at once.

use log::{error, info, warn};
use sightline::io::{load_grid, output_path_for, write_table};
use sightline::parallel_pipeline::ParallelPipeline;
use sightline::pipeline::VisibilityTable;
use sightline::{Result, VisibilityError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INPUT_EXTENSION: &str = "png";

/// What happened to one input image.
#[derive(Debug)]
pub enum ImageOutcome {
    Written {
        input: PathBuf,
        output: PathBuf,
        entries: usize,
    },
    /// The image could not be turned into a grid; the engine never ran.
    Skipped { input: PathBuf, error: VisibilityError },
    /// The table was computed but could not be persisted.
    Unwritten {
        input: PathBuf,
        output: PathBuf,
        table: VisibilityTable,
        error: VisibilityError,
    },
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ImageOutcome>,
}

impl BatchSummary {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ImageOutcome::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Expands the given paths into input images. Files are taken as given;
/// directories contribute their `.png` files (one level deep, sorted by name).
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }
        match fs::read_dir(path) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && has_input_extension(p))
                    .collect();
                found.sort();
                inputs.extend(found);
            }
            Err(e) => warn!("cannot read directory {}: {}", path.display(), e),
        }
    }
    inputs
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(INPUT_EXTENSION))
}

/// Processes one image. Only invariant violations come back as `Err`.
pub async fn process_image(
    pipeline: &ParallelPipeline,
    input: &Path,
    out_dir: Option<&Path>,
) -> Result<ImageOutcome> {
    let config = pipeline.config();
    let grid = match load_grid(input, config.free_color) {
        Ok(grid) => Arc::new(grid),
        Err(error) => {
            return Ok(ImageOutcome::Skipped {
                input: input.to_path_buf(),
                error,
            });
        }
    };
    info!(
        "processing {} ({}x{}, {} open cells)",
        input.display(),
        grid.width(),
        grid.height(),
        grid.open_count()
    );

    let table = pipeline.generate_table(Arc::clone(&grid)).await?;

    let output = output_path_for(input, out_dir);
    let summary = config.include_summary.then_some(grid.as_ref());
    match write_table(&output, &table, summary) {
        Ok(()) => Ok(ImageOutcome::Written {
            input: input.to_path_buf(),
            output,
            entries: table.len(),
        }),
        Err(error) => Ok(ImageOutcome::Unwritten {
            input: input.to_path_buf(),
            output,
            table,
            error,
        }),
    }
}

/// Runs every input in order. Stops early only on an invariant violation.
pub async fn run_batch(
    pipeline: &ParallelPipeline,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for input in inputs {
        let outcome = match process_image(pipeline, input, out_dir).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("aborting batch at {}: {}", input.display(), e);
                return Err(e);
            }
        };
        match &outcome {
            ImageOutcome::Written { output, entries, .. } => {
                info!("wrote {} ({} entries)", output.display(), entries)
            }
            ImageOutcome::Skipped { input, error } => {
                warn!("skipping {}: {}", input.display(), error)
            }
            ImageOutcome::Unwritten { output, error, .. } => {
                error!("could not write {}: {}", output.display(), error)
            }
        }
        summary.outcomes.push(outcome);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use sightline::pipeline::PipelineConfig;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn save_map(dir: &Path, name: &str, width: u32, height: u32, walls: &[(u32, u32)]) -> PathBuf {
        let mut img = RgbaImage::from_pixel(width, height, WHITE);
        for &(x, y) in walls {
            img.put_pixel(x, y, BLACK);
        }
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn directories_expand_to_sorted_pngs() {
        let dir = tempfile::tempdir().unwrap();
        save_map(dir.path(), "b.png", 1, 1, &[]);
        save_map(dir.path(), "a.png", 1, 1, &[]);
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]);
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writes_one_table_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = save_map(dir.path(), "strip.png", 3, 1, &[(1, 0)]);
        let pipeline = ParallelPipeline::new(PipelineConfig::with_workers(2));

        let summary = run_batch(&pipeline, &[input], None).await.unwrap();
        assert_eq!(summary.written(), 1);

        let json = read_json(&dir.path().join("strip.json"));
        assert_eq!(json["(0, 0)"], serde_json::json!([[0, 0]]));
        assert_eq!(json["(2, 0)"], serde_json::json!([[2, 0]]));
        assert_eq!(json["(1, 0)"], serde_json::json!([]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn continues_past_undecodable_input() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.png");
        fs::write(&broken, b"not an image").unwrap();
        let good = save_map(dir.path(), "room.png", 2, 2, &[]);
        let out = tempfile::tempdir().unwrap();
        let pipeline = ParallelPipeline::new(PipelineConfig::with_workers(4));

        let summary = run_batch(&pipeline, &[broken, good], Some(out.path()))
            .await
            .unwrap();

        assert_eq!(summary.written(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(matches!(summary.outcomes[0], ImageOutcome::Skipped { .. }));

        let json = read_json(&out.path().join("room.json"));
        assert_eq!(json["(1, 1)"].as_array().unwrap().len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unwritable_output_keeps_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let input = save_map(dir.path(), "room.png", 2, 1, &[]);
        let missing = dir.path().join("no_such_dir");
        let pipeline = ParallelPipeline::new(PipelineConfig::with_workers(1));

        let outcome = process_image(&pipeline, &input, Some(&missing)).await.unwrap();
        match outcome {
            ImageOutcome::Unwritten { table, error, .. } => {
                assert_eq!(table.len(), 2);
                assert_eq!(table.pair_count(), 4);
                assert!(matches!(error, VisibilityError::Io(_)));
            }
            other => panic!("expected an unwritten outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn summary_keys_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let input = save_map(dir.path(), "room.png", 2, 1, &[(0, 0)]);
        let config = PipelineConfig {
            include_summary: true,
            ..PipelineConfig::with_workers(1)
        };

        process_image(&ParallelPipeline::new(config), &input, None)
            .await
            .unwrap();
        let json = read_json(&dir.path().join("room.json"));
        assert_eq!(json["blocked"], serde_json::json!([[0, 0]]));
        assert_eq!(json["all"], serde_json::json!([[0, 0], [1, 0]]));
    }
}

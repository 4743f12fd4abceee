// Single-image runner: one map image in, one visibility table out.
// For whole directories use the `sightline_batch` driver.

use anyhow::{Context, bail};
use sightline::io::{load_grid, output_path_for, write_table};
use sightline::parallel_pipeline::ParallelPipeline;
use sightline::pipeline::PipelineConfig;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Usage: sightline <input.png> [output.json] [workers]";

/// Reads `<input> [output.json] [workers]`. The optional arguments may come in
/// either order; anything that is neither a `.json` path nor an integer is
/// rejected.
fn parse_args(args: &[String]) -> anyhow::Result<(PathBuf, PathBuf, Option<i64>)> {
    let Some(input) = args.get(1).map(PathBuf::from) else {
        bail!("{USAGE}");
    };
    let mut output = None;
    let mut workers = None;
    for arg in args.iter().skip(2) {
        if arg.ends_with(".json") && output.is_none() {
            output = Some(PathBuf::from(arg));
        } else if let (Ok(n), None) = (arg.parse::<i64>(), workers) {
            workers = Some(n);
        } else {
            bail!("unexpected argument '{arg}'\n{USAGE}");
        }
    }
    let output = output.unwrap_or_else(|| output_path_for(&input, None));
    Ok((input, output, workers))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("{USAGE}");
        return Ok(());
    }
    let (input, output, workers) = parse_args(&args)?;
    let mut config = PipelineConfig::default();
    if let Some(workers) = workers {
        config.workers = workers;
    }

    if !input.exists() {
        bail!("image file '{}' not found", input.display());
    }

    // --- 2. Grid Construction ---
    let grid = load_grid(&input, config.free_color)
        .with_context(|| format!("loading '{}'", input.display()))?;

    // --- 3. Visibility Computation ---
    let pipeline = ParallelPipeline::new(config);
    let grid = Arc::new(grid);
    let table = pipeline.generate_table(Arc::clone(&grid)).await?;

    // --- 4. Output ---
    let summary = pipeline.config().include_summary.then_some(grid.as_ref());
    write_table(&output, &table, summary)
        .with_context(|| format!("writing '{}'", output.display()))?;

    println!("Saved visibility data to '{}'", output.display());
    Ok(())
}

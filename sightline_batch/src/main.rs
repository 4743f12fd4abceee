use anyhow::bail;
use clap::Parser;
use log::info;
use sightline::parallel_pipeline::ParallelPipeline;
use sightline::pipeline::{DEFAULT_MAX_WORKERS, FreeColor, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod batch;

/// Computes one all-pairs visibility table per map image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map images, or directories holding `.png` maps
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the JSON tables (defaults to next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Worker threads per image; out-of-range values fall back to 4
    #[arg(short, long, env = "SIGHTLINE_WORKERS", allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Largest accepted worker count
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Treat pixels with luma >= this value as open, instead of exact white only
    #[arg(long)]
    luma_threshold: Option<u8>,

    /// Also write "blocked" and "all" coordinate lists
    #[arg(long)]
    summary: bool,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            max_workers: self.max_workers,
            free_color: self
                .luma_threshold
                .map_or(FreeColor::ExactWhite, FreeColor::LumaAtLeast),
            include_summary: self.summary,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Some(dir) = &args.out_dir {
        if !dir.is_dir() {
            bail!("output directory '{}' does not exist", dir.display());
        }
    }

    let inputs = batch::collect_inputs(&args.inputs);
    if inputs.is_empty() {
        bail!("no input images found");
    }

    let pipeline = ParallelPipeline::new(args.pipeline_config());
    info!(
        "{} images, {} workers each",
        inputs.len(),
        pipeline.config().resolved_workers()
    );

    let summary = batch::run_batch(&pipeline, &inputs, args.out_dir.as_deref()).await?;
    info!("{} written, {} failed", summary.written(), summary.failed());

    Ok(if summary.failed() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

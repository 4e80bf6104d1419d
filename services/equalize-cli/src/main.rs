//! Histogram equalization command-line tool.
//!
//! Runs the equalization pipeline over image files on disk:
//! - Accepts any mix of files and directories (walked recursively)
//! - Keeps alpha when the source has it
//! - Writes `<stem>_equalized.png` next to the input or into `--output-dir`
//! - Optionally writes a JSON report with per-frame timings and channel stats

mod config;
mod files;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use equalizer::{
    AccumulationStrategy, EqualizationPipeline, FrameControl, FrameReport, MappingMode, Rounding,
};
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "equalize-cli")]
#[command(about = "Per-channel histogram equalization for image files")]
struct Args {
    /// Image files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for equalized outputs (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pipeline configuration file (YAML)
    #[arg(long, env = "EQUALIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Size of a dedicated worker pool (default: one per core)
    #[arg(long, env = "EQUALIZE_WORKERS")]
    workers: Option<usize>,

    /// Histogram accumulation strategy: atomic, local_merge, sequential
    #[arg(long)]
    strategy: Option<AccumulationStrategy>,

    /// Rows handed to each accumulation task
    #[arg(long)]
    rows_per_task: Option<usize>,

    /// Mapping formula: normalized, cumulative
    #[arg(long)]
    mapping: Option<MappingMode>,

    /// Rounding for the normalized mapping: half_up, half_even
    #[arg(long)]
    rounding: Option<Rounding>,

    /// Cross-check every histogram against a sequential count
    #[arg(long)]
    verify: bool,

    /// Per-image time limit in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Write a JSON report of every processed file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

/// One line of the run report.
#[derive(Debug, Serialize)]
struct FileOutcome {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<FrameReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    processed: usize,
    failed: usize,
    elapsed_ms: u64,
    files: Vec<FileOutcome>,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let overrides = config::Overrides {
        workers: args.workers,
        strategy: args.strategy,
        rows_per_task: args.rows_per_task,
        mapping: args.mapping,
        rounding: args.rounding,
        verify: args.verify,
    };
    let pipeline = EqualizationPipeline::new(config::resolve(args.config.as_deref(), &overrides)?)?;
    let settings = pipeline.config();
    info!(
        workers = ?settings.workers,
        strategy = %settings.builder.strategy,
        rows_per_task = ?settings.builder.rows_per_task,
        mapping = %settings.mapping,
        rounding = %settings.rounding,
        verify = settings.builder.verify,
        "Starting histogram equalization"
    );

    let inputs = files::collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        info!("No images found");
        return Ok(());
    }

    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let output = files::output_path(input, args.output_dir.as_deref());
        let control = match args.deadline_ms {
            Some(ms) => FrameControl::new().with_timeout(Duration::from_millis(ms)),
            None => FrameControl::new(),
        };

        match process_file(&pipeline, input, &output, &control) {
            Ok(report) => {
                info!(
                    input = %input.display(),
                    output = %output.display(),
                    width = report.width,
                    height = report.height,
                    total_ms = report.total_ms,
                    "Equalized image"
                );
                outcomes.push(FileOutcome {
                    input: input.clone(),
                    output: Some(output),
                    frame: Some(report),
                    error: None,
                });
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!(input = %input.display(), error = %message, "Failed to equalize image");
                outcomes.push(FileOutcome {
                    input: input.clone(),
                    output: None,
                    frame: None,
                    error: Some(message),
                });
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let run = RunReport {
        processed: outcomes.len() - failed,
        failed,
        elapsed_ms: started.elapsed().as_millis() as u64,
        files: outcomes,
    };
    info!(
        processed = run.processed,
        failed = run.failed,
        elapsed_ms = run.elapsed_ms,
        "Finished"
    );

    if let Some(path) = &args.report {
        write_report(path, &run)?;
    }

    if run.failed > 0 {
        anyhow::bail!("{} of {} images failed", run.failed, inputs.len());
    }
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn process_file(
    pipeline: &EqualizationPipeline,
    input: &Path,
    output: &Path,
    control: &FrameControl,
) -> Result<FrameReport> {
    let image = files::load_image(input)?;
    let frame = pipeline
        .equalize_with(image.view(), control)
        .with_context(|| format!("Equalization failed for {}", input.display()))?;
    files::save_png(output, &frame.image)?;
    Ok(frame.report)
}

fn write_report(path: &Path, run: &RunReport) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), run)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), "Wrote run report");
    Ok(())
}

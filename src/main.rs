mod cli;
mod config;
mod pipelines;
mod utils;

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{debug, error, info, LevelFilter};
use tokio::sync::Semaphore;

use crate::cli::parse;
use crate::config::defs::{PipelineError, RunConfig};
use crate::utils::system::detect_cores_and_load;
use pipelines::{check_availability, check_downloads, download};

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n srafetch\n-------------\n");

    let dir = env::current_dir()?;
    debug!("The current directory is {:?}", dir);

    let (max_workers, cpu_load) = detect_cores_and_load(args.jobs).await?;
    debug!(
        "Requested {} jobs; CPU load {:.1}%; using {} download workers",
        args.jobs, cpu_load, max_workers
    );

    let worker_semaphore = Arc::new(Semaphore::new(max_workers));

    let out_dir = setup_output_dir(&args, &dir)?;
    info!("Output directory: {}", out_dir.display());

    let module = args.module.clone();
    let run_config = Arc::new(RunConfig {
        cwd: dir,
        out_dir,
        args,
        worker_semaphore,
        max_workers,
    });

    if let Err(e) = match module.as_str() {
        "check_availability" => check_availability::run(run_config).await,
        "check_downloads" => check_downloads::run(run_config).await,
        "download" => download::run(run_config).await,
        _ => Err(PipelineError::InvalidConfig(format!("Invalid module: {}", module))),
    } {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

/// Resolves the output directory against the current working directory
/// and makes sure its parent chain can be created later. The directory
/// itself is created by the modules that write into it, so a read-only
/// module never litters an empty tree.
fn setup_output_dir(args: &cli::args::Arguments, cwd: &Path) -> Result<PathBuf> {
    let path = PathBuf::from(&args.out_dir);
    let out_dir = if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    };
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Output path {} exists and is not a directory",
            out_dir.display()
        ));
    }
    Ok(out_dir)
}

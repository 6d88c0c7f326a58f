use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use srafetch::cli::Arguments;
use srafetch::config::defs::{PipelineError, RunConfig};
use srafetch::pipelines::{check_downloads, download};
use srafetch::utils::file::find_run_files;

fn run_config(list_path: &Path, out_dir: &Path, jobs: usize) -> Arc<RunConfig> {
    let list = list_path.to_string_lossy().into_owned();
    let out = out_dir.to_string_lossy().into_owned();
    let args = Arguments::parse_from([
        "srafetch",
        "-m",
        "download",
        "--list",
        &list,
        "--out",
        &out,
        "--skip-tool-check",
    ]);
    Arc::new(RunConfig {
        cwd: std::env::current_dir().unwrap(),
        out_dir: out_dir.to_path_buf(),
        args,
        worker_semaphore: Arc::new(Semaphore::new(jobs)),
        max_workers: jobs,
    })
}

fn write_list(dir: &Path, accessions: &[&str]) -> std::path::PathBuf {
    let path = dir.join("srr_acc_list.txt");
    fs::write(&path, accessions.join("\n")).unwrap();
    path
}

fn touch_gz(dir: &Path, name: &str) {
    // Just the gzip magic; nothing reads past it.
    fs::write(dir.join(name), [0x1F, 0x8B, 0x08, 0x00]).unwrap();
}

#[tokio::test]
async fn check_downloads_handles_present_and_missing_runs() -> Result<()> {
    let tmp = TempDir::new()?;
    let out_dir = tmp.path().join("fastq");
    fs::create_dir_all(&out_dir)?;
    touch_gz(&out_dir, "SRR1000001_1.fastq.gz");
    touch_gz(&out_dir, "SRR1000001_2.fastq.gz");

    let list = write_list(tmp.path(), &["SRR1000001", "SRR1000002"]);
    let config = run_config(&list, &out_dir, 1);

    check_downloads::run(config.clone()).await?;

    let found = find_run_files(&config.out_dir, "SRR1000001", ".fastq.gz")?;
    assert_eq!(found.len(), 2);
    let missing = find_run_files(&config.out_dir, "SRR1000002", ".fastq.gz")?;
    assert!(missing.is_empty());
    Ok(())
}

#[tokio::test]
async fn check_downloads_with_missing_out_dir_is_ok() -> Result<()> {
    let tmp = TempDir::new()?;
    let list = write_list(tmp.path(), &["SRR1000001"]);
    let config = run_config(&list, &tmp.path().join("never_created"), 1);

    check_downloads::run(config).await?;
    Ok(())
}

#[tokio::test]
async fn download_with_empty_list_is_a_noop() -> Result<()> {
    let tmp = TempDir::new()?;
    let list = write_list(tmp.path(), &[]);
    let out_dir = tmp.path().join("fastq");
    let config = run_config(&list, &out_dir, 2);

    download::run(config).await?;
    // Nothing to do means nothing gets created.
    assert!(!out_dir.exists());
    Ok(())
}

#[tokio::test]
async fn download_skips_runs_that_are_already_present() -> Result<()> {
    let tmp = TempDir::new()?;
    let out_dir = tmp.path().join("fastq");
    fs::create_dir_all(&out_dir)?;
    touch_gz(&out_dir, "SRR1000001_1.fastq.gz");
    touch_gz(&out_dir, "SRR1000002_1.fastq.gz");

    let list = write_list(tmp.path(), &["SRR1000001", "SRR1000002"]);
    let config = run_config(&list, &out_dir, 2);

    // Every run is present, so no external tool is ever invoked.
    download::run(config).await?;
    Ok(())
}

#[tokio::test]
async fn download_with_missing_list_is_a_config_error() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = run_config(&tmp.path().join("no_list.txt"), tmp.path(), 1);

    let err = download::run(config).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)), "got: {}", err);
    Ok(())
}

#[tokio::test]
async fn malformed_accession_aborts_before_any_work() -> Result<()> {
    let tmp = TempDir::new()?;
    let out_dir = tmp.path().join("fastq");
    let list = write_list(tmp.path(), &["SRR1000001", "srr_id"]);
    let config = run_config(&list, &out_dir, 1);

    let err = download::run(config).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)), "got: {}", err);
    assert!(!out_dir.exists());
    Ok(())
}

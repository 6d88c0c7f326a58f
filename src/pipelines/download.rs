use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use log::{debug, error, info};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::cli::Compressor;
use crate::config::defs::{
    PipelineError, RunConfig, FASTERQ_DUMP_TAG, FASTQ_EXT, FASTQ_GZ_SUFFIX, GZIP_EXT, GZIP_TAG,
    PIGZ_TAG,
};
use crate::utils::accession::read_accession_list;
use crate::utils::command::{check_version, generate_cli, ToolTarget};
use crate::utils::file::{find_run_files, is_gzipped};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Downloaded,
    Skipped,
}

/// Downloads each listed run with fasterq-dump and compresses the
/// resulting FASTQ files. Work runs on a bounded pool: one task per
/// accession, gated by the RunConfig semaphore. One failed accession
/// never aborts the rest.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Download\n-------------\n");

    let accessions = read_accession_list(Path::new(&config.args.accession_list))?;
    if accessions.is_empty() {
        info!("Accession list is empty; nothing to download.");
        print_summary(0, 0, &[]);
        return Ok(());
    }

    if !config.args.skip_tool_check {
        let version = check_version(FASTERQ_DUMP_TAG)
            .await
            .map_err(|_| PipelineError::ToolMissing(FASTERQ_DUMP_TAG.to_string()))?;
        info!("{} version {}", FASTERQ_DUMP_TAG, version);
        if config.args.compressor == Compressor::Pigz {
            let version = check_version(PIGZ_TAG)
                .await
                .map_err(|_| PipelineError::ToolMissing(PIGZ_TAG.to_string()))?;
            info!("{} version {}", PIGZ_TAG, version);
        }
    }

    fs::create_dir_all(&config.out_dir)
        .map_err(|e| PipelineError::IOError(format!("Failed to create {}: {}", config.out_dir.display(), e)))?;
    debug!("Downloading {} accessions with {} workers", accessions.len(), config.max_workers);

    let mut tasks: Vec<(String, JoinHandle<Result<Outcome>>)> =
        Vec::with_capacity(accessions.len());
    for acc in accessions.iter().cloned() {
        let config = config.clone();
        let task_acc = acc.clone();
        tasks.push((
            acc,
            tokio::spawn(async move {
                let _permit = config
                    .worker_semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| anyhow!("Worker pool closed: {}", e))?;
                download_one(&config, &task_acc).await
            }),
        ));
    }

    let (downloaded, skipped, failed) = collect_outcomes(tasks).await;

    print_summary(downloaded, skipped, &failed);

    if failed.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::BatchFailed {
            failed: failed.len(),
            total: accessions.len(),
        })
    }
}

/// Joins the download tasks in submission order. Each handle stays
/// paired with its accession so a panicked worker still names the run
/// in the failure list.
async fn collect_outcomes(
    tasks: Vec<(String, JoinHandle<Result<Outcome>>)>,
) -> (usize, usize, Vec<String>) {
    let (accessions, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();

    let mut downloaded = 0;
    let mut skipped = 0;
    let mut failed: Vec<String> = Vec::new();

    for (acc, joined) in accessions.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(Ok(Outcome::Downloaded)) => downloaded += 1,
            Ok(Ok(Outcome::Skipped)) => skipped += 1,
            Ok(Err(e)) => {
                error!("✗ {} - Download failed: {}", acc, e);
                failed.push(acc);
            }
            Err(e) => {
                error!("✗ {} - Download worker panicked: {}", acc, e);
                failed.push(acc);
            }
        }
    }

    (downloaded, skipped, failed)
}

async fn download_one(config: &RunConfig, accession: &str) -> Result<Outcome> {
    let existing = find_run_files(&config.out_dir, accession, FASTQ_GZ_SUFFIX)?;
    if !existing.is_empty() {
        println!("✓ {} - Already downloaded, skipping", accession);
        return Ok(Outcome::Skipped);
    }

    println!("Downloading {}...", accession);

    let fq_args = generate_cli(FASTERQ_DUMP_TAG, config, &ToolTarget::Accession(accession))?;
    debug!("{} {:?}", FASTERQ_DUMP_TAG, fq_args);

    let mut cmd = Command::new(FASTERQ_DUMP_TAG);
    cmd.args(&fq_args).stdin(Stdio::null()).stdout(Stdio::piped());
    if config.args.progress {
        // fasterq-dump writes its progress bar to stderr
        cmd.stderr(Stdio::inherit());
    } else {
        cmd.stderr(Stdio::piped());
    }
    let output = cmd
        .output()
        .await
        .map_err(|e| anyhow!("Failed to spawn {}: {}. Is sra-tools installed?", FASTERQ_DUMP_TAG, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} exited with {}: {}",
            FASTERQ_DUMP_TAG,
            output.status,
            stderr.trim()
        ));
    }

    let fastq_suffix = format!(".{}", FASTQ_EXT);
    let fastqs = find_run_files(&config.out_dir, accession, &fastq_suffix)?;
    if fastqs.is_empty() {
        return Err(anyhow!(
            "{} reported success but produced no FASTQ files for {}",
            FASTERQ_DUMP_TAG,
            accession
        ));
    }

    for fastq in &fastqs {
        compress_file(config, fastq).await?;
    }

    println!("✓ {} - Download complete", accession);
    Ok(Outcome::Downloaded)
}

/// Compresses one FASTQ in place (`<file>` becomes `<file>.gz`, the
/// compressor's default) and verifies the result.
async fn compress_file(config: &RunConfig, path: &Path) -> Result<()> {
    let tool = match config.args.compressor {
        Compressor::Gzip => GZIP_TAG,
        Compressor::Pigz => PIGZ_TAG,
    };
    let comp_args = generate_cli(tool, config, &ToolTarget::File(path))?;
    debug!("{} {:?}", tool, comp_args);

    let output = Command::new(tool)
        .args(&comp_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| anyhow!("Failed to spawn {}: {}. Is it installed?", tool, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} exited with {} on {}: {}",
            tool,
            output.status,
            path.display(),
            stderr.trim()
        ));
    }

    let mut gz_os = path.as_os_str().to_os_string();
    gz_os.push(format!(".{}", GZIP_EXT));
    let gz_path = PathBuf::from(gz_os);
    if !gz_path.exists() {
        return Err(anyhow!("{} did not produce {}", tool, gz_path.display()));
    }
    if !is_gzipped(&gz_path)? {
        return Err(anyhow!("{} is not a valid gzip file", gz_path.display()));
    }

    Ok(())
}

fn print_summary(downloaded: usize, skipped: usize, failed: &[String]) {
    println!("\n{}", "=".repeat(50));
    println!("Successfully downloaded: {}", downloaded);
    println!("Already present: {}", skipped);
    println!("Failed: {}", failed.len());
    if !failed.is_empty() {
        println!("Failed IDs: {}", failed.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_list_names_the_run_even_when_a_worker_panics() {
        let ok: JoinHandle<Result<Outcome>> =
            tokio::spawn(async { Ok(Outcome::Downloaded) });
        let panicked: JoinHandle<Result<Outcome>> =
            tokio::spawn(async { panic!("worker died") });
        let errored: JoinHandle<Result<Outcome>> =
            tokio::spawn(async { Err(anyhow!("no such run")) });
        let skipped_run: JoinHandle<Result<Outcome>> =
            tokio::spawn(async { Ok(Outcome::Skipped) });

        let tasks = vec![
            ("SRR1000001".to_string(), ok),
            ("SRR1000002".to_string(), panicked),
            ("SRR1000003".to_string(), errored),
            ("SRR1000004".to_string(), skipped_run),
        ];

        let (downloaded, skipped, failed) = collect_outcomes(tasks).await;
        assert_eq!(downloaded, 1);
        assert_eq!(skipped, 1);
        assert_eq!(failed, vec!["SRR1000002", "SRR1000003"]);
    }
}

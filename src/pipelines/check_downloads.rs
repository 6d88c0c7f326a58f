use std::path::Path;
use std::sync::Arc;

use crate::config::defs::{PipelineError, RunConfig, FASTQ_GZ_SUFFIX};
use crate::utils::accession::read_accession_list;
use crate::utils::file::find_run_files;

/// Reports which listed runs already have compressed FASTQ files in the
/// output directory. A missing output directory counts every run as
/// missing rather than erroring.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Check Downloads\n-------------\n");

    let accessions = read_accession_list(Path::new(&config.args.accession_list))?;

    let mut downloaded = 0;
    let mut missing = 0;

    for acc in &accessions {
        let files = find_run_files(&config.out_dir, acc, FASTQ_GZ_SUFFIX)
            .map_err(|e| PipelineError::IOError(format!("Failed to scan {}: {}", config.out_dir.display(), e)))?;
        if files.is_empty() {
            println!("✗ {} - Not found", acc);
            missing += 1;
        } else {
            println!("✓ {} - Found {} files", acc, files.len());
            downloaded += 1;
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("Downloaded: {}", downloaded);
    println!("Missing: {}", missing);
    println!("Total: {}", accessions.len());

    Ok(())
}

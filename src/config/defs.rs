use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use lazy_static::lazy_static;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::cli::Arguments;

// External software
pub const AWS_TAG: &str = "aws";
pub const FASTERQ_DUMP_TAG: &str = "fasterq-dump";
pub const GZIP_TAG: &str = "gzip";
pub const PIGZ_TAG: &str = "pigz";

pub const GZIP_EXT: &str = "gz";
pub const FASTQ_EXT: &str = "fastq";
pub const FASTQ_GZ_SUFFIX: &str = ".fastq.gz";

lazy_static! {
    // Minimum (major, minor) versions the modules are tested against.
    pub static ref TOOL_VERSIONS: HashMap<&'static str, (u32, u32)> = {
        let mut m = HashMap::new();
        m.insert(FASTERQ_DUMP_TAG, (3, 0));
        m.insert(PIGZ_TAG, (2, 8));
        m.insert(AWS_TAG, (2, 0));

        m
    };
}

// Static Filenames
pub const AVAILABILITY_REPORT: &str = "aws_availability.tsv";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{tool} failed: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("{0} not found on PATH")]
    ToolMissing(String),

    #[error("I/O error: {0}")]
    IOError(String),

    #[error("{failed} of {total} accessions failed")]
    BatchFailed { failed: usize, total: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct RunConfig {
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub args: Arguments,
    pub worker_semaphore: Arc<Semaphore>,
    pub max_workers: usize,
}

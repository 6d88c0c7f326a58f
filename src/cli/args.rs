use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
pub enum Compressor {
    #[default]
    Gzip,
    Pigz,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "srafetch", version)]
pub struct Arguments {

    #[arg(short, long, help = "Module to run: check_availability, check_downloads, download")]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'l', long = "list", default_value = "data/srr_acc_list.txt", help = "Run accession list, one accession per line. Blank lines and '#' comments are skipped.")]
    pub accession_list: String,

    #[arg(short = 'o', long = "out", default_value = "data/raw/fastq", help = "Directory holding downloaded FASTQ files. Created if missing.")]
    pub out_dir: String,

    #[arg(short = 'j', long = "jobs", default_value_t = 1, help = "Accessions downloaded concurrently. Capped at the physical core count.")]
    pub jobs: usize,

    #[arg(long, default_value_t = 4, help = "Threads per fasterq-dump / pigz invocation")]
    pub threads: usize,

    #[arg(long = "compressor", default_value = "gzip", value_enum)]
    pub compressor: Compressor,

    #[arg(long, action, help = "Pipe fasterq-dump progress to the terminal")]
    pub progress: bool,

    #[arg(long, default_value = "sra-pub-run-odp")]
    pub bucket: String,

    #[arg(long, default_value = "sra/", help = "Key prefix under the bucket; run directories live at <prefix><accession>/")]
    pub prefix: String,

    #[arg(long, default_value_t = 10)]
    pub aws_timeout_secs: u64,

    #[arg(long, default_value_t = false, help = "Skip the external tool presence check before a batch")]
    pub skip_tool_check: bool,
}

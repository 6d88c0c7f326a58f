/// Functions and structs for building external tool command lines

use std::path::Path;

use anyhow::{anyhow, Result};
use log::{debug, warn};

use crate::config::defs::{RunConfig, AWS_TAG, FASTERQ_DUMP_TAG, GZIP_TAG, PIGZ_TAG, TOOL_VERSIONS};

/// What a tool invocation operates on.
pub enum ToolTarget<'a> {
    Accession(&'a str),
    File(&'a Path),
}

mod aws {
    use anyhow::{anyhow, Result};
    use tokio::process::Command;

    use crate::cli::Arguments;
    use crate::config::defs::AWS_TAG;
    use crate::utils::streams::{read_child_output_to_vec, ChildStream};

    pub async fn aws_presence_check() -> Result<String> {
        let args: Vec<&str> = vec!["--version"];

        let mut child = Command::new(AWS_TAG)
            .args(&args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is the AWS CLI installed?", AWS_TAG, e))?;

        let mut lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        if lines.is_empty() {
            // aws v1 prints its version banner to stderr
            lines = read_child_output_to_vec(&mut child, ChildStream::Stderr).await?;
        }
        child.wait().await?;

        let first_line = lines
            .first()
            .ok_or_else(|| anyhow!("No output from aws --version"))?;
        let version = first_line
            .split_whitespace()
            .next()
            .and_then(|tok| tok.split('/').nth(1))
            .ok_or_else(|| anyhow!("Invalid aws --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in aws --version output: {}", first_line));
        }
        Ok(version)
    }

    pub fn arg_generator(args: &Arguments, accession: &str) -> Vec<String> {
        let mut prefix = args.prefix.clone();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }

        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("s3".to_string());
        args_vec.push("ls".to_string());
        args_vec.push(format!("s3://{}/{}{}/", args.bucket, prefix, accession));
        args_vec.push("--no-sign-request".to_string());

        args_vec
    }
}

mod fasterq_dump {
    use anyhow::{anyhow, Result};
    use tokio::process::Command;

    use crate::config::defs::{RunConfig, FASTERQ_DUMP_TAG};
    use crate::utils::streams::{read_child_output_to_vec, ChildStream};

    pub async fn fasterq_dump_presence_check() -> Result<String> {
        let args: Vec<&str> = vec!["-V"];

        let mut child = Command::new(FASTERQ_DUMP_TAG)
            .args(&args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is sra-tools installed?", FASTERQ_DUMP_TAG, e))?;

        let lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        child.wait().await?;

        // Output shape: `"fasterq-dump" version 3.0.6`, sometimes after a blank line
        let version_line = lines
            .iter()
            .find(|line| line.contains("version"))
            .ok_or_else(|| anyhow!("No version line in fasterq-dump -V output"))?;
        let version = version_line
            .split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("Invalid fasterq-dump -V output: {}", version_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in fasterq-dump -V output: {}", version_line));
        }
        Ok(version)
    }

    pub fn arg_generator(config: &RunConfig, accession: &str) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--split-files".to_string());
        args_vec.push("--outdir".to_string());
        args_vec.push(config.out_dir.to_string_lossy().to_string());
        args_vec.push("--threads".to_string());
        args_vec.push(config.args.threads.to_string());
        if config.args.progress {
            args_vec.push("--progress".to_string());
        }
        args_vec.push(accession.to_string());

        args_vec
    }
}

mod gzip {
    use std::path::Path;

    pub fn arg_generator(path: &Path) -> Vec<String> {
        vec![path.to_string_lossy().to_string()]
    }
}

mod pigz {
    use std::path::Path;

    use anyhow::{anyhow, Result};
    use tokio::process::Command;

    use crate::cli::Arguments;
    use crate::config::defs::PIGZ_TAG;
    use crate::utils::streams::{read_child_output_to_vec, ChildStream};

    pub async fn pigz_presence_check() -> Result<String> {
        let args: Vec<&str> = vec!["--version"];

        let mut child = Command::new(PIGZ_TAG)
            .args(&args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is pigz installed?", PIGZ_TAG, e))?;

        let mut lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        if lines.is_empty() {
            // pigz <2.8 prints the version to stderr
            lines = read_child_output_to_vec(&mut child, ChildStream::Stderr).await?;
        }
        child.wait().await?;

        let first_line = lines
            .first()
            .ok_or_else(|| anyhow!("No output from pigz --version"))?;
        let version = first_line
            .split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("Invalid pigz --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in pigz --version output: {}", first_line));
        }
        Ok(version)
    }

    pub fn arg_generator(args: &Arguments, path: &Path) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-p".to_string());
        args_vec.push(args.threads.to_string());
        args_vec.push(path.to_string_lossy().to_string());

        args_vec
    }
}

pub fn generate_cli(tool: &str, config: &RunConfig, target: &ToolTarget) -> Result<Vec<String>> {
    let cmd = match (tool, target) {
        (AWS_TAG, ToolTarget::Accession(acc)) => aws::arg_generator(&config.args, acc),
        (FASTERQ_DUMP_TAG, ToolTarget::Accession(acc)) => fasterq_dump::arg_generator(config, acc),
        (GZIP_TAG, ToolTarget::File(path)) => gzip::arg_generator(path),
        (PIGZ_TAG, ToolTarget::File(path)) => pigz::arg_generator(&config.args, path),
        _ => return Err(anyhow!("Unknown tool or wrong target for tool: {}", tool)),
    };

    Ok(cmd)
}

pub async fn check_version(tool: &str) -> Result<String> {
    let version = match tool {
        AWS_TAG => aws::aws_presence_check().await,
        FASTERQ_DUMP_TAG => fasterq_dump::fasterq_dump_presence_check().await,
        PIGZ_TAG => pigz::pigz_presence_check().await,
        _ => return Err(anyhow!("Unknown tool: {}", tool)),
    }?;
    warn_if_outdated(tool, &version);
    Ok(version)
}

/// Warns when a tool is older than the minimum we test against. Only the
/// major.minor part of the reported version is compared.
fn warn_if_outdated(tool: &str, version: &str) {
    let Some(min) = TOOL_VERSIONS.get(tool) else {
        return;
    };
    match version_is_older(version, *min) {
        Some(true) => warn!(
            "{} {} is older than the tested minimum {}.{}",
            tool, version, min.0, min.1
        ),
        Some(false) => {}
        None => debug!("Could not parse {} version string: {}", tool, version),
    }
}

/// Compares major and minor as integers; "2.10" is newer than "2.8".
/// A missing or non-numeric minor counts as 0.
fn version_is_older(version: &str, min: (u32, u32)) -> Option<bool> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.trim().parse().ok()?;
    let minor: u32 = parts
        .next()
        .map(|p| p.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0);
    Some((major, minor) < min)
}

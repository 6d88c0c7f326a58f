use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use log::{debug, info, warn};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::defs::{PipelineError, RunConfig, AVAILABILITY_REPORT, AWS_TAG};
use crate::utils::accession::read_accession_list;
use crate::utils::command::{check_version, generate_cli, ToolTarget};
use crate::utils::streams::{read_child_output_to_vec, ChildStream};

struct AvailabilityRow {
    accession: String,
    available: bool,
    objects: Vec<String>,
}

/// Checks each listed run against the public SRA mirror by listing its
/// bucket prefix with the AWS CLI. A timeout or non-zero exit marks the
/// run unavailable; neither fails the module.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Check AWS Availability\n-------------\n");

    let accessions = read_accession_list(Path::new(&config.args.accession_list))?;

    if !config.args.skip_tool_check {
        let version = check_version(AWS_TAG)
            .await
            .map_err(|_| PipelineError::ToolMissing(AWS_TAG.to_string()))?;
        info!("{} version {}", AWS_TAG, version);
    }

    let mut rows: Vec<AvailabilityRow> = Vec::with_capacity(accessions.len());
    for acc in &accessions {
        let (available, objects) = check_s3_availability(&config, acc).await;
        println!("{}: {}", acc, if available { "✓" } else { "✗" });
        rows.push(AvailabilityRow {
            accession: acc.clone(),
            available,
            objects,
        });
    }

    let available_count = rows.iter().filter(|r| r.available).count();

    fs::create_dir_all(&config.out_dir)
        .map_err(|e| PipelineError::IOError(format!("Failed to create {}: {}", config.out_dir.display(), e)))?;
    let report_path = config.out_dir.join(AVAILABILITY_REPORT);
    write_report(&rows, &report_path)
        .map_err(|e| PipelineError::IOError(format!("Failed to write {}: {}", report_path.display(), e)))?;
    info!("Wrote availability report to {}", report_path.display());

    println!("\n{}", "=".repeat(50));
    println!("Available: {}", available_count);
    println!("Unavailable: {}", rows.len() - available_count);
    println!("Total: {}", rows.len());

    Ok(())
}

/// Lists `s3://<bucket>/<prefix><acc>/` without credentials. Returns the
/// object names found; success with an empty listing still counts as
/// available.
async fn check_s3_availability(config: &RunConfig, accession: &str) -> (bool, Vec<String>) {
    let aws_args = match generate_cli(AWS_TAG, config, &ToolTarget::Accession(accession)) {
        Ok(a) => a,
        Err(e) => {
            warn!("{}: could not build aws command: {}", accession, e);
            return (false, Vec::new());
        }
    };
    debug!("{} {:?}", AWS_TAG, aws_args);

    run_listing(AWS_TAG, &aws_args, config.args.aws_timeout_secs).await
}

/// Spawns a listing command under a timeout and parses its stdout.
/// Stderr goes to /dev/null: nothing reads it, and an undrained pipe
/// would stall a chatty child until the timeout fires.
async fn run_listing(tool: &str, tool_args: &[String], timeout_secs: u64) -> (bool, Vec<String>) {
    let mut child = match Command::new(tool)
        .args(tool_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn {}: {}. Is it installed?", tool, e);
            return (false, Vec::new());
        }
    };

    let listing = timeout(Duration::from_secs(timeout_secs), async {
        let lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        let status = child.wait().await?;
        Ok::<_, anyhow::Error>((lines, status))
    })
    .await;

    match listing {
        Ok(Ok((lines, status))) if status.success() => (true, parse_object_names(&lines)),
        Ok(Ok(_)) => (false, Vec::new()),
        Ok(Err(e)) => {
            warn!("{} listing failed: {}", tool, e);
            (false, Vec::new())
        }
        Err(_) => {
            debug!("{} listing timed out after {} s", tool, timeout_secs);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed-out {} process: {}", tool, e);
            }
            (false, Vec::new())
        }
    }
}

/// Object names are the last whitespace-separated field of each listing
/// line.
fn parse_object_names(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_whitespace().last())
        .map(String::from)
        .collect()
}

fn write_report(rows: &[AvailabilityRow], path: &Path) -> anyhow::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "accession\taws_available\tfiles")?;
    for row in rows {
        let files = if row.objects.is_empty() {
            "N/A".to_string()
        } else {
            row.objects.join(", ")
        };
        writeln!(file, "{}\t{}\t{}", row.accession, row.available, files)?;
    }
    file.flush().map_err(|e| anyhow!("Failed to flush report: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_names_come_from_the_last_field() {
        let lines = vec![
            "2023-04-01 12:00:00  104857600 SRR1000001.sralite".to_string(),
            "".to_string(),
            "2023-04-01 12:00:01     512000 SRR1000001.sralite.1".to_string(),
        ];
        assert_eq!(
            parse_object_names(&lines),
            vec!["SRR1000001.sralite", "SRR1000001.sralite.1"]
        );
    }

    #[test]
    fn empty_listing_has_no_objects() {
        assert!(parse_object_names(&[]).is_empty());
    }

    #[test]
    fn report_has_header_and_na_for_empty_objects() -> anyhow::Result<()> {
        let rows = vec![
            AvailabilityRow {
                accession: "SRR1000001".to_string(),
                available: true,
                objects: vec![
                    "SRR1000001.sralite".to_string(),
                    "SRR1000001.sralite.1".to_string(),
                ],
            },
            AvailabilityRow {
                accession: "SRR1000002".to_string(),
                available: false,
                objects: Vec::new(),
            },
        ];

        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join(AVAILABILITY_REPORT);
        write_report(&rows, &path)?;

        let report = fs::read_to_string(&path)?;
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "accession\taws_available\tfiles");
        assert_eq!(
            lines[1],
            "SRR1000001\ttrue\tSRR1000001.sralite, SRR1000001.sralite.1"
        );
        assert_eq!(lines[2], "SRR1000002\tfalse\tN/A");
        Ok(())
    }

    #[tokio::test]
    async fn noisy_stderr_does_not_stall_the_listing() {
        // Well past the pipe buffer size.
        let script = "i=0; while [ $i -lt 20000 ]; do echo noise >&2; i=$((i+1)); done; \
                      echo '2023-04-01 12:00:00  104857600 SRR1000001.sralite'";
        let args = vec!["-c".to_string(), script.to_string()];
        let (available, objects) = run_listing("sh", &args, 30).await;
        assert!(available);
        assert_eq!(objects, vec!["SRR1000001.sralite"]);
    }

    #[tokio::test]
    async fn listing_timeout_counts_as_unavailable() {
        let args = vec!["-c".to_string(), "sleep 5".to_string()];
        let (available, objects) = run_listing("sh", &args, 1).await;
        assert!(!available);
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn nonzero_exit_counts_as_unavailable() {
        let args = vec!["-c".to_string(), "exit 1".to_string()];
        let (available, _objects) = run_listing("sh", &args, 5).await;
        assert!(!available);
    }
}

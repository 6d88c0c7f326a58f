// src/utils/streams.rs: child process output capture

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChildStream {
    Stdout,
    Stderr,
}

/// Drains one of a child's piped output streams into a vector of lines.
/// The selected stream is taken from the child; a second call for the
/// same stream returns an error.
///
/// # Arguments
/// * `child` - Spawned child with the selected stream set to `Stdio::piped()`.
/// * `stream` - Which output stream to drain.
///
/// # Returns
/// Lines of output, without terminators.
pub async fn read_child_output_to_vec(
    child: &mut Child,
    stream: ChildStream,
) -> Result<Vec<String>> {
    let lines = match stream {
        ChildStream::Stdout => {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("Child stdout was not piped"))?;
            LinesStream::new(BufReader::new(stdout).lines())
                .collect::<Result<Vec<String>, _>>()
                .await?
        }
        ChildStream::Stderr => {
            let stderr = child
                .stderr
                .take()
                .ok_or_else(|| anyhow!("Child stderr was not piped"))?;
            LinesStream::new(BufReader::new(stderr).lines())
                .collect::<Result<Vec<String>, _>>()
                .await?
        }
    };
    Ok(lines)
}

// Run accession list parsing.

use std::fs;
use std::path::Path;

use crate::config::defs::PipelineError;

/// Reads a run accession list: one accession per line, surrounding
/// whitespace trimmed, blank lines and `#` comments skipped.
///
/// # Arguments
/// * `path` - Path to the accession list file.
///
/// # Returns
/// Accessions in file order.
pub fn read_accession_list(path: &Path) -> Result<Vec<String>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::InvalidConfig(format!(
            "{} does not exist. Please create it with the list of run accessions.",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| PipelineError::IOError(format!("Failed to read {}: {}", path.display(), e)))?;

    let mut accessions = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let acc = line.trim();
        if acc.is_empty() || acc.starts_with('#') {
            continue;
        }
        if !is_run_accession(acc) {
            return Err(PipelineError::InvalidConfig(format!(
                "Line {} of {} is not a run accession: {}",
                lineno + 1,
                path.display(),
                acc
            )));
        }
        accessions.push(acc.to_string());
    }

    Ok(accessions)
}

/// SRR/ERR/DRR followed by digits.
pub fn is_run_accession(acc: &str) -> bool {
    let bytes = acc.as_bytes();
    if bytes.len() < 4 {
        return false;
    }
    matches!(bytes[0], b'S' | b'E' | b'D')
        && bytes[1] == b'R'
        && bytes[2] == b'R'
        && bytes[3..].iter().all(|b| b.is_ascii_digit())
}

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Files in `dir` whose name starts with `stem` and ends with `suffix`,
/// sorted by path. The `SRR123*.fastq.gz` glob of the download scripts.
/// A missing directory yields no matches rather than an error.
pub fn find_run_files(dir: &Path, stem: &str, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    if !dir.is_dir() {
        return Ok(matches);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with(stem) && name.ends_with(suffix) {
                matches.push(path);
            }
        }
    }
    matches.sort();
    Ok(matches)
}

pub fn is_gzipped(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 2];
    file.read_exact(&mut buffer)?;
    Ok(buffer == [0x1F, 0x8B]) // Gzip magic bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn finds_only_matching_run_files() -> io::Result<()> {
        let dir = TempDir::new()?;
        for name in [
            "SRR1000001_1.fastq.gz",
            "SRR1000001_2.fastq.gz",
            "SRR1000002_1.fastq.gz",
            "SRR1000001_1.fastq", // uncompressed leftover
        ] {
            fs::write(dir.path().join(name), b"")?;
        }

        let found = find_run_files(dir.path(), "SRR1000001", ".fastq.gz")?;
        let names: Vec<_> = found
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["SRR1000001_1.fastq.gz", "SRR1000001_2.fastq.gz"]);
        Ok(())
    }

    #[test]
    fn missing_dir_yields_empty() -> io::Result<()> {
        let found = find_run_files(Path::new("/no/such/dir"), "SRR1", ".fastq.gz")?;
        assert!(found.is_empty());
        Ok(())
    }

    #[test]
    fn detects_gzip_magic() -> io::Result<()> {
        let dir = TempDir::new()?;
        let gz = dir.path().join("a.fastq.gz");
        let mut f = File::create(&gz)?;
        f.write_all(&[0x1F, 0x8B, 0x08, 0x00])?;
        assert!(is_gzipped(&gz)?);

        let plain = dir.path().join("a.fastq");
        fs::write(&plain, b"@read1\nACGT\n+\nIIII\n")?;
        assert!(!is_gzipped(&plain)?);
        Ok(())
    }
}

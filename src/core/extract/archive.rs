//! Archive unpacking and file lookup

use crate::domain::{IngestError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Unpack a ZIP archive into `dest`
///
/// Entry paths are sanitized by the zip crate; nothing is written outside `dest`.
pub fn unzip(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| {
        IngestError::Extraction(format!("Failed to open {}: {}", archive.display(), e))
    })?;
    let mut zip = zip::ZipArchive::new(file)?;
    let entries = zip.len();
    zip.extract(dest)?;
    Ok(entries)
}

/// Find a file by name under `root`, preferring the top level
pub fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    let direct = root.join(name);
    if direct.is_file() {
        return Some(direct);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(read_dir) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if entry.file_name() == name {
                return Some(path);
            }
        }
    }
    None
}

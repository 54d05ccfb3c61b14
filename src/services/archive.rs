//! In-memory zip packaging of kit directories
//!
//! The download endpoint streams a whole kit as one zip built in memory;
//! kits are a handful of PNGs and small JSON files, so buffering is fine.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Kit directory not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Zip every regular file in `kit_dir` (non-recursive) into a buffer
pub fn zip_kit_dir(kit_dir: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !kit_dir.is_dir() {
        return Err(ArchiveError::NotFound(kit_dir.to_path_buf()));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(kit_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        writer.start_file(name, options)?;
        writer.write_all(&std::fs::read(&path)?)?;
    }

    Ok(writer.finish()?.into_inner())
}

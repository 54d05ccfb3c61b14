//! Logging utilities
//!
//! A size-based rolling file writer for tracing, used when file logging
//! is enabled via the CLI.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Maximum log file size before rotation (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated files to keep
pub const DEFAULT_MAX_FILES: usize = 5;

/// A size-based rolling file writer
///
/// Rotates the log file when it exceeds a size limit. Rotated files get a
/// numeric suffix (app.log.1 is the newest rotation).
#[derive(Debug, Clone)]
pub struct RollingFileWriter {
    inner: Arc<Mutex<WriterInner>>,
}

#[derive(Debug)]
struct WriterInner {
    base_path: PathBuf,
    file: Option<File>,
    current_size: u64,
    max_size: u64,
    max_files: usize,
}

impl RollingFileWriter {
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let current_size = fs::metadata(&base_path).map(|m| m.len()).unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&base_path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(WriterInner {
                base_path,
                file: Some(file),
                current_size,
                max_size,
                max_files,
            })),
        })
    }

    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }
}

impl WriterInner {
    /// Shift rotations up by one and start a fresh file
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        for i in (1..self.max_files).rev() {
            let from = self.rotated_path(i);
            if from.exists() {
                if i + 1 >= self.max_files {
                    fs::remove_file(&from).ok();
                } else {
                    fs::rename(&from, self.rotated_path(i + 1)).ok();
                }
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, self.rotated_path(1))?;
        }

        self.file = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.base_path)?,
        );
        self.current_size = 0;

        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();

        if inner.current_size + buf.len() as u64 > inner.max_size {
            inner.rotate()?;
        }

        if let Some(ref mut file) = inner.file {
            let written = file.write(buf)?;
            inner.current_size += written as u64;
            Ok(written)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "Log file not open"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.file {
            Some(ref mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RollingFileWriter {
    type Writer = RollingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writer_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let writer = RollingFileWriter::with_defaults(&path).unwrap();
        assert!(path.exists());
        drop(writer);
    }

    #[test]
    fn test_writer_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let mut writer = RollingFileWriter::with_defaults(&path).unwrap();
        writer.write_all(b"first line\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("first line"));
    }

    #[test]
    fn test_writer_rotates_at_size_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let mut writer = RollingFileWriter::new(&path, 64, 3).unwrap();
        for i in 0..10 {
            writeln!(writer, "line {}: some log output to fill the file", i).unwrap();
        }
        writer.flush().unwrap();

        assert!(dir.path().join("app.log.1").exists());
    }
}

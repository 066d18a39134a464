//! Response persistence
//!
//! Results are plain text, one response body per line. A file is appended to
//! only when appending was requested and the file already exists; otherwise it
//! is created or truncated.

use std::path::{Path, PathBuf};

pub mod lines;

pub use lines::LineWriter;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// File could not be opened, written or flushed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How an output file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing content and add lines at the end
    Append,
    /// Start from an empty file
    Truncate,
}

impl WriteMode {
    /// Append only if requested and the file is already there
    pub fn resolve(path: &Path, append: bool) -> Self {
        if append && path.exists() {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        }
    }
}

/// Write `lines` to `path`, one per line, and return the mode that was used
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S], append: bool) -> OutputResult<WriteMode> {
    let mode = WriteMode::resolve(path, append);
    let mut writer = LineWriter::open(path, mode)?;
    writer.write_lines(lines)?;
    writer.close()?;
    Ok(mode)
}

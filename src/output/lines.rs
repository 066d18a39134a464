//! Line-per-record text writer

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{OutputError, OutputResult, WriteMode};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Buffered writer that terminates every record with `\n`
pub struct LineWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    lines_written: u64,
}

impl LineWriter {
    /// Open `path` in the given mode, creating parent directories as needed
    pub fn open(path: &Path, mode: WriteMode) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| OutputError::io(path, e))?;
        }

        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Append => options.append(true).create(true),
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
        };
        let file = options.open(path).map_err(|e| OutputError::io(path, e))?;

        debug!(path = %path.display(), ?mode, "opened output file");

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
            lines_written: 0,
        })
    }

    /// Write one record
    pub fn write_line(&mut self, line: &str) -> OutputResult<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| OutputError::io(&self.path, e))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Write records in order
    pub fn write_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> OutputResult<()> {
        for line in lines {
            self.write_line(line.as_ref())?;
        }
        Ok(())
    }

    /// Records written through this writer
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Flush and sync to disk
    pub fn close(mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::io(&self.path, e))?;
        let file = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| OutputError::io(&self.path, e))?;
        debug!(path = %self.path.display(), lines = self.lines_written, "closed output file");
        Ok(())
    }
}

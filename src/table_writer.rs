use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use tracing::{debug, error, info};

use crate::util::ensure_parent_directory;

struct Dedup {
    column: usize,
    seen: HashSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterSummary {
    pub rows_written: usize,
    pub rows_deduplicated: usize,
    pub batches_flushed: usize,
}

/// Append-only CSV destination that buffers rows and flushes every
/// `batch_size` documents. Remaining rows are flushed on [`close`] and,
/// failing that, on drop.
///
/// [`close`]: TableWriter::close
pub struct TableWriter {
    path: PathBuf,
    header: Vec<String>,
    writer: Writer<File>,
    buffer: Vec<Vec<String>>,
    batch_size: usize,
    documents_in_batch: usize,
    dedup: Option<Dedup>,
    summary: WriterSummary,
}

impl TableWriter {
    /// Creates `path` with `header`, or appends to it when it already holds
    /// rows. An existing file with a different header is rejected.
    pub fn open(path: &Path, header: &[&str], batch_size: usize) -> Result<Self> {
        ensure_parent_directory(path)?;
        let header: Vec<String> = header.iter().map(|name| name.to_string()).collect();

        let has_content = path
            .metadata()
            .map(|metadata| metadata.len() > 0)
            .unwrap_or(false);

        let writer = if has_content {
            let existing = read_header(path)?;
            if existing != header {
                bail!(
                    "header mismatch appending to {}: existing [{}], expected [{}]",
                    path.display(),
                    existing.join(", "),
                    header.join(", ")
                );
            }
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {} for append", path.display()))?;
            debug!(path = %path.display(), "appending to existing table");
            WriterBuilder::new().has_headers(false).from_writer(file)
        } else {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
            writer
                .write_record(&header)
                .with_context(|| format!("failed to write header to {}", path.display()))?;
            writer
                .flush()
                .with_context(|| format!("failed to flush header to {}", path.display()))?;
            writer
        };

        Ok(Self {
            path: path.to_path_buf(),
            header,
            writer,
            buffer: Vec::new(),
            batch_size: batch_size.max(1),
            documents_in_batch: 0,
            dedup: None,
            summary: WriterSummary::default(),
        })
    }

    /// Skips rows whose `column` value is already in the destination or was
    /// pushed earlier in this run. Rows with an empty value are always kept.
    pub fn dedup_on(mut self, column: &str) -> Result<Self> {
        let Some(index) = self.header.iter().position(|name| name == column) else {
            bail!(
                "dedup column {column:?} is not a column of {}",
                self.path.display()
            );
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut seen = HashSet::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read row in {}", self.path.display()))?;
            if let Some(value) = record.get(index).filter(|value| !value.trim().is_empty()) {
                seen.insert(value.to_string());
            }
        }

        info!(
            path = %self.path.display(),
            column,
            existing_keys = seen.len(),
            "loaded dedup keys"
        );
        self.dedup = Some(Dedup {
            column: index,
            seen,
        });
        Ok(self)
    }

    /// Buffers one row. Returns `false` when dedup dropped it.
    pub fn push(&mut self, row: Vec<String>) -> Result<bool> {
        if row.len() != self.header.len() {
            bail!(
                "row has {} values but {} has {} columns",
                row.len(),
                self.path.display(),
                self.header.len()
            );
        }

        if let Some(dedup) = self.dedup.as_mut() {
            let key = row.get(dedup.column).map(String::as_str).unwrap_or_default();
            if !key.trim().is_empty() && !dedup.seen.insert(key.to_string()) {
                self.summary.rows_deduplicated += 1;
                return Ok(false);
            }
        }

        self.buffer.push(row);
        Ok(true)
    }

    /// Marks the end of one source document; flushes on the batch boundary.
    pub fn finish_document(&mut self) -> Result<()> {
        self.documents_in_batch += 1;
        if self.documents_in_batch >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    pub fn flush_batch(&mut self) -> Result<usize> {
        let count = self.buffer.len();
        for row in self.buffer.drain(..) {
            self.writer
                .write_record(&row)
                .with_context(|| format!("failed to write row to {}", self.path.display()))?;
        }
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;

        self.documents_in_batch = 0;
        if count > 0 {
            self.summary.rows_written += count;
            self.summary.batches_flushed += 1;
            info!(path = %self.path.display(), rows = count, "flushed batch");
        }
        Ok(count)
    }

    pub fn close(mut self) -> Result<WriterSummary> {
        self.flush_batch()?;
        debug!(
            path = %self.path.display(),
            rows = self.summary.rows_written,
            batches = self.summary.batches_flushed,
            "closed table"
        );
        Ok(self.summary)
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(err) = self.flush_batch() {
            error!(path = %self.path.display(), error = %err, "failed to flush table on drop");
        }
    }
}

fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?;
    Ok(header.iter().map(ToOwned::to_owned).collect())
}

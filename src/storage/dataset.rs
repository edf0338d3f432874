//! Append-only CSV datasets.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::HarvestError;

/// Destination for flushed record batches.
pub trait RecordSink<R> {
    /// Non-empty values of `column` already stored.
    fn existing_keys(&self, column: &str) -> Result<HashSet<String>, HarvestError>;

    /// Store a batch after everything already stored.
    fn append(&mut self, records: &[R]) -> Result<(), HarvestError>;
}

/// CSV file with a header row written once, on first write.
///
/// Rows are only ever appended. Uniqueness is up to the caller.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// True when the file is missing or empty.
    pub fn is_empty(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true)
    }

    fn ensure_parent(&self) -> Result<(), HarvestError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Append rows, writing the header first if the file is missing or empty.
    pub fn append_rows<R: Serialize>(&self, records: &[R]) -> Result<usize, HarvestError> {
        if records.is_empty() {
            return Ok(0);
        }
        self.ensure_parent()?;

        let header = self.is_empty();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(header)
            .from_writer(file);

        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(records.len())
    }

    /// Replace the whole file with a header and `records`.
    pub fn replace<R: Serialize>(&self, records: &[R]) -> Result<usize, HarvestError> {
        self.ensure_parent()?;
        let tmp = self.path.with_extension("csv.part");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(records.len())
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>, HarvestError> {
        // Rows with too few or too many fields still carry their key
        Ok(csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?)
    }

    /// Values of `column` in the stored rows. Empty when the file is missing
    /// or empty.
    pub fn load_keys(&self, column: &str) -> Result<HashSet<String>, HarvestError> {
        if self.is_empty() {
            return Ok(HashSet::new());
        }

        let mut reader = self.reader()?;
        let idx = column_index(reader.headers()?, column).ok_or_else(|| {
            HarvestError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            }
        })?;

        let mut keys = HashSet::new();
        for row in reader.records() {
            let row = row?;
            if let Some(value) = row.get(idx).map(str::trim) {
                if !value.is_empty() {
                    keys.insert(value.to_string());
                }
            }
        }
        Ok(keys)
    }

    /// Rewrite the file keeping only the first row for each key.
    ///
    /// Returns `(kept, dropped)`.
    pub fn dedupe(&self, key_columns: &[String]) -> Result<(usize, usize), HarvestError> {
        if !self.path.exists() {
            return Err(HarvestError::MissingInput(self.path.clone()));
        }

        let mut reader = self.reader()?;
        let headers = reader.headers()?.clone();
        let idxs = key_columns
            .iter()
            .map(|col| {
                column_index(&headers, col).ok_or_else(|| HarvestError::MissingColumn {
                    path: self.path.clone(),
                    column: col.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        let mut dropped = 0;
        for row in reader.records() {
            let row = row?;
            let key: Vec<String> = idxs
                .iter()
                .map(|&i| row.get(i).unwrap_or("").to_string())
                .collect();
            if seen.insert(key) {
                kept.push(row);
            } else {
                dropped += 1;
            }
        }

        let tmp = self.path.with_extension("csv.part");
        {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
            writer.write_record(&headers)?;
            for row in &kept {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        Ok((kept.len(), dropped))
    }
}

impl<R: Serialize> RecordSink<R> for DatasetWriter {
    fn existing_keys(&self, column: &str) -> Result<HashSet<String>, HarvestError> {
        self.load_keys(column)
    }

    fn append(&mut self, records: &[R]) -> Result<(), HarvestError> {
        self.append_rows(records).map(|_| ())
    }
}

pub(crate) fn column_index(headers: &csv::StringRecord, column: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == column)
}

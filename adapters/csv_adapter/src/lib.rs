use review_core::domain::{FlatRow, ReviewedRow};
use review_core::ports::{DecisionAppender, DecisionLog, FlatTableStore};
use review_core::{Result, ReviewError};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const TABLE_HEADER: [&str; 4] = ["id", "username", "url", "timestamp"];
pub const DECISIONS_HEADER: [&str; 5] = ["id", "username", "url", "timestamp", "status"];

fn table_err(e: csv::Error) -> ReviewError {
    ReviewError::Table(e.to_string())
}

fn writer_for(file: File) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file)
}

fn reader_for(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(table_err)
}

fn column(headers: &csv::ByteRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name.as_bytes())
}

fn field(record: &csv::ByteRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

/// Parses an id field, tolerating surrounding whitespace.
fn parse_id(record: &csv::ByteRecord, idx: usize) -> Option<u64> {
    let raw = record.get(idx)?;
    std::str::from_utf8(raw).ok()?.trim().parse().ok()
}

/// CSV implementation of the FlatTableStore trait
pub struct CsvFlatTable {
    path: PathBuf,
}

impl CsvFlatTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FlatTableStore for CsvFlatTable {
    fn write_rows(&self, rows: &[FlatRow]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = writer_for(File::create(&self.path)?);
        writer.write_record(TABLE_HEADER).map_err(table_err)?;
        for row in rows {
            writer
                .write_record([
                    row.id.to_string().as_str(),
                    row.username.as_str(),
                    row.url.as_str(),
                    row.timestamp.as_str(),
                ])
                .map_err(table_err)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<FlatRow>> {
        if !self.path.exists() {
            return Err(ReviewError::NotFound(format!(
                "Flattened table {} (run the flatten step first)",
                self.path.display()
            )));
        }

        let mut reader = reader_for(&self.path)?;
        let headers = reader.byte_headers().map_err(table_err)?.clone();
        let id_col = column(&headers, "id").ok_or_else(|| {
            ReviewError::Table(format!("{} has no 'id' column", self.path.display()))
        })?;
        let username_col = column(&headers, "username");
        let url_col = column(&headers, "url");
        let timestamp_col = column(&headers, "timestamp");

        let mut rows = Vec::new();
        for (line, result) in reader.byte_records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    log::debug!("Skipping unreadable table row {}: {e}", line + 1);
                    continue;
                }
            };
            let Some(id) = parse_id(&record, id_col) else {
                log::debug!("Skipping table row {} with unparsable id", line + 1);
                continue;
            };
            rows.push(FlatRow {
                id,
                username: field(&record, username_col),
                url: field(&record, url_col),
                timestamp: field(&record, timestamp_col),
            });
        }
        Ok(rows)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Append-only CSV implementation of the DecisionLog trait
pub struct CsvDecisionLog {
    path: PathBuf,
}

impl CsvDecisionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cuts off a trailing partial record left by a crash and returns the
    /// remaining length. The partial record was never flushed as a whole, so
    /// its id is not finalized.
    fn truncate_torn_tail(&self) -> Result<u64> {
        let bytes = fs::read(&self.path)?;
        let complete = complete_prefix_len(&bytes);
        if complete < bytes.len() {
            log::warn!(
                "{} ends mid-row; dropping {} trailing bytes",
                self.path.display(),
                bytes.len() - complete
            );
            let file = OpenOptions::new().write(true).open(&self.path)?;
            file.set_len(complete as u64)?;
            file.sync_data()?;
        }
        Ok(complete as u64)
    }
}

/// Length of the prefix made of complete records, i.e. up to the last
/// newline that lies outside a quoted field.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let mut in_quotes = false;
    let mut end = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => end = i + 1,
            _ => {}
        }
    }
    end
}

impl DecisionLog for CsvDecisionLog {
    fn load_done_ids(&self) -> Result<HashSet<u64>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }

        let mut reader = reader_for(&self.path)?;
        let headers = match reader.byte_headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                log::warn!("Unreadable header in {}: {e}", self.path.display());
                return Ok(HashSet::new());
            }
        };
        let Some(id_col) = column(&headers, "id") else {
            log::warn!("{} has no 'id' column; nothing to resume", self.path.display());
            return Ok(HashSet::new());
        };

        let mut done = HashSet::new();
        for result in reader.byte_records() {
            match result {
                Ok(record) => match parse_id(&record, id_col) {
                    Some(id) => {
                        done.insert(id);
                    }
                    None => log::debug!("Ignoring decision row with unparsable id"),
                },
                Err(e) => log::debug!("Ignoring unreadable decision row: {e}"),
            }
        }
        Ok(done)
    }

    fn open_appender(&self) -> Result<Box<dyn DecisionAppender>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let existing_len = if self.path.exists() {
            self.truncate_torn_tail()?
        } else {
            0
        };
        let needs_header = existing_len == 0;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = writer_for(file);
        if needs_header {
            writer.write_record(DECISIONS_HEADER).map_err(table_err)?;
        }
        writer.flush()?;
        writer.get_ref().sync_data()?;

        Ok(Box::new(CsvDecisionAppender { writer }))
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Appends one decision per call and syncs it to disk before returning
pub struct CsvDecisionAppender {
    writer: csv::Writer<File>,
}

impl DecisionAppender for CsvDecisionAppender {
    fn append(&mut self, reviewed: &ReviewedRow) -> Result<()> {
        let row = &reviewed.row;
        self.writer
            .write_record([
                row.id.to_string().as_str(),
                row.username.as_str(),
                row.url.as_str(),
                row.timestamp.as_str(),
                reviewed.status.as_str(),
            ])
            .map_err(table_err)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        log::debug!("Recorded id {} as {}", row.id, reviewed.status);
        Ok(())
    }
}

use crate::domain::{ExportRecord, FlatRow, ReviewedRow};
use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Source of raw export records, in the order the export lists them.
pub trait ExportSource {
    fn load_records(&self) -> Result<Vec<ExportRecord>>;
}

/// Tabular intermediate produced by the flattener and consumed by the review loop.
pub trait FlatTableStore {
    /// Replaces any previous table with `rows`.
    fn write_rows(&self, rows: &[FlatRow]) -> Result<()>;
    /// Fails when the table does not exist yet.
    fn read_rows(&self) -> Result<Vec<FlatRow>>;
    fn location(&self) -> &Path;
}

/// Append-only, durable record of finalized decisions.
pub trait DecisionLog {
    /// Ids already finalized by previous runs. Empty when nothing was written yet.
    fn load_done_ids(&self) -> Result<HashSet<u64>>;
    /// Opens the log for appending, writing the header first if needed.
    fn open_appender(&self) -> Result<Box<dyn DecisionAppender>>;
    fn location(&self) -> &Path;
}

pub trait DecisionAppender {
    /// Appends one row and makes it durable before returning.
    fn append(&mut self, row: &ReviewedRow) -> Result<()>;
}

/// Archive collaborator that turns a downloaded export into the raw record file.
pub trait ExportUnpacker {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<PathBuf>;
    fn locate(&self, root: &Path) -> Result<PathBuf>;
    fn copy(&self, src: &Path, dest: &Path) -> Result<()>;
}

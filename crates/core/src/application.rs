use crate::config::{ReviewSettings, SourceOrder};
use crate::error::{Result, ReviewError};
use crate::flatten::flatten;
use crate::ports::{DecisionLog, ExportSource, ExportUnpacker, FlatTableStore};
use crate::review::{ReviewLoop, ReviewReport};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Application service that flattens the raw export into the tabular intermediate
pub struct FlattenService {
    source: Box<dyn ExportSource>,
    table: Box<dyn FlatTableStore>,
    order: SourceOrder,
}

impl FlattenService {
    pub fn new(
        source: Box<dyn ExportSource>,
        table: Box<dyn FlatTableStore>,
        order: SourceOrder,
    ) -> Self {
        Self {
            source,
            table,
            order,
        }
    }

    /// Reads the export, assigns ids and overwrites the table. Returns the table path.
    pub fn execute(&self) -> Result<PathBuf> {
        let records = self.source.load_records()?;
        let rows = flatten(&records, self.order);
        self.table.write_rows(&rows)?;
        log::info!(
            "Flattened {} records into {}",
            rows.len(),
            self.table.location().display()
        );
        Ok(self.table.location().to_path_buf())
    }
}

/// Application service driving the interactive review over the tabular intermediate
pub struct ReviewService {
    table: Box<dyn FlatTableStore>,
    decisions: Box<dyn DecisionLog>,
    settings: ReviewSettings,
}

impl ReviewService {
    pub fn new(
        table: Box<dyn FlatTableStore>,
        decisions: Box<dyn DecisionLog>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            table,
            decisions,
            settings,
        }
    }

    pub fn execute<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> Result<ReviewReport> {
        let rows = self.table.read_rows()?;
        ReviewLoop::new(self.decisions.as_ref(), self.settings).run(&rows, input, out)
    }
}

/// Where a prepared export came from and where it now lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExport {
    pub extracted_to: PathBuf,
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Unpacks a downloaded export archive and copies the record file to a stable path
pub struct PrepareService {
    unpacker: Box<dyn ExportUnpacker>,
}

impl PrepareService {
    pub fn new(unpacker: Box<dyn ExportUnpacker>) -> Self {
        Self { unpacker }
    }

    pub fn execute(&self, archive: &Path, outdir: &Path, dest: &Path) -> Result<PreparedExport> {
        if !archive.exists() {
            return Err(ReviewError::Archive(format!(
                "Archive not found: {}",
                archive.display()
            )));
        }

        let extracted_to = self.unpacker.extract(archive, outdir)?;
        let source = self.unpacker.locate(&extracted_to)?;
        self.unpacker.copy(&source, dest)?;
        log::info!("Copied {} -> {}", source.display(), dest.display());

        Ok(PreparedExport {
            extracted_to,
            source,
            dest: dest.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportRecord, ExportReference, FlatRow};
    use crate::ports::DecisionAppender;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::rc::Rc;

    struct FixedSource(Vec<ExportRecord>);

    impl ExportSource for FixedSource {
        fn load_records(&self) -> Result<Vec<ExportRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl ExportSource for FailingSource {
        fn load_records(&self) -> Result<Vec<ExportRecord>> {
            Err(ReviewError::MissingKey("relationships_following".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryTable {
        path: PathBuf,
        rows: Rc<RefCell<Option<Vec<FlatRow>>>>,
    }

    impl FlatTableStore for MemoryTable {
        fn write_rows(&self, rows: &[FlatRow]) -> Result<()> {
            *self.rows.borrow_mut() = Some(rows.to_vec());
            Ok(())
        }

        fn read_rows(&self) -> Result<Vec<FlatRow>> {
            self.rows
                .borrow()
                .clone()
                .ok_or_else(|| ReviewError::NotFound(self.path.display().to_string()))
        }

        fn location(&self) -> &Path {
            &self.path
        }
    }

    #[derive(Default)]
    struct NullLog {
        path: PathBuf,
        appended: Rc<RefCell<usize>>,
    }

    struct CountingAppender(Rc<RefCell<usize>>);

    impl DecisionAppender for CountingAppender {
        fn append(&mut self, _row: &crate::domain::ReviewedRow) -> Result<()> {
            *self.0.borrow_mut() += 1;
            Ok(())
        }
    }

    impl DecisionLog for NullLog {
        fn load_done_ids(&self) -> Result<HashSet<u64>> {
            Ok(HashSet::new())
        }

        fn open_appender(&self) -> Result<Box<dyn DecisionAppender>> {
            Ok(Box::new(CountingAppender(Rc::clone(&self.appended))))
        }

        fn location(&self) -> &Path {
            &self.path
        }
    }

    fn record(title: &str, ts: i64) -> ExportRecord {
        ExportRecord {
            title: title.to_string(),
            string_list_data: vec![ExportReference {
                href: format!("https://example.com/{title}"),
                value: String::new(),
                timestamp: Some(ts),
            }],
        }
    }

    #[test]
    fn test_flatten_service_writes_table() {
        let rows = Rc::new(RefCell::new(None));
        let table = MemoryTable {
            path: PathBuf::from("data/followings.csv"),
            rows: Rc::clone(&rows),
        };
        let service = FlattenService::new(
            Box::new(FixedSource(vec![record("b", 200), record("a", 100)])),
            Box::new(table),
            SourceOrder::NewestFirst,
        );

        let path = service.execute().unwrap();
        assert_eq!(path, PathBuf::from("data/followings.csv"));
        let written = rows.borrow().clone().unwrap();
        assert_eq!(written[0].username, "a");
        assert_eq!(written[1].username, "b");
    }

    #[test]
    fn test_flatten_service_propagates_source_error() {
        let service = FlattenService::new(
            Box::new(FailingSource),
            Box::new(MemoryTable::default()),
            SourceOrder::NewestFirst,
        );
        assert!(matches!(
            service.execute(),
            Err(ReviewError::MissingKey(_))
        ));
    }

    #[test]
    fn test_review_service_requires_table() {
        let service = ReviewService::new(
            Box::new(MemoryTable::default()),
            Box::new(NullLog::default()),
            ReviewSettings::default(),
        );
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();
        assert!(matches!(
            service.execute(&mut input, &mut out),
            Err(ReviewError::NotFound(_))
        ));
    }

    #[test]
    fn test_review_service_runs_loop() {
        let table = MemoryTable::default();
        table
            .write_rows(&[FlatRow {
                id: 0,
                username: "a".to_string(),
                url: String::new(),
                timestamp: String::new(),
            }])
            .unwrap();
        let appended = Rc::new(RefCell::new(0));
        let decisions = NullLog {
            path: PathBuf::from("data/edited_followings.csv"),
            appended: Rc::clone(&appended),
        };
        let service = ReviewService::new(
            Box::new(table),
            Box::new(decisions),
            ReviewSettings::default(),
        );

        let mut input = Cursor::new(b"\n".to_vec());
        let mut out = Vec::new();
        let report = service.execute(&mut input, &mut out).unwrap();
        assert_eq!(report.appended, 1);
        assert_eq!(*appended.borrow(), 1);
    }

    struct RecordingUnpacker {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl ExportUnpacker for RecordingUnpacker {
        fn extract(&self, _archive: &Path, target_dir: &Path) -> Result<PathBuf> {
            self.calls.borrow_mut().push("extract".to_string());
            Ok(target_dir.to_path_buf())
        }

        fn locate(&self, root: &Path) -> Result<PathBuf> {
            self.calls.borrow_mut().push("locate".to_string());
            Ok(root.join("following.json"))
        }

        fn copy(&self, _src: &Path, _dest: &Path) -> Result<()> {
            self.calls.borrow_mut().push("copy".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_prepare_service_missing_archive() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let service = PrepareService::new(Box::new(RecordingUnpacker {
            calls: Rc::clone(&calls),
        }));
        let result = service.execute(
            Path::new("/definitely/not/here.zip"),
            Path::new("out"),
            Path::new("dest.json"),
        );
        assert!(matches!(result, Err(ReviewError::Archive(_))));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_prepare_service_order_of_steps() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let service = PrepareService::new(Box::new(RecordingUnpacker {
            calls: Rc::clone(&calls),
        }));
        // Cargo.toml of this crate always exists relative to the test cwd
        let prepared = service
            .execute(Path::new("Cargo.toml"), Path::new("out"), Path::new("dest.json"))
            .unwrap();
        assert_eq!(*calls.borrow(), vec!["extract", "locate", "copy"]);
        assert_eq!(prepared.source, PathBuf::from("out/following.json"));
        assert_eq!(prepared.dest, PathBuf::from("dest.json"));
    }
}

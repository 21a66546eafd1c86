use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BASE_NAME: &str = "followings";

/// File layout of one review campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub data_dir: PathBuf,
    pub base_name: String,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR, DEFAULT_BASE_NAME)
    }
}

impl WorkspaceLayout {
    pub fn new(data_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            base_name: base_name.into(),
        }
    }

    /// Raw export copied out of the archive.
    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.base_name))
    }

    /// Flattened intermediate table.
    pub fn table_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.csv", self.base_name))
    }

    /// Durable decisions output.
    pub fn decisions_path(&self) -> PathBuf {
        self.data_dir.join(format!("edited_{}.csv", self.base_name))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("export")
    }
}

/// Order in which the export lists its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceOrder {
    /// Most recent follow first; reversed so ids run oldest first.
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewSettings {
    /// Render a just-toggled status in bold.
    pub emphasize: bool,
}

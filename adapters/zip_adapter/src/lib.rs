use review_core::ports::ExportUnpacker;
use review_core::{Result, ReviewError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Location of the following list inside an Instagram export.
pub const FOLLOWING_REL_PATH: [&str; 3] = [
    "connections",
    "followers_and_following",
    "following.json",
];

/// ZIP implementation of the ExportUnpacker trait
pub struct ZipExportUnpacker {
    rel_path: PathBuf,
}

impl Default for ZipExportUnpacker {
    fn default() -> Self {
        Self::new(FOLLOWING_REL_PATH.iter().collect::<PathBuf>())
    }
}

impl ZipExportUnpacker {
    pub fn new(rel_path: impl Into<PathBuf>) -> Self {
        Self {
            rel_path: rel_path.into(),
        }
    }

    fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.rel_path.file_name()
    }
}

impl ExportUnpacker for ZipExportUnpacker {
    fn extract(&self, archive: &Path, target_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(target_dir)?;

        let file = fs::File::open(archive).map_err(|e| {
            ReviewError::Archive(format!("Failed to open {}: {e}", archive.display()))
        })?;
        let mut zip_archive = zip::ZipArchive::new(file)
            .map_err(|e| ReviewError::Archive(format!("Invalid or corrupt ZIP: {e}")))?;

        let mut count: usize = 0;
        for i in 0..zip_archive.len() {
            let mut entry = zip_archive
                .by_index(i)
                .map_err(|e| ReviewError::Archive(format!("Failed to read entry {i}: {e}")))?;

            let entry_path = match entry.enclosed_name() {
                Some(p) => p.to_path_buf(),
                None => {
                    log::warn!("Skipping unsafe archive entry {}", entry.name());
                    continue;
                }
            };
            let output_path = target_dir.join(&entry_path);

            if entry.is_dir() {
                fs::create_dir_all(&output_path)?;
            } else {
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut outfile = fs::File::create(&output_path)?;
                io::copy(&mut entry, &mut outfile)?;
                count += 1;
            }
        }

        log::info!("Extracted {count} files to {}", target_dir.display());
        Ok(target_dir.to_path_buf())
    }

    fn locate(&self, root: &Path) -> Result<PathBuf> {
        let direct = root.join(&self.rel_path);
        if direct.is_file() {
            return Ok(direct);
        }

        // Some exports wrap everything in an extra top-level folder
        let found = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| Some(entry.file_name()) == self.file_name())
            .map(|entry| entry.into_path())
            .find(|path| path.ends_with(&self.rel_path));

        found.ok_or_else(|| {
            ReviewError::NotFound(format!(
                "Could not find '{}' in the extracted export",
                self.rel_path.display()
            ))
        })
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        Ok(())
    }
}

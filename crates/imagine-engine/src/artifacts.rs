use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use imagine_contracts::errors::FileSystemError;

pub trait ArtifactWriter {
    fn write(&self, bytes: &[u8], model_key: &str) -> Result<PathBuf, FileSystemError>;
}

/// `{model_key}_{YYYYMMDD_HHMMSS}.png`, with anything outside `[A-Za-z0-9._-]` in the key
/// replaced so user-chosen deployment names cannot escape the output directory.
pub fn artifact_file_name<Tz: TimeZone>(model_key: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let safe_key: String = model_key
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let safe_key = if safe_key.is_empty() {
        "image".to_string()
    } else {
        safe_key
    };
    format!("{}_{}.png", safe_key, at.format("%Y%m%d_%H%M%S"))
}

pub struct DirectoryArtifactWriter {
    dir: PathBuf,
}

impl DirectoryArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactWriter for DirectoryArtifactWriter {
    fn write(&self, bytes: &[u8], model_key: &str) -> Result<PathBuf, FileSystemError> {
        fs::create_dir_all(&self.dir).map_err(|err| FileSystemError::new(&self.dir, err))?;
        let path = self
            .dir
            .join(artifact_file_name(model_key, &Local::now()));
        fs::write(&path, bytes).map_err(|err| FileSystemError::new(&path, err))?;
        Ok(path)
    }
}

//! Append-only CSV log of [`WeatherRecord`]s.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{error::ArchiveError, model::WeatherRecord};

#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row. The header goes in first when the file is new or empty;
    /// rows already on disk are never touched.
    pub fn append(&self, record: &WeatherRecord) -> Result<(), ArchiveError> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush().map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), header = needs_header, "appended archive row");
        Ok(())
    }

    /// Every record currently in the archive, oldest first. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<WeatherRecord>, ArchiveError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        reader
            .deserialize()
            .collect::<Result<Vec<WeatherRecord>, csv::Error>>()
            .map_err(ArchiveError::from)
    }

    fn io_error(&self, source: std::io::Error) -> ArchiveError {
        ArchiveError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

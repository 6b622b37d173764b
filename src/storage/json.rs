use async_trait::async_trait;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::ScrapeError;
use crate::models::CardRecord;
use crate::storage::CardStore;

/// Card collection stored as a single pretty-printed JSON array.
///
/// Writes go to a temporary file in the target's directory which is then
/// renamed over the target, so readers see either the old file or the new
/// one. File I/O runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn target_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Serialize `cards` into a temporary sibling of the target. Dropping the
    /// returned file without committing removes it.
    fn write_temp(&self, cards: &[CardRecord]) -> Result<NamedTempFile, ScrapeError> {
        let dir = self.target_dir();
        fs::create_dir_all(&dir).map_err(|e| ScrapeError::persistence(&self.path, e))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| ScrapeError::persistence(&self.path, e))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, cards)
                .map_err(|e| ScrapeError::persistence(&self.path, e.into()))?;
            writer.write_all(b"\n").map_err(|e| ScrapeError::persistence(&self.path, e))?;
            writer.flush().map_err(|e| ScrapeError::persistence(&self.path, e))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| ScrapeError::persistence(&self.path, e))?;
        Ok(temp)
    }

    fn commit(&self, temp: NamedTempFile) -> Result<(), ScrapeError> {
        temp.persist(&self.path)
            .map_err(|e| ScrapeError::persistence(&self.path, e.error))?;
        Ok(())
    }
}

#[async_trait]
impl CardStore for JsonFileStore {
    async fn replace_all(&self, cards: &[CardRecord]) -> Result<(), ScrapeError> {
        let store = self.clone();
        let cards = cards.to_vec();
        let saved = tokio::task::spawn_blocking(move || {
            let temp = store.write_temp(&cards)?;
            store.commit(temp)?;
            Ok::<_, ScrapeError>(cards.len())
        })
        .await
        .map_err(|e| ScrapeError::persistence(&self.path, io::Error::new(io::ErrorKind::Other, e)))??;

        info!("Saved {} cards to {}", saved, self.path.display());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<CardRecord>, ScrapeError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No card store at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(ScrapeError::persistence(&self.path, e)),
        };
        serde_json::from_str(&content).map_err(|e| ScrapeError::persistence(&self.path, e.into()))
    }
}

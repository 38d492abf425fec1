use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::board::store::BoardSnapshot;

/// The board lives in a single JSON file. Unlike tasks there is no history to
/// keep, so the whole snapshot is rewritten on every change.
pub struct BoardFile {
    path: PathBuf,
}

impl BoardFile {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("board.json"),
        }
    }

    /// Reads the stored snapshot. `None` means no board has been saved yet.
    pub async fn load(&self) -> Result<Option<BoardSnapshot>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result?;

        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid board file {:?}", self.path))?;
        Ok(Some(snapshot))
    }

    pub async fn save(&self, snapshot: &BoardSnapshot) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .await?;
        file.lock_exclusive()?;
        let result = Self::write_snapshot(&mut file, snapshot).await;
        file.unlock_async().await?;
        result
    }

    async fn write_snapshot(file: &mut File, snapshot: &BoardSnapshot) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(snapshot)?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

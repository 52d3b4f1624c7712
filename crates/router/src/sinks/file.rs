//! FileSink - appends rendered records to one file

use contracts::{ContractError, Sink};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// Sink that appends records to a file opened in append mode
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Open (or create) `path` for appending
    #[instrument(name = "file_sink_open", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            name: name.into(),
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&mut self, rendered: &[u8]) -> std::io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file already closed"))?;
        file.write_all(rendered).await?;
        file.flush().await
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, rendered: &[u8]) -> Result<(), ContractError> {
        self.append(rendered).await.map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Append failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.as_mut() {
            file.flush()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.take() {
            file.sync_all().await?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

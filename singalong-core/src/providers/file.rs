use crate::error::FetchError;
use crate::provider::DocumentSource;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

const LOG_TARGET: &str = "singalong::provider::file";

/// Timing document read from the local filesystem
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DocumentSource for FileDocumentSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        info!(target: LOG_TARGET, "Reading timing document from {}", self.path.display());
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::File {
                path: self.path.clone(),
                source,
            })
    }
}

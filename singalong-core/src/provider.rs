use crate::error::{CoreError, FetchError};
use crate::providers::{FileDocumentSource, HttpDocumentSource};
use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

/// Trait for places a timing document can be fetched from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location for logs
    fn describe(&self) -> String;

    /// Fetch the raw document text
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Pick a document source for `location`.
///
/// `http://` and `https://` URLs are fetched over the network, `file://` URLs
/// and anything that is not a URL are read as local paths.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created or the URL scheme is
/// not supported.
pub fn document_source_for(location: &str) -> Result<Box<dyn DocumentSource>, CoreError> {
    match Url::parse(location) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(Box::new(HttpDocumentSource::new(url)?)),
            "file" => {
                let path = url.to_file_path().map_err(|()| CoreError::ConfigInvalid {
                    message: format!("{location} is not a valid file URL"),
                })?;
                Ok(Box::new(FileDocumentSource::new(path)))
            }
            scheme if scheme.len() == 1 => {
                // Windows drive letter, e.g. C:\lyrics.xml
                Ok(Box::new(FileDocumentSource::new(PathBuf::from(location))))
            }
            scheme => Err(CoreError::ConfigInvalid {
                message: format!("Unsupported lyrics URL scheme: {scheme}"),
            }),
        },
        Err(_) => Ok(Box::new(FileDocumentSource::new(PathBuf::from(location)))),
    }
}

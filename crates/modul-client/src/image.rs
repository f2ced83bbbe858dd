//! Letterhead fetchers
//!
//! A source only returns raw bytes; decoding and sizing happen in the export
//! engine. Every failure is an [`ExportFailure::Image`] so callers can drop
//! the letterhead and keep exporting.

use async_trait::async_trait;
use modul_core::{ExportFailure, ModulError};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Letterheads larger than this are refused
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[async_trait]
pub trait HeaderImageSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, ModulError>;

    /// URL or path, for logs
    fn location(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
    url: String,
}

impl HttpImageSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ModulError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModulError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HeaderImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<Vec<u8>, ModulError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| image_error(format!("fetch {}: {}", self.url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(image_error(format!("fetch {}: HTTP {}", self.url, status)));
        }
        if let Some(declared) = response.content_length() {
            if declared > MAX_IMAGE_BYTES as u64 {
                return Err(too_large(&self.url));
            }
        }

        let mut response = response;
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| image_error(format!("read {}: {}", self.url, e)))?
        {
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(too_large(&self.url));
            }
            bytes.extend_from_slice(&chunk);
        }
        checked(bytes, &self.url)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
    display: String,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl HeaderImageSource for FileImageSource {
    async fn fetch(&self) -> Result<Vec<u8>, ModulError> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| image_error(format!("read {}: {}", self.display, e)))?;
        if meta.len() > MAX_IMAGE_BYTES as u64 {
            return Err(too_large(&self.display));
        }
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| image_error(format!("read {}: {}", self.display, e)))?;
        checked(bytes, &self.display)
    }

    fn location(&self) -> &str {
        &self.display
    }
}

/// Pick a source by scheme: `http(s)://` fetches, `file://` and bare paths read from disk.
pub fn source_for(
    location: &str,
    timeout: Duration,
) -> Result<Arc<dyn HeaderImageSource>, ModulError> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        return Ok(Arc::new(HttpImageSource::new(location, timeout)?));
    }
    let path = location.strip_prefix("file://").unwrap_or(location);
    if path.is_empty() {
        return Err(ModulError::Config("header image location is empty".to_string()));
    }
    Ok(Arc::new(FileImageSource::new(path)))
}

fn checked(bytes: Vec<u8>, location: &str) -> Result<Vec<u8>, ModulError> {
    if bytes.is_empty() {
        return Err(image_error(format!("{} is empty", location)));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(image_error(format!(
            "{} is {} bytes, limit is {}",
            location,
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }
    debug!(location, bytes = bytes.len(), "header image fetched");
    Ok(bytes)
}

fn image_error(detail: String) -> ModulError {
    ExportFailure::Image(detail).into()
}

fn too_large(location: &str) -> ModulError {
    image_error(format!("{} exceeds {} bytes", location, MAX_IMAGE_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_for_schemes() {
        let timeout = Duration::from_secs(5);
        let http = source_for("https://example.org/kop.png", timeout).unwrap();
        assert_eq!(http.location(), "https://example.org/kop.png");

        let file = source_for("file:///srv/kop.png", timeout).unwrap();
        assert_eq!(file.location(), "/srv/kop.png");

        assert!(source_for("  ", timeout).is_err());
    }

    #[test]
    fn test_size_limits() {
        assert!(matches!(
            checked(Vec::new(), "x"),
            Err(ModulError::ExportFailed(ExportFailure::Image(_)))
        ));
        assert!(checked(vec![0; MAX_IMAGE_BYTES + 1], "x").is_err());
        assert_eq!(checked(vec![1, 2], "x").unwrap(), vec![1, 2]);
    }
}

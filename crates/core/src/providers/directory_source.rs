use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::CoreError;
use super::traits::DataSource;

/// Reads the static documents from a local directory (native only).
///
/// A missing file is reported as a 404 fetch error, matching what the HTTP
/// source returns for an absent document.
pub struct DirectoryDataSource {
    root: PathBuf,
}

impl DirectoryDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for DirectoryDataSource {
    fn name(&self) -> &str {
        "Directory"
    }

    async fn fetch(&self, endpoint: &str) -> Result<serde_json::Value, CoreError> {
        let path = self.root.join(endpoint.trim_start_matches('/'));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::Fetch {
                    endpoint: endpoint.to_string(),
                    status: 404,
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

//! Media Catalog Sources
//!
//! Desktop catalog sources: a JSON file read with `tokio::fs`, or an asset
//! compiled into the binary.

use async_trait::async_trait;
use bridge_traits::{
    catalog::CatalogSource,
    error::{BridgeError, Result},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Default asset name of the bundled catalog.
pub const DEFAULT_CATALOG_ASSET: &str = "media.exolist.json";

/// Reads the catalog from a file on disk.
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name only; directories may reveal user names.
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn read_catalog(&self) -> Result<Bytes> {
        debug!(file = %self.file_name(), "Reading catalog file");
        let data = fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotAvailable(format!(
                    "Catalog file not found: {}",
                    self.file_name()
                ))
            } else {
                BridgeError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.file_name())
    }
}

/// Serves a catalog held in memory, typically an `include_bytes!` asset.
#[derive(Clone)]
pub struct BundledCatalogSource {
    name: String,
    data: Bytes,
}

impl BundledCatalogSource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Catalog from a static asset under the default asset name.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::new(DEFAULT_CATALOG_ASSET, Bytes::from_static(data))
    }
}

#[async_trait]
impl CatalogSource for BundledCatalogSource {
    async fn read_catalog(&self) -> Result<Bytes> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        format!("asset:{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_file_catalog_reads_bytes() {
        let path = env::temp_dir().join(format!("catalog-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, br#"[{"url":"a","title":"A","description":"a"}]"#)
            .await
            .unwrap();

        let source = FileCatalogSource::new(&path);
        let data = source.read_catalog().await.unwrap();
        assert!(data.starts_with(b"["));
        assert!(source.describe().starts_with("file:catalog-"));
        assert!(!source.describe().contains(std::path::MAIN_SEPARATOR));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_not_available() {
        let source = FileCatalogSource::new(env::temp_dir().join(format!("{}.json", Uuid::new_v4())));
        let result = source.read_catalog().await;
        match result {
            Err(BridgeError::NotAvailable(message)) => {
                assert!(!message.contains(&*env::temp_dir().to_string_lossy()));
            }
            other => panic!("expected NotAvailable, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_bundled_catalog() {
        let source = BundledCatalogSource::from_static(b"[]");
        assert_eq!(source.read_catalog().await.unwrap(), Bytes::from_static(b"[]"));
        assert_eq!(source.describe(), "asset:media.exolist.json");
    }
}

//! # Media Catalog
//!
//! Parses the bundled media catalog: a JSON array of
//! `{ "url", "title", "description" }` objects. Catalog order is queue order;
//! an item's identity is its index.

use crate::error::{PlaybackError, Result};
use bridge_traits::{catalog::CatalogSource, media_session::QueueEntry, playback::MediaSource};
use core_runtime::logging::{redact_url, strip_path};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A single playable entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl MediaItem {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Engine source for this item.
    pub fn source(&self) -> MediaSource {
        MediaSource::from_uri(self.url.clone())
    }
}

/// Ordered, immutable list of media items. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Arc<[MediaItem]>,
}

impl Catalog {
    /// Build a catalog from items. An empty list is rejected.
    pub fn new(items: Vec<MediaItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(PlaybackError::CatalogUnavailable(
                "catalog contains no media items".to_string(),
            ));
        }
        Ok(Self {
            items: items.into(),
        })
    }

    /// Parse a JSON catalog document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let items: Vec<MediaItem> = serde_json::from_slice(data).map_err(|e| {
            PlaybackError::CatalogUnavailable(format!("malformed catalog: {}", e))
        })?;
        Self::new(items)
    }

    /// Read and parse the catalog from a bridge source.
    #[instrument(skip(source), fields(source = %strip_path(&source.describe())))]
    pub async fn load(source: &dyn CatalogSource) -> Result<Self> {
        let data = source.read_catalog().await.map_err(|e| {
            let described = source.describe();
            PlaybackError::CatalogUnavailable(format!(
                "cannot read {}: {}",
                strip_path(&described),
                e
            ))
        })?;
        let catalog = Self::from_json(&data)?;
        for (index, item) in catalog.items().iter().enumerate() {
            debug!(index, title = %item.title, url = %redact_url(&item.url), "Catalog item");
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Engine queue in catalog order.
    pub fn sources(&self) -> Vec<MediaSource> {
        self.items.iter().map(MediaItem::source).collect()
    }

    /// Queue as published to external controllers.
    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| QueueEntry {
                index,
                description: item.description.clone(),
            })
            .collect()
    }
}

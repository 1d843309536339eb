//! Media Catalog Source
//!
//! Supplies the raw bytes of the bundled media catalog. Parsing happens in the
//! core so every platform accepts exactly the same format: a JSON array of
//! `{ "url", "title", "description" }` objects, in playback order.

use bytes::Bytes;

use crate::{error::Result, platform::PlatformSendSync};

/// Catalog source trait
///
/// - **Android**: reads an asset from the APK (`assets/media.exolist.json`)
/// - **iOS**: reads a file from the app bundle
/// - **Desktop**: reads a file from disk or an embedded resource
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait CatalogSource: PlatformSendSync {
    /// Read the full catalog resource.
    async fn read_catalog(&self) -> Result<Bytes>;

    /// Short description of where the catalog comes from, for logs.
    fn describe(&self) -> String;
}

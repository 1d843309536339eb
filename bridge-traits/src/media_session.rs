//! Media Session Bridge
//!
//! Exposes the current playback session to external controllers: lock screen,
//! quick settings, headset buttons, voice assistants. The core publishes the
//! queue once and pushes metadata on every state change; transport requests
//! coming from controllers are routed back by the host into the coordinator.

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Queue entry as seen by external controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub index: usize,
    pub description: String,
}

/// Metadata for the item currently playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub title: String,
    pub description: String,
    pub queue_index: usize,
    pub is_playing: bool,
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaSession: PlatformSendSync {
    /// Mark the session active under the given tag.
    async fn activate(&self, tag: &str) -> Result<()>;

    /// Publish the queue for controllers that browse it.
    async fn set_queue(&self, entries: Vec<QueueEntry>) -> Result<()>;

    /// Push metadata for the current item.
    async fn update(&self, metadata: SessionMetadata) -> Result<()>;

    /// Deactivate the session and detach it from the player.
    async fn release(&self) -> Result<()>;
}

//! Player engine bridge traits and supporting playback types.
//!
//! These abstractions let the playback coordinator drive a platform media
//! player (ExoPlayer on Android, AVPlayer on iOS, a GStreamer pipeline on
//! desktop) through a consistent, async-first API. The engine owns buffering,
//! decoding, rendering and network retries; the core only sequences transport
//! calls and observes state snapshots.

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for playback sessions owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the engine should treat a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTTP Live Streaming playlist (`.m3u8`).
    Hls,
    /// Plain progressive download (mp4, webm, ...).
    Progressive,
}

/// A single queue entry handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSource {
    /// Playable resource locator.
    pub uri: String,
    /// Source type hint for the engine's media source factory.
    pub kind: SourceKind,
}

impl MediaSource {
    /// Build a source from a URI, detecting HLS playlists by their path suffix.
    ///
    /// Query strings and fragments are ignored when detecting the kind, so
    /// signed playlist URLs are still recognized.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let path = uri
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let kind = if path.ends_with(".m3u8") {
            SourceKind::Hls
        } else {
            SourceKind::Progressive
        };
        Self { uri, kind }
    }

    /// Returns `true` for HLS sources.
    pub fn is_hls(&self) -> bool {
        self.kind == SourceKind::Hls
    }
}

/// Coarse engine state, mirroring the usual idle/buffering/ready/ended model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing prepared, or the engine was released.
    Idle,
    /// Loading media for the current queue item.
    Buffering,
    /// Able to play immediately from the current position.
    Ready,
    /// Reached the end of the last queue item.
    Ended,
}

/// Immutable view of the engine at a point in time.
///
/// Engines publish a new snapshot for every observable change and bump
/// `revision` monotonically, so consumers can discard snapshots that arrive
/// out of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Monotonic revision counter assigned by the engine.
    pub revision: u64,
    /// Current engine state.
    pub state: EngineState,
    /// Index of the current queue item, if the queue is non-empty.
    pub current_index: Option<usize>,
    /// Number of items in the queue.
    pub queue_len: usize,
    /// Whether playback proceeds as soon as the engine is ready.
    pub play_when_ready: bool,
}

impl PlayerSnapshot {
    /// Snapshot of an engine with an empty queue.
    pub fn idle() -> Self {
        Self {
            revision: 0,
            state: EngineState::Idle,
            current_index: None,
            queue_len: 0,
            play_when_ready: false,
        }
    }

    /// Returns `true` when a previous queue item exists.
    pub fn has_previous(&self) -> bool {
        matches!(self.current_index, Some(index) if index > 0)
    }

    /// Returns `true` when a next queue item exists.
    pub fn has_next(&self) -> bool {
        matches!(self.current_index, Some(index) if index + 1 < self.queue_len)
    }

    /// Returns `true` when transport controls should offer "pause".
    pub fn should_show_pause(&self) -> bool {
        self.play_when_ready && matches!(self.state, EngineState::Buffering | EngineState::Ready)
    }

    /// Returns `true` while media is (or is about to be) playing.
    pub fn is_playing(&self) -> bool {
        self.should_show_pause()
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Trait for platform media players driven by the playback coordinator.
///
/// Implementations must be safe to call after [`release`](Self::release);
/// calls on a released engine should fail with
/// [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable)
/// rather than panic.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlayerEngine: PlatformSendSync {
    /// Replace the queue with the given sources, in order.
    async fn set_queue(&self, sources: Vec<MediaSource>) -> Result<()>;

    /// Start loading the current queue item.
    async fn prepare(&self) -> Result<()>;

    /// Begin or resume playback (sets play-when-ready).
    async fn play(&self) -> Result<()>;

    /// Pause playback without releasing resources.
    async fn pause(&self) -> Result<()>;

    /// Move to the next queue item. No-op on the last item.
    async fn seek_to_next(&self) -> Result<()>;

    /// Move to the previous queue item. No-op on the first item.
    async fn seek_to_previous(&self) -> Result<()>;

    /// Jump to an arbitrary queue item.
    async fn seek_to_item(&self, index: usize) -> Result<()>;

    /// Current state of the engine.
    async fn snapshot(&self) -> Result<PlayerSnapshot>;

    /// Subscribe to state changes.
    ///
    /// The returned stream yields snapshots in publication order and closes
    /// when the engine is released.
    async fn subscribe(&self) -> Result<Box<dyn PlayerStateStream>>;

    /// Release all native resources held by the engine.
    async fn release(&self) -> Result<()>;
}

/// Stream of engine state snapshots.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlayerStateStream: PlatformSend {
    /// Get the next snapshot.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<PlayerSnapshot>;
}

/// Creates engine instances. The coordinator creates exactly one engine per
/// playback session.
pub trait PlayerEngineFactory: PlatformSendSync {
    /// Build a fresh engine instance.
    fn create(&self) -> Result<Arc<dyn PlayerEngine>>;
}

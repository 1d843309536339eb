//! # Playback Session
//!
//! The session ties one player engine to the catalog it was queued from. It
//! is owned exclusively by the coordinator; the foreground UI only ever gets
//! a [`PlayerHandle`], which cannot keep the engine alive or release it.

use crate::catalog::Catalog;
use crate::error::{PlaybackError, Result};
use bridge_traits::playback::{MediaSource, PlaybackSessionId, PlayerEngine, PlayerSnapshot};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// The single shared player plus the queue it was built from.
pub struct PlaybackSession {
    id: PlaybackSessionId,
    engine: Arc<dyn PlayerEngine>,
    catalog: Catalog,
    queue: Vec<MediaSource>,
    alive: Arc<AtomicBool>,
}

impl PlaybackSession {
    pub(crate) fn new(engine: Arc<dyn PlayerEngine>, catalog: Catalog, queue: Vec<MediaSource>) -> Self {
        Self {
            id: PlaybackSessionId::new(),
            engine,
            catalog,
            queue,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> PlaybackSessionId {
        self.id
    }

    pub fn engine(&self) -> &Arc<dyn PlayerEngine> {
        &self.engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queue(&self) -> &[MediaSource] {
        &self.queue
    }

    /// Non-owning handle for the foreground UI.
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            session_id: self.id,
            engine: Arc::downgrade(&self.engine),
            alive: Arc::clone(&self.alive),
        }
    }

    /// Invalidate all handles and release the engine.
    pub(crate) async fn release(self) -> Result<()> {
        self.alive.store(false, Ordering::SeqCst);
        self.engine.release().await.map_err(PlaybackError::engine)
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("queue_len", &self.queue.len())
            .field("alive", &self.alive.load(Ordering::SeqCst))
            .finish()
    }
}

/// Non-owning reference to the session's player.
///
/// Every operation fails with [`PlaybackError::SessionNotStarted`] once the
/// session that issued the handle has stopped.
#[derive(Clone)]
pub struct PlayerHandle {
    session_id: PlaybackSessionId,
    engine: Weak<dyn PlayerEngine>,
    alive: Arc<AtomicBool>,
}

impl PlayerHandle {
    pub fn session_id(&self) -> PlaybackSessionId {
        self.session_id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && self.engine.strong_count() > 0
    }

    fn engine(&self) -> Result<Arc<dyn PlayerEngine>> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(PlaybackError::SessionNotStarted);
        }
        self.engine.upgrade().ok_or(PlaybackError::SessionNotStarted)
    }

    pub async fn play(&self) -> Result<()> {
        self.engine()?.play().await.map_err(PlaybackError::engine)
    }

    pub async fn pause(&self) -> Result<()> {
        self.engine()?.pause().await.map_err(PlaybackError::engine)
    }

    pub async fn seek_to_next(&self) -> Result<()> {
        self.engine()?.seek_to_next().await.map_err(PlaybackError::engine)
    }

    pub async fn seek_to_previous(&self) -> Result<()> {
        self.engine()?
            .seek_to_previous()
            .await
            .map_err(PlaybackError::engine)
    }

    pub async fn seek_to_item(&self, index: usize) -> Result<()> {
        self.engine()?
            .seek_to_item(index)
            .await
            .map_err(PlaybackError::engine)
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.engine()?.snapshot().await.map_err(PlaybackError::engine)
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("session_id", &self.session_id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

//! Queue Player Engine
//!
//! A desktop player engine that models queue navigation and transport state
//! without decoding media. Hosts that embed a real pipeline (GStreamer, mpv)
//! implement [`PlayerEngine`] themselves; this engine backs headless daemons,
//! demos and tests.
//!
//! Every observable change bumps the snapshot revision and is published on a
//! `tokio::sync::watch` channel. Releasing the engine drops the sender, which
//! closes all state streams.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    playback::{
        EngineState, MediaSource, PlayerEngine, PlayerEngineFactory, PlayerSnapshot,
        PlayerStateStream,
    },
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

struct EngineInner {
    queue: Vec<MediaSource>,
    snapshot: PlayerSnapshot,
    sender: Option<watch::Sender<PlayerSnapshot>>,
    prepared: bool,
}

impl EngineInner {
    fn ensure_alive(&self) -> Result<()> {
        if self.sender.is_none() {
            return Err(BridgeError::NotAvailable(
                "Player engine has been released".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a change and publish the new snapshot.
    fn publish(&mut self, change: impl FnOnce(&mut PlayerSnapshot)) {
        let mut next = self.snapshot.clone();
        change(&mut next);
        next.revision = self.snapshot.revision + 1;
        self.snapshot = next.clone();
        if let Some(sender) = &self.sender {
            sender.send_replace(next);
        }
    }

    fn move_to(&mut self, index: usize) {
        let prepared = self.prepared;
        self.publish(|s| {
            s.current_index = Some(index);
            s.state = if prepared {
                EngineState::Buffering
            } else {
                EngineState::Idle
            };
        });
        if prepared {
            self.publish(|s| s.state = EngineState::Ready);
        }
    }
}

/// Desktop queue/transport state machine implementing [`PlayerEngine`].
pub struct QueuePlayerEngine {
    inner: Mutex<EngineInner>,
}

impl QueuePlayerEngine {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(PlayerSnapshot::idle());
        Self {
            inner: Mutex::new(EngineInner {
                queue: Vec::new(),
                snapshot: PlayerSnapshot::idle(),
                sender: Some(sender),
                prepared: false,
            }),
        }
    }

    /// Sources currently queued.
    pub fn queue(&self) -> Vec<MediaSource> {
        self.inner.lock().queue.clone()
    }

    pub fn current_snapshot(&self) -> PlayerSnapshot {
        self.inner.lock().snapshot.clone()
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().sender.is_none()
    }

    /// Simulate the current item playing to completion.
    ///
    /// Advances to the next item when there is one, otherwise enters
    /// [`EngineState::Ended`].
    pub fn finish_current(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        let current = inner.snapshot.current_index;
        match current {
            Some(index) if index + 1 < inner.queue.len() => inner.move_to(index + 1),
            Some(_) => inner.publish(|s| s.state = EngineState::Ended),
            None => {}
        }
        Ok(())
    }
}

impl Default for QueuePlayerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerEngine for QueuePlayerEngine {
    async fn set_queue(&self, sources: Vec<MediaSource>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        let len = sources.len();
        debug!(len, hls = sources.iter().filter(|s| s.is_hls()).count(), "Queue replaced");
        inner.queue = sources;
        inner.prepared = false;
        inner.publish(|s| {
            s.queue_len = len;
            s.current_index = if len > 0 { Some(0) } else { None };
            s.state = EngineState::Idle;
        });
        Ok(())
    }

    async fn prepare(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if inner.queue.is_empty() {
            return Err(BridgeError::InvalidData(
                "Cannot prepare an empty queue".to_string(),
            ));
        }
        inner.prepared = true;
        inner.publish(|s| s.state = EngineState::Buffering);
        inner.publish(|s| s.state = EngineState::Ready);
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if inner.snapshot.state == EngineState::Ended {
            // Replay from the start, as a media player does after the last item.
            inner.move_to(0);
        }
        inner.publish(|s| s.play_when_ready = true);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        inner.publish(|s| s.play_when_ready = false);
        Ok(())
    }

    async fn seek_to_next(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        let current = inner.snapshot.current_index;
        if let Some(index) = current {
            if index + 1 < inner.queue.len() {
                inner.move_to(index + 1);
            }
        }
        Ok(())
    }

    async fn seek_to_previous(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        let previous = inner.snapshot.current_index.filter(|&i| i > 0);
        if let Some(index) = previous {
            inner.move_to(index - 1);
        }
        Ok(())
    }

    async fn seek_to_item(&self, index: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_alive()?;
        if index >= inner.queue.len() {
            return Err(BridgeError::InvalidData(format!(
                "Queue index {} out of range (len {})",
                index,
                inner.queue.len()
            )));
        }
        inner.move_to(index);
        Ok(())
    }

    async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let inner = self.inner.lock();
        inner.ensure_alive()?;
        Ok(inner.snapshot.clone())
    }

    async fn subscribe(&self) -> Result<Box<dyn PlayerStateStream>> {
        let inner = self.inner.lock();
        match &inner.sender {
            Some(sender) => Ok(Box::new(WatchStateStream {
                receiver: sender.subscribe(),
            })),
            None => Err(BridgeError::NotAvailable(
                "Player engine has been released".to_string(),
            )),
        }
    }

    async fn release(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.sender.is_none() {
            return Ok(());
        }
        inner.queue.clear();
        inner.prepared = false;
        inner.publish(|s| {
            s.state = EngineState::Idle;
            s.current_index = None;
            s.queue_len = 0;
            s.play_when_ready = false;
        });
        inner.sender = None;
        info!("Player engine released");
        Ok(())
    }
}

/// State stream backed by a watch receiver.
///
/// Only snapshots published after subscription are yielded; intermediate
/// snapshots may be coalesced.
struct WatchStateStream {
    receiver: watch::Receiver<PlayerSnapshot>,
}

#[async_trait]
impl PlayerStateStream for WatchStateStream {
    async fn next(&mut self) -> Option<PlayerSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

/// Creates [`QueuePlayerEngine`] instances and keeps track of them so hosts
/// and tests can inspect the engine a session is using.
#[derive(Default)]
pub struct QueuePlayerEngineFactory {
    created: Mutex<Vec<Arc<QueuePlayerEngine>>>,
}

impl QueuePlayerEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently created engine.
    pub fn last_engine(&self) -> Option<Arc<QueuePlayerEngine>> {
        self.created.lock().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl PlayerEngineFactory for QueuePlayerEngineFactory {
    fn create(&self) -> Result<Arc<dyn PlayerEngine>> {
        let engine = Arc::new(QueuePlayerEngine::new());
        self.created.lock().push(Arc::clone(&engine));
        Ok(engine)
    }
}

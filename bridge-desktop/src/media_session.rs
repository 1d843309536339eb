//! Desktop media session.
//!
//! Records what external controllers would see. Desktop integrations such as
//! MPRIS or the macOS Now Playing center can be layered on top by reading
//! [`DesktopMediaSession::metadata`].

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media_session::{MediaSession, QueueEntry, SessionMetadata},
};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Default)]
struct SessionState {
    tag: Option<String>,
    queue: Vec<QueueEntry>,
    metadata: Option<SessionMetadata>,
    updates: usize,
    released: bool,
}

#[derive(Default)]
pub struct DesktopMediaSession {
    state: Mutex<SessionState>,
}

impl DesktopMediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag of the active session; `None` when inactive.
    pub fn active_tag(&self) -> Option<String> {
        let state = self.state.lock();
        if state.released {
            None
        } else {
            state.tag.clone()
        }
    }

    pub fn queue(&self) -> Vec<QueueEntry> {
        self.state.lock().queue.clone()
    }

    pub fn metadata(&self) -> Option<SessionMetadata> {
        self.state.lock().metadata.clone()
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().updates
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

#[async_trait]
impl MediaSession for DesktopMediaSession {
    async fn activate(&self, tag: &str) -> Result<()> {
        debug!(tag, "Media session active");
        let mut state = self.state.lock();
        *state = SessionState {
            tag: Some(tag.to_string()),
            ..SessionState::default()
        };
        Ok(())
    }

    async fn set_queue(&self, entries: Vec<QueueEntry>) -> Result<()> {
        let mut state = self.state.lock();
        if state.tag.is_none() || state.released {
            return Err(BridgeError::NotAvailable(
                "Media session is not active".to_string(),
            ));
        }
        state.queue = entries;
        Ok(())
    }

    async fn update(&self, metadata: SessionMetadata) -> Result<()> {
        let mut state = self.state.lock();
        if state.released {
            return Err(BridgeError::NotAvailable(
                "Media session was released".to_string(),
            ));
        }
        state.metadata = Some(metadata);
        state.updates += 1;
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        debug!("Media session released");
        self.state.lock().released = true;
        Ok(())
    }
}

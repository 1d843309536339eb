//! Logging Notification Sink
//!
//! Desktop stand-in for a platform notification manager. Every call is logged
//! through `tracing` and recorded, so headless hosts can display or inspect
//! the notification the core would have shown.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::{NotificationChannel, NotificationContent, NotificationId, NotificationSink},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

#[derive(Default)]
struct SinkState {
    channels: HashMap<String, NotificationChannel>,
    visible: HashMap<NotificationId, NotificationContent>,
    history: Vec<(NotificationId, NotificationContent)>,
    cancelled: Vec<NotificationId>,
}

/// Notification sink that logs and records notifications.
#[derive(Default)]
pub struct LoggingNotificationSink {
    state: Mutex<SinkState>,
}

impl LoggingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, id: &str) -> Option<NotificationChannel> {
        self.state.lock().channels.get(id).cloned()
    }

    /// Notification currently shown under `id`, if any.
    pub fn visible(&self, id: NotificationId) -> Option<NotificationContent> {
        self.state.lock().visible.get(&id).cloned()
    }

    pub fn is_visible(&self, id: NotificationId) -> bool {
        self.state.lock().visible.contains_key(&id)
    }

    /// Number of posts, including replacements.
    pub fn post_count(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn last_posted(&self) -> Option<NotificationContent> {
        self.state
            .lock()
            .history
            .last()
            .map(|(_, content)| content.clone())
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancelled.len()
    }
}

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn create_channel(&self, channel: NotificationChannel) -> Result<()> {
        info!(channel_id = %channel.id, name = %channel.name, "Notification channel registered");
        self.state
            .lock()
            .channels
            .insert(channel.id.clone(), channel);
        Ok(())
    }

    async fn post(&self, id: NotificationId, content: NotificationContent) -> Result<()> {
        let actions: Vec<&str> = content.actions.iter().map(|a| a.id()).collect();
        info!(
            notification_id = id,
            title = %content.title,
            ongoing = content.ongoing,
            actions = ?actions,
            compact = ?content.compact_actions,
            "Notification posted"
        );
        let mut state = self.state.lock();
        state.visible.insert(id, content.clone());
        state.history.push((id, content));
        Ok(())
    }

    async fn cancel(&self, id: NotificationId) -> Result<()> {
        let mut state = self.state.lock();
        if state.visible.remove(&id).is_some() {
            info!(notification_id = id, "Notification cancelled");
        }
        state.cancelled.push(id);
        Ok(())
    }
}

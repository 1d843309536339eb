//! Foreground Execution Implementation
//!
//! Desktop processes do not need a foreground service to keep playing, so
//! the host only tracks the requested state. A daemon can wait on
//! [`DesktopForegroundHost::wait_for_stop`] to exit once the core asks to end
//! background execution.

use async_trait::async_trait;
use bridge_traits::{
    background::ForegroundHost,
    error::Result,
    notification::{NotificationContent, NotificationId},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::{debug, info};

/// Foreground host for desktop platforms.
#[derive(Default)]
pub struct DesktopForegroundHost {
    in_foreground: AtomicBool,
    stop_requested: AtomicBool,
    foreground_starts: AtomicUsize,
    notification_id: Mutex<Option<NotificationId>>,
    stopped: Notify,
}

impl DesktopForegroundHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_foreground(&self) -> bool {
        self.in_foreground.load(Ordering::SeqCst)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// How many times foreground execution was entered.
    pub fn foreground_starts(&self) -> usize {
        self.foreground_starts.load(Ordering::SeqCst)
    }

    /// Notification the host is attached to while in the foreground.
    pub fn notification_id(&self) -> Option<NotificationId> {
        *self.notification_id.lock()
    }

    /// Resolves once `stop_self` has been requested.
    pub async fn wait_for_stop(&self) {
        loop {
            let notified = self.stopped.notified();
            if self.stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Clear a previous stop request, e.g. when the host restarts playback.
    pub fn reset(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ForegroundHost for DesktopForegroundHost {
    async fn start_foreground(
        &self,
        notification_id: NotificationId,
        content: &NotificationContent,
    ) -> Result<()> {
        info!(notification_id, title = %content.title, "Entered foreground");
        *self.notification_id.lock() = Some(notification_id);
        self.in_foreground.store(true, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
        self.foreground_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_foreground(&self, remove_notification: bool) -> Result<()> {
        debug!(remove_notification, "Leaving foreground");
        self.in_foreground.store(false, Ordering::SeqCst);
        if remove_notification {
            *self.notification_id.lock() = None;
        }
        Ok(())
    }

    async fn stop_self(&self) -> Result<()> {
        info!("Background execution stop requested");
        self.stop_requested.store(true, Ordering::SeqCst);
        self.stopped.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::notification::ContentIntent;
    use std::sync::Arc;
    use std::time::Duration;

    fn content() -> NotificationContent {
        NotificationContent {
            channel_id: "playback".to_string(),
            title: "A".to_string(),
            text: String::new(),
            large_icon: None,
            actions: Vec::new(),
            compact_actions: Vec::new(),
            ongoing: true,
            content_intent: ContentIntent::OpenPlayerUi,
        }
    }

    #[tokio::test]
    async fn test_foreground_flags() {
        let host = DesktopForegroundHost::new();
        host.start_foreground(3001, &content()).await.unwrap();
        assert!(host.is_foreground());
        assert_eq!(host.notification_id(), Some(3001));
        assert_eq!(host.foreground_starts(), 1);

        host.stop_foreground(true).await.unwrap();
        assert!(!host.is_foreground());
        assert_eq!(host.notification_id(), None);
    }

    #[tokio::test]
    async fn test_wait_for_stop() {
        let host = Arc::new(DesktopForegroundHost::new());
        let waiter = {
            let host = Arc::clone(&host);
            tokio::spawn(async move { host.wait_for_stop().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        host.stop_self().await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(host.stop_requested());

        // Already requested: returns immediately.
        host.wait_for_stop().await;
    }
}

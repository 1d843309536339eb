//! Background Execution
//!
//! Keeps the host process allowed to play media while no UI is visible.

use crate::{
    error::Result,
    notification::{NotificationContent, NotificationId},
    platform::PlatformSendSync,
};

/// Foreground execution host trait
///
/// Abstracts how a platform keeps background playback alive:
/// - **Android**: a foreground `Service` (`startForeground` / `stopForeground` / `stopSelf`)
/// - **iOS**: audio background mode, nothing to start explicitly
/// - **Desktop**: process stays alive; implementations track state only
///
/// # Lifecycle
///
/// The notification presenter calls [`start_foreground`](Self::start_foreground)
/// right after the first notification of a session is posted, and calls
/// [`stop_foreground`](Self::stop_foreground) followed by
/// [`stop_self`](Self::stop_self) once the notification is dismissed. Hosts
/// must tolerate `stop_self` while they are already shutting down.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::ForegroundHost;
///
/// async fn end_background_work(host: &dyn ForegroundHost) -> Result<()> {
///     host.stop_foreground(true).await?;
///     host.stop_self().await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait ForegroundHost: PlatformSendSync {
    /// Promote the host to foreground execution, attached to the given notification.
    async fn start_foreground(
        &self,
        notification_id: NotificationId,
        content: &NotificationContent,
    ) -> Result<()>;

    /// Leave foreground execution, optionally removing the attached notification.
    async fn stop_foreground(&self, remove_notification: bool) -> Result<()>;

    /// Ask the host to end background execution entirely.
    async fn stop_self(&self) -> Result<()>;
}

//! # Notification Presenter
//!
//! Projects player state into the single persistent playback notification
//! and maps taps on its custom action back into transport commands.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized ──activate()──> Active ──dismiss()──> Dismissed
//!        └──────────────────dismiss()───────────────────┘
//! ```
//!
//! `Dismissed` is terminal: a new session builds a new presenter. While
//! `Active`, every snapshot is rendered into a [`NotificationState`], posted
//! through the [`NotificationSink`], and the first post promotes the host to
//! foreground execution. The presenter never holds the playback session; it
//! only sees snapshots and the catalog.

use crate::catalog::Catalog;
use crate::command::{CustomAction, TransportCommand};
use crate::error::{PlaybackError, Result};
use bridge_traits::{
    background::ForegroundHost,
    notification::{ContentIntent, NotificationAction, NotificationContent, NotificationSink},
    playback::PlayerSnapshot,
};
use core_runtime::config::NotificationSettings;
use core_runtime::events::{CoreEvent, EventBus, NotificationEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Maximum number of actions shown in the collapsed notification.
pub const MAX_COMPACT_ACTIONS: usize = 3;

/// Lifecycle of a presenter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenterState {
    Uninitialized,
    Active,
    Dismissed,
}

/// Why the notification was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The coordinator stopped the session.
    SessionStopped,
    /// The user swiped the notification away.
    UserDismissed,
    /// The player has no current item to describe.
    NoPlayableItem,
}

/// What the notification currently shows. Recomputed from every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub queue_index: usize,
    pub title: String,
    pub text: String,
    pub is_playing: bool,
    pub actions: Vec<NotificationAction>,
    pub compact_actions: Vec<usize>,
}

/// Full action set for a snapshot, in display order.
///
/// `Previous` and `Next` only appear when the queue has somewhere to go;
/// exactly one of `Pause`/`Play` is always present.
pub fn available_actions(
    snapshot: &PlayerSnapshot,
    settings: &NotificationSettings,
) -> Vec<NotificationAction> {
    let mut actions = Vec::with_capacity(4);
    if settings.use_previous_action && snapshot.has_previous() {
        actions.push(NotificationAction::Previous);
    }
    if snapshot.should_show_pause() {
        actions.push(NotificationAction::Pause);
    } else {
        actions.push(NotificationAction::Play);
    }
    if settings.use_next_action && snapshot.has_next() {
        actions.push(NotificationAction::Next);
    }
    if settings.use_skip_action {
        actions.push(CustomAction::SkipToNext.notification_action());
    }
    actions
}

/// Indices of the actions shown in the collapsed view.
///
/// At most [`MAX_COMPACT_ACTIONS`] entries ordered
/// `[previous, pause|play, custom]`; absent slots are skipped so the result
/// is compacted to the left.
pub fn action_indices_for_compact_view(actions: &[NotificationAction]) -> Vec<usize> {
    let position = |predicate: fn(&NotificationAction) -> bool| actions.iter().position(predicate);

    let previous = position(|a| matches!(a, NotificationAction::Previous));
    let transport = position(|a| matches!(a, NotificationAction::Pause))
        .or_else(|| position(|a| matches!(a, NotificationAction::Play)));
    let custom = position(NotificationAction::is_custom);

    [previous, transport, custom]
        .into_iter()
        .flatten()
        .take(MAX_COMPACT_ACTIONS)
        .collect()
}

#[derive(Debug)]
struct PresenterInner {
    state: PresenterState,
    last_revision: Option<u64>,
    current: Option<NotificationState>,
    posted: bool,
    in_foreground: bool,
}

/// Renders the playback notification for one session.
pub struct NotificationPresenter {
    catalog: Catalog,
    settings: NotificationSettings,
    sink: Arc<dyn NotificationSink>,
    host: Arc<dyn ForegroundHost>,
    event_bus: EventBus,
    inner: Mutex<PresenterInner>,
}

impl NotificationPresenter {
    pub fn new(
        catalog: Catalog,
        settings: NotificationSettings,
        sink: Arc<dyn NotificationSink>,
        host: Arc<dyn ForegroundHost>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            catalog,
            settings,
            sink,
            host,
            event_bus,
            inner: Mutex::new(PresenterInner {
                state: PresenterState::Uninitialized,
                last_revision: None,
                current: None,
                posted: false,
                in_foreground: false,
            }),
        }
    }

    /// `Uninitialized → Active`. A dismissed presenter stays dismissed.
    pub async fn activate(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            PresenterState::Uninitialized => {
                inner.state = PresenterState::Active;
                debug!("Notification presenter active");
            }
            PresenterState::Active => {}
            PresenterState::Dismissed => {
                warn!("Ignoring activation of a dismissed notification presenter");
            }
        }
    }

    pub async fn state(&self) -> PresenterState {
        self.inner.lock().await.state
    }

    /// Last rendered notification, if one is showing.
    pub async fn current(&self) -> Option<NotificationState> {
        let inner = self.inner.lock().await;
        match inner.state {
            PresenterState::Active => inner.current.clone(),
            _ => None,
        }
    }

    /// Render a snapshot.
    ///
    /// Returns `Ok(None)` when nothing was rendered: the presenter is not
    /// active, the snapshot is older than the last one rendered, or the
    /// player has no playable item (which also dismisses the notification).
    #[instrument(skip(self, snapshot), fields(revision = snapshot.revision))]
    pub async fn on_state_changed(
        &self,
        snapshot: &PlayerSnapshot,
    ) -> Result<Option<NotificationState>> {
        let mut inner = self.inner.lock().await;
        if inner.state != PresenterState::Active {
            return Ok(None);
        }
        if matches!(inner.last_revision, Some(last) if snapshot.revision < last) {
            debug!("Ignoring stale snapshot");
            return Ok(None);
        }

        let item = snapshot
            .current_index
            .and_then(|index| self.catalog.get(index).map(|item| (index, item)));
        let Some((queue_index, item)) = item else {
            info!("No playable item; removing notification");
            self.dismiss_locked(&mut inner, DismissReason::NoPlayableItem)
                .await;
            return Ok(None);
        };

        let actions = available_actions(snapshot, &self.settings);
        let compact_actions = action_indices_for_compact_view(&actions);
        let state = NotificationState {
            queue_index,
            title: item.title.clone(),
            text: item.description.clone(),
            is_playing: snapshot.is_playing(),
            actions,
            compact_actions,
        };
        inner.last_revision = Some(snapshot.revision);

        if inner.in_foreground && inner.current.as_ref() == Some(&state) {
            return Ok(Some(state));
        }

        let content = self.content_for(&state);
        let id = self.settings.notification_id;
        self.sink
            .post(id, content.clone())
            .await
            .map_err(PlaybackError::notification)?;
        inner.posted = true;

        // Retried on the next snapshot until the host accepts.
        if !inner.in_foreground {
            self.host
                .start_foreground(id, &content)
                .await
                .map_err(PlaybackError::notification)?;
            inner.in_foreground = true;
            info!(notification_id = id, title = %state.title, "Playback notification posted");
            self.event_bus
                .emit(CoreEvent::Notification(NotificationEvent::Posted {
                    notification_id: id,
                    title: state.title.clone(),
                }))
                .ok();
        }

        inner.current = Some(state.clone());
        Ok(Some(state))
    }

    /// Map a custom action name to a command. Only the skip action (and its
    /// legacy `"fav"` alias) is recognized.
    pub fn on_custom_action(&self, name: &str) -> Option<TransportCommand> {
        let command = CustomAction::from_name(name).map(TransportCommand::Custom);
        if command.is_none() {
            debug!(action = name, "Unknown custom action");
        }
        command
    }

    /// Tear the notification down and end foreground execution. Idempotent.
    pub async fn dismiss(&self, reason: DismissReason) {
        let mut inner = self.inner.lock().await;
        self.dismiss_locked(&mut inner, reason).await;
    }

    async fn dismiss_locked(&self, inner: &mut PresenterInner, reason: DismissReason) {
        if inner.state == PresenterState::Dismissed {
            return;
        }
        inner.state = PresenterState::Dismissed;
        inner.current = None;

        let id = self.settings.notification_id;
        if inner.posted {
            if let Err(e) = self.sink.cancel(id).await {
                warn!(error = %e, "Failed to cancel playback notification");
            }
            inner.in_foreground = false;
            if let Err(e) = self.host.stop_foreground(true).await {
                warn!(error = %e, "Failed to leave foreground");
            }
            self.event_bus
                .emit(CoreEvent::Notification(NotificationEvent::Dismissed {
                    notification_id: id,
                    by_user: reason == DismissReason::UserDismissed,
                }))
                .ok();
        }
        if let Err(e) = self.host.stop_self().await {
            warn!(error = %e, "Failed to stop background execution");
        }
        info!(?reason, "Playback notification dismissed");
    }

    fn content_for(&self, state: &NotificationState) -> NotificationContent {
        NotificationContent {
            channel_id: self.settings.channel_id.clone(),
            title: state.title.clone(),
            text: state.text.clone(),
            large_icon: self.settings.large_icon.clone(),
            actions: state.actions.clone(),
            compact_actions: state.compact_actions.clone(),
            ongoing: state.is_playing,
            content_intent: ContentIntent::OpenPlayerUi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaItem;
    use bridge_desktop::{DesktopForegroundHost, LoggingNotificationSink};
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::notification::{NotificationChannel, NotificationId};
    use bridge_traits::playback::EngineState;
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Sink {}

        #[async_trait::async_trait]
        impl NotificationSink for Sink {
            async fn create_channel(&self, channel: NotificationChannel) -> BridgeResult<()>;
            async fn post(&self, id: NotificationId, content: NotificationContent) -> BridgeResult<()>;
            async fn cancel(&self, id: NotificationId) -> BridgeResult<()>;
        }
    }

    mock! {
        Host {}

        #[async_trait::async_trait]
        impl ForegroundHost for Host {
            async fn start_foreground(
                &self,
                notification_id: NotificationId,
                content: &NotificationContent,
            ) -> BridgeResult<()>;
            async fn stop_foreground(&self, remove_notification: bool) -> BridgeResult<()>;
            async fn stop_self(&self) -> BridgeResult<()>;
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            MediaItem::new("https://cdn.example.com/a.m3u8", "A", "First video"),
            MediaItem::new("https://cdn.example.com/b.m3u8", "B", "Second video"),
        ])
        .unwrap()
    }

    fn snapshot(revision: u64, index: usize, playing: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            revision,
            state: EngineState::Ready,
            current_index: Some(index),
            queue_len: 2,
            play_when_ready: playing,
        }
    }

    struct Fixture {
        presenter: NotificationPresenter,
        sink: Arc<LoggingNotificationSink>,
        host: Arc<DesktopForegroundHost>,
    }

    fn fixture(settings: NotificationSettings) -> Fixture {
        let sink = Arc::new(LoggingNotificationSink::new());
        let host = Arc::new(DesktopForegroundHost::new());
        let presenter = NotificationPresenter::new(
            catalog(),
            settings,
            sink.clone(),
            host.clone(),
            EventBus::new(16),
        );
        Fixture {
            presenter,
            sink,
            host,
        }
    }

    #[test]
    fn test_actions_first_item_playing() {
        let actions = available_actions(&snapshot(1, 0, true), &NotificationSettings::default());
        assert_eq!(
            actions,
            vec![
                NotificationAction::Pause,
                NotificationAction::Next,
                CustomAction::SkipToNext.notification_action(),
            ]
        );
        assert_eq!(action_indices_for_compact_view(&actions), vec![0, 2]);
    }

    #[test]
    fn test_actions_last_item_paused() {
        let actions = available_actions(&snapshot(1, 1, false), &NotificationSettings::default());
        assert_eq!(
            actions,
            vec![
                NotificationAction::Previous,
                NotificationAction::Play,
                CustomAction::SkipToNext.notification_action(),
            ]
        );
        assert_eq!(action_indices_for_compact_view(&actions), vec![0, 1, 2]);
    }

    #[test]
    fn test_actions_respect_settings() {
        let settings = NotificationSettings {
            use_previous_action: false,
            use_next_action: false,
            use_skip_action: false,
            ..NotificationSettings::default()
        };
        let actions = available_actions(&snapshot(1, 1, true), &settings);
        assert_eq!(actions, vec![NotificationAction::Pause]);
        assert_eq!(action_indices_for_compact_view(&actions), vec![0]);
    }

    #[test]
    fn test_compact_view_never_exceeds_three() {
        let actions = vec![
            NotificationAction::Previous,
            NotificationAction::Pause,
            NotificationAction::Next,
            CustomAction::SkipToNext.notification_action(),
        ];
        let compact = action_indices_for_compact_view(&actions);
        assert_eq!(compact, vec![0, 1, 3]);
        assert!(compact.len() <= MAX_COMPACT_ACTIONS);
        assert!(action_indices_for_compact_view(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_inactive_presenter_renders_nothing() {
        let f = fixture(NotificationSettings::default());
        let rendered = f.presenter.on_state_changed(&snapshot(1, 0, true)).await.unwrap();
        assert!(rendered.is_none());
        assert_eq!(f.sink.post_count(), 0);
    }

    #[tokio::test]
    async fn test_first_render_enters_foreground() {
        let f = fixture(NotificationSettings::default());
        f.presenter.activate().await;

        let state = f
            .presenter
            .on_state_changed(&snapshot(1, 0, true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.title, "A");
        assert_eq!(state.text, "First video");
        assert!(state.is_playing);

        let posted = f.sink.visible(3001).unwrap();
        assert!(posted.ongoing);
        assert_eq!(posted.large_icon.as_deref(), Some("ic_ap"));
        assert_eq!(posted.content_intent, ContentIntent::OpenPlayerUi);
        assert!(f.host.is_foreground());
        assert_eq!(f.host.foreground_starts(), 1);

        f.presenter.on_state_changed(&snapshot(2, 1, true)).await.unwrap();
        assert_eq!(f.host.foreground_starts(), 1);
        assert_eq!(f.sink.visible(3001).unwrap().title, "B");
    }

    #[tokio::test]
    async fn test_stale_snapshot_ignored() {
        let f = fixture(NotificationSettings::default());
        f.presenter.activate().await;
        f.presenter.on_state_changed(&snapshot(5, 1, true)).await.unwrap();

        let stale = f.presenter.on_state_changed(&snapshot(4, 0, true)).await.unwrap();
        assert!(stale.is_none());
        assert_eq!(f.presenter.current().await.unwrap().title, "B");
    }

    #[tokio::test]
    async fn test_identical_snapshot_not_reposted() {
        let f = fixture(NotificationSettings::default());
        f.presenter.activate().await;
        f.presenter.on_state_changed(&snapshot(1, 0, true)).await.unwrap();
        f.presenter.on_state_changed(&snapshot(1, 0, true)).await.unwrap();
        assert_eq!(f.sink.post_count(), 1);
    }

    #[tokio::test]
    async fn test_no_playable_item_dismisses() {
        let f = fixture(NotificationSettings::default());
        f.presenter.activate().await;
        f.presenter.on_state_changed(&snapshot(1, 0, true)).await.unwrap();

        let mut out_of_range = snapshot(2, 0, true);
        out_of_range.current_index = Some(7);
        assert!(f.presenter.on_state_changed(&out_of_range).await.unwrap().is_none());

        assert_eq!(f.presenter.state().await, PresenterState::Dismissed);
        assert!(!f.sink.is_visible(3001));
        assert!(!f.host.is_foreground());
        assert!(f.host.stop_requested());
    }

    #[tokio::test]
    async fn test_dismiss_is_terminal_and_idempotent() {
        let f = fixture(NotificationSettings::default());
        f.presenter.activate().await;
        f.presenter.on_state_changed(&snapshot(1, 0, true)).await.unwrap();

        f.presenter.dismiss(DismissReason::UserDismissed).await;
        f.presenter.dismiss(DismissReason::SessionStopped).await;
        assert_eq!(f.sink.cancel_count(), 1);

        f.presenter.activate().await;
        assert_eq!(f.presenter.state().await, PresenterState::Dismissed);
        assert!(f
            .presenter
            .on_state_changed(&snapshot(2, 1, true))
            .await
            .unwrap()
            .is_none());
        assert!(f.presenter.current().await.is_none());
    }

    #[tokio::test]
    async fn test_dismiss_before_activation() {
        let f = fixture(NotificationSettings::default());
        f.presenter.dismiss(DismissReason::SessionStopped).await;
        assert_eq!(f.presenter.state().await, PresenterState::Dismissed);
        assert_eq!(f.sink.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_action_mapping() {
        let f = fixture(NotificationSettings::default());
        assert_eq!(
            f.presenter.on_custom_action("fav"),
            Some(TransportCommand::Custom(CustomAction::SkipToNext))
        );
        assert_eq!(
            f.presenter.on_custom_action("skip"),
            Some(TransportCommand::Custom(CustomAction::SkipToNext))
        );
        assert_eq!(f.presenter.on_custom_action("like"), None);
    }

    #[tokio::test]
    async fn test_post_failure_is_reported() {
        let mut sink = MockSink::new();
        sink.expect_post()
            .returning(|_, _| Err(BridgeError::OperationFailed("denied".to_string())));
        let presenter = NotificationPresenter::new(
            catalog(),
            NotificationSettings::default(),
            Arc::new(sink),
            Arc::new(DesktopForegroundHost::new()),
            EventBus::new(4),
        );
        presenter.activate().await;

        let result = presenter.on_state_changed(&snapshot(1, 0, true)).await;
        assert!(matches!(result, Err(PlaybackError::NotificationFailed(_))));
    }

    #[tokio::test]
    async fn test_foreground_entry_retried_after_host_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let mut host = MockHost::new();
        host.expect_start_foreground()
            .times(2)
            .returning(move |_, _| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(BridgeError::NotAvailable("not allowed yet".to_string()))
                } else {
                    Ok(())
                }
            });
        host.expect_stop_foreground()
            .times(1)
            .returning(|_| Ok(()));
        host.expect_stop_self().times(1).returning(|| Ok(()));

        let sink = Arc::new(LoggingNotificationSink::new());
        let presenter = NotificationPresenter::new(
            catalog(),
            NotificationSettings::default(),
            sink.clone(),
            Arc::new(host),
            EventBus::new(8),
        );
        presenter.activate().await;

        let first = presenter.on_state_changed(&snapshot(1, 0, true)).await;
        assert!(matches!(first, Err(PlaybackError::NotificationFailed(_))));
        assert!(sink.is_visible(3001));

        let second = presenter.on_state_changed(&snapshot(2, 0, true)).await.unwrap();
        assert_eq!(second.unwrap().title, "A");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // Foreground is held now; an identical snapshot is neither reposted nor re-entered.
        let posts = sink.post_count();
        presenter.on_state_changed(&snapshot(3, 0, true)).await.unwrap();
        assert_eq!(sink.post_count(), posts);

        presenter.dismiss(DismissReason::SessionStopped).await;
        assert!(!sink.is_visible(3001));
    }
}

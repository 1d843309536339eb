//! End-to-end tests of the playback lifecycle against the desktop bridges.

use bridge_desktop::{
    BundledCatalogSource, DesktopForegroundHost, DesktopMediaSession, LoggingNotificationSink,
    QueuePlayerEngineFactory,
};
use bridge_traits::notification::NotificationAction;
use bridge_traits::playback::PlayerEngine;
use core_playback::{
    PlaybackCoordinator, PlaybackError, PresenterState, TransportCommand,
};
use core_runtime::config::{CoreConfig, DEFAULT_NOTIFICATION_ID};
use core_runtime::events::{CoreEvent, NotificationEvent, PlaybackEvent, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

const TWO_ITEMS: &[u8] = br#"[
    {"url": "https://cdn.example.com/a/master.m3u8", "title": "A", "description": "First clip"},
    {"url": "https://cdn.example.com/b/master.m3u8", "title": "B", "description": "Second clip"}
]"#;

struct Harness {
    coordinator: PlaybackCoordinator,
    factory: Arc<QueuePlayerEngineFactory>,
    sink: Arc<LoggingNotificationSink>,
    media_session: Arc<DesktopMediaSession>,
    host: Arc<DesktopForegroundHost>,
}

fn harness(catalog: &'static [u8]) -> Harness {
    let factory = Arc::new(QueuePlayerEngineFactory::new());
    let sink = Arc::new(LoggingNotificationSink::new());
    let media_session = Arc::new(DesktopMediaSession::new());
    let host = Arc::new(DesktopForegroundHost::new());

    let config = CoreConfig::builder()
        .catalog_source(Arc::new(BundledCatalogSource::new(
            "media.exolist.json",
            catalog,
        )))
        .engine_factory(factory.clone())
        .notification_sink(sink.clone())
        .media_session(media_session.clone())
        .foreground_host(host.clone())
        .build()
        .unwrap();

    Harness {
        coordinator: PlaybackCoordinator::new(config),
        factory,
        sink,
        media_session,
        host,
    }
}

fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_for_index(coordinator: &PlaybackCoordinator, index: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(state) = coordinator.notification_state().await {
                if state.queue_index == index {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("notification never reached the expected item");
}

#[tokio::test]
async fn test_start_builds_queue_in_catalog_order() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    let queue = h.coordinator.queue().await;
    let uris: Vec<&str> = queue.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            "https://cdn.example.com/a/master.m3u8",
            "https://cdn.example.com/b/master.m3u8"
        ]
    );

    let engine = h.factory.last_engine().unwrap();
    assert_eq!(engine.queue(), queue);
    assert!(engine.current_snapshot().is_playing());
}

#[tokio::test]
async fn test_start_twice_keeps_one_session() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let handle = h.coordinator.player().await.unwrap();

    h.coordinator.start().await.unwrap();
    let again = h.coordinator.player().await.unwrap();

    assert_eq!(handle.session_id(), again.session_id());
    assert_eq!(h.factory.created_count(), 1);
    assert_eq!(h.host.foreground_starts(), 1);
}

#[tokio::test]
async fn test_empty_catalog_leaves_no_session() {
    let h = harness(b"[]");
    let mut rx = h.coordinator.events().subscribe();

    let result = h.coordinator.start().await;
    assert!(matches!(result, Err(PlaybackError::CatalogUnavailable(_))));
    assert!(h.coordinator.player().await.is_none());
    assert!(!h.coordinator.is_started().await);
    assert_eq!(h.factory.created_count(), 0);
    assert_eq!(h.sink.post_count(), 0);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::Unavailable { .. }))));
}

#[tokio::test]
async fn test_malformed_catalog_leaves_no_session() {
    let h = harness(b"{not json");
    assert!(h.coordinator.start().await.is_err());
    assert!(h.coordinator.player().await.is_none());
}

#[tokio::test]
async fn test_first_notification_describes_first_item() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    let state = h.coordinator.notification_state().await.unwrap();
    assert_eq!(state.queue_index, 0);
    assert_eq!(state.title, "A");
    assert_eq!(state.text, "First clip");
    assert!(state.is_playing);
    assert_eq!(
        state.actions,
        vec![
            NotificationAction::Pause,
            NotificationAction::Next,
            NotificationAction::Custom {
                name: "skip".to_string(),
                label: "Skip".to_string(),
            },
        ]
    );

    let posted = h.sink.visible(DEFAULT_NOTIFICATION_ID).unwrap();
    assert_eq!(posted.title, "A");
    assert!(posted.ongoing);
    assert!(posted.compact_actions.len() <= 3);
    assert!(h.host.is_foreground());
    assert_eq!(h.host.notification_id(), Some(DEFAULT_NOTIFICATION_ID));
}

#[tokio::test]
async fn test_next_updates_notification_and_media_session() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    h.coordinator.handle_command("next").await.unwrap();

    let state = h.coordinator.notification_state().await.unwrap();
    assert_eq!(state.title, "B");
    assert_eq!(state.text, "Second clip");
    assert!(state.actions.contains(&NotificationAction::Previous));
    assert!(!state.actions.contains(&NotificationAction::Next));
    for index in &state.compact_actions {
        assert!(*index < state.actions.len());
    }

    let metadata = h.media_session.metadata().unwrap();
    assert_eq!(metadata.queue_index, 1);
    assert_eq!(metadata.title, "B");
}

#[tokio::test]
async fn test_pause_then_play_toggles_action() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    h.coordinator.handle_command("pause").await.unwrap();
    let paused = h.coordinator.notification_state().await.unwrap();
    assert!(!paused.is_playing);
    assert!(paused.actions.contains(&NotificationAction::Play));
    assert!(!paused.actions.contains(&NotificationAction::Pause));
    assert!(!h.sink.visible(DEFAULT_NOTIFICATION_ID).unwrap().ongoing);

    h.coordinator.handle_command("play").await.unwrap();
    let playing = h.coordinator.notification_state().await.unwrap();
    assert!(playing.actions.contains(&NotificationAction::Pause));
}

#[tokio::test]
async fn test_legacy_fav_action_skips_to_next() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    h.coordinator.handle_command("fav").await.unwrap();

    let state = h.coordinator.notification_state().await.unwrap();
    assert_eq!(state.queue_index, 1);
}

#[tokio::test]
async fn test_unknown_action_is_ignored() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let mut rx = h.coordinator.events().subscribe();
    let before = h.coordinator.notification_state().await;

    h.coordinator.handle_command("rewind").await.unwrap();

    assert_eq!(h.coordinator.notification_state().await, before);
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::CommandIgnored { action }) if action == "rewind"
    )));
}

#[tokio::test]
async fn test_external_controller_skips_to_queue_item() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    h.coordinator
        .execute(TransportCommand::SkipToQueueItem(1))
        .await
        .unwrap();
    h.coordinator.handle_command("previous").await.unwrap();

    assert_eq!(h.coordinator.notification_state().await.unwrap().queue_index, 0);
}

#[tokio::test]
async fn test_engine_progress_reaches_notification() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();

    h.factory.last_engine().unwrap().finish_current().unwrap();

    wait_for_index(&h.coordinator, 1).await;
    assert_eq!(h.media_session.metadata().unwrap().title, "B");
}

#[tokio::test]
async fn test_stop_releases_everything() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let handle = h.coordinator.player().await.unwrap();
    let engine = h.factory.last_engine().unwrap();

    h.coordinator.stop().await.unwrap();

    assert!(engine.is_released());
    assert!(!handle.is_alive());
    assert!(matches!(
        handle.play().await,
        Err(PlaybackError::SessionNotStarted)
    ));
    assert!(h.coordinator.player().await.is_none());
    assert!(h.coordinator.notification_state().await.is_none());
    assert!(!h.sink.is_visible(DEFAULT_NOTIFICATION_ID));
    assert!(!h.host.is_foreground());
    assert!(h.host.stop_requested());
    assert!(h.media_session.is_released());
}

#[tokio::test]
async fn test_stop_without_session_is_noop() {
    let h = harness(TWO_ITEMS);
    h.coordinator.stop().await.unwrap();
    h.coordinator.stop().await.unwrap();
    assert_eq!(h.sink.cancel_count(), 0);
}

#[tokio::test]
async fn test_restart_after_stop_creates_fresh_session() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let first = h.coordinator.session_id().await.unwrap();
    h.coordinator.stop().await.unwrap();

    h.coordinator.start().await.unwrap();
    let second = h.coordinator.session_id().await.unwrap();

    assert_ne!(first, second);
    assert_eq!(h.factory.created_count(), 2);
    assert_eq!(
        h.coordinator.presenter_state().await,
        Some(PresenterState::Active)
    );
    assert!(h.sink.is_visible(DEFAULT_NOTIFICATION_ID));
}

#[tokio::test]
async fn test_user_dismissal_stops_session() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let mut rx = h.coordinator.events().subscribe();

    h.coordinator.on_notification_dismissed().await.unwrap();

    assert!(!h.coordinator.is_started().await);
    assert!(h.host.stop_requested());
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Notification(NotificationEvent::Dismissed { by_user: true, .. })
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::Stopped { .. }))));
}

#[tokio::test]
async fn test_losing_playable_item_tears_session_down() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    let engine = h.factory.last_engine().unwrap();
    let mut rx = h.coordinator.events().subscribe();

    engine.set_queue(vec![]).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while h.coordinator.is_started().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session was never torn down");

    assert!(engine.is_released());
    assert!(h.media_session.is_released());
    assert!(h.coordinator.player().await.is_none());
    assert!(!h.sink.is_visible(DEFAULT_NOTIFICATION_ID));
    assert!(h.host.stop_requested());
    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::Stopped { .. }))));

    h.coordinator.start().await.unwrap();
    assert_eq!(h.factory.created_count(), 2);
    assert!(h.sink.is_visible(DEFAULT_NOTIFICATION_ID));
}

#[tokio::test]
async fn test_commands_after_stop_are_ignored() {
    let h = harness(TWO_ITEMS);
    h.coordinator.start().await.unwrap();
    h.coordinator.stop().await.unwrap();
    let posts = h.sink.post_count();

    h.coordinator.handle_command("next").await.unwrap();

    assert_eq!(h.sink.post_count(), posts);
    assert!(h.coordinator.notification_state().await.is_none());
}

#[tokio::test]
async fn test_lifecycle_events() {
    let h = harness(TWO_ITEMS);
    let mut rx = h.coordinator.events().subscribe();

    h.coordinator.start().await.unwrap();
    h.coordinator.handle_command("next").await.unwrap();
    h.coordinator.stop().await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Session(SessionEvent::Started { queue_len: 2, .. })
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Notification(NotificationEvent::Posted { .. })
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::TrackChanged { queue_index: 1, .. })
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::CommandHandled { command }) if command == "next"
    )));
    assert!(matches!(
        events.last(),
        Some(CoreEvent::Session(SessionEvent::Stopped { .. }))
    ));
}

#[tokio::test]
async fn test_manual_start_without_auto_play() {
    let factory = Arc::new(QueuePlayerEngineFactory::new());
    let config = CoreConfig::builder()
        .catalog_source(Arc::new(BundledCatalogSource::from_static(TWO_ITEMS)))
        .engine_factory(factory.clone())
        .notification_sink(Arc::new(LoggingNotificationSink::new()))
        .media_session(Arc::new(DesktopMediaSession::new()))
        .foreground_host(Arc::new(DesktopForegroundHost::new()))
        .auto_play(false)
        .build()
        .unwrap();
    let coordinator = PlaybackCoordinator::new(config);

    coordinator.start().await.unwrap();

    let state = coordinator.notification_state().await.unwrap();
    assert!(!state.is_playing);
    assert_eq!(state.actions[0], NotificationAction::Play);
}

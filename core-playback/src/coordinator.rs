//! # Playback Coordinator
//!
//! Owns the single playback session and keeps the notification and the media
//! session in step with the player.
//!
//! ## Overview
//!
//! The `PlaybackCoordinator` is the only owner of the player engine. It:
//! - Loads the media catalog through the `CatalogSource` bridge
//! - Creates one engine per session and queues the catalog in order
//! - Publishes the queue and per-item metadata to the `MediaSession`
//! - Activates a `NotificationPresenter` and forwards every engine snapshot to it
//! - Executes transport commands coming from notification taps and controllers
//! - Emits lifecycle events via `EventBus`
//!
//! ## Workflow
//!
//! ### Start
//! 1. Load and parse the catalog (empty or malformed ⇒ no session)
//! 2. Register the notification channel
//! 3. Create the engine, set the queue, prepare, auto-play
//! 4. Activate the media session and publish the queue
//! 5. Construct the session, activate the presenter, render the first notification
//! 6. Spawn the observer task that forwards engine snapshots
//!
//! ### Stop
//! 1. Cancel and join the observer task
//! 2. Dismiss the presenter (notification removed, foreground ended)
//! 3. Release the media session and the engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::PlaybackCoordinator;
//!
//! let coordinator = PlaybackCoordinator::new(config);
//! coordinator.start().await?;
//!
//! if let Some(player) = coordinator.player().await {
//!     player.pause().await?;
//! }
//!
//! coordinator.handle_command("skip").await?;
//! coordinator.stop().await?;
//! ```

use crate::{
    catalog::Catalog,
    command::{CustomAction, TransportCommand},
    notification::{DismissReason, NotificationPresenter, NotificationState, PresenterState},
    session::{PlaybackSession, PlayerHandle},
    PlaybackError, Result,
};
use bridge_traits::{
    error::BridgeError,
    media_session::{MediaSession, SessionMetadata},
    playback::{MediaSource, PlaybackSessionId, PlayerEngine, PlayerSnapshot, PlayerStateStream},
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, SessionEvent};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Everything that exists only while a session runs.
struct ActiveSession {
    session: PlaybackSession,
    presenter: Arc<NotificationPresenter>,
    sync: Arc<SessionSync>,
    observer_token: CancellationToken,
    observer: JoinHandle<()>,
}

type SessionSlot = Mutex<Option<ActiveSession>>;

/// Result of applying one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Continue,
    /// The presenter dismissed itself; the session must be torn down.
    Ended,
}

/// Applies snapshots to the presenter and the media session.
///
/// Shared by the observer task and by [`PlaybackCoordinator::execute`].
struct SessionSync {
    session_id: PlaybackSessionId,
    catalog: Catalog,
    presenter: Arc<NotificationPresenter>,
    media_session: Arc<dyn MediaSession>,
    event_bus: EventBus,
    last_shown: Mutex<Option<(usize, bool)>>,
}

impl SessionSync {
    async fn apply(&self, snapshot: &PlayerSnapshot) -> SyncOutcome {
        let rendered = match self.presenter.on_state_changed(snapshot).await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "Failed to refresh playback notification");
                return SyncOutcome::Continue;
            }
        };
        let Some(state) = rendered else {
            if self.presenter.state().await == PresenterState::Dismissed {
                return SyncOutcome::Ended;
            }
            return SyncOutcome::Continue;
        };

        let metadata = SessionMetadata {
            title: state.title.clone(),
            description: state.text.clone(),
            queue_index: state.queue_index,
            is_playing: state.is_playing,
        };
        if let Err(e) = self.media_session.update(metadata).await {
            warn!(error = %e, "Failed to update media session");
        }

        self.emit_changes(&state).await;
        SyncOutcome::Continue
    }

    async fn emit_changes(&self, state: &NotificationState) {
        let mut last = self.last_shown.lock().await;
        let previous = last.replace((state.queue_index, state.is_playing));
        let session_id = self.session_id.to_string();

        if previous.map(|(index, _)| index) != Some(state.queue_index) {
            debug!(queue_index = state.queue_index, title = %state.title, "Current item changed");
            self.event_bus
                .emit(CoreEvent::Playback(PlaybackEvent::TrackChanged {
                    session_id: session_id.clone(),
                    queue_index: state.queue_index,
                    title: state.title.clone(),
                }))
                .ok();
        }
        if previous.map(|(_, playing)| playing) != Some(state.is_playing) {
            self.event_bus
                .emit(CoreEvent::Playback(PlaybackEvent::PlayStateChanged {
                    session_id,
                    is_playing: state.is_playing,
                }))
                .ok();
        }
    }

    /// Forward engine snapshots until cancelled, the stream closes, or the
    /// presenter ends the session.
    async fn observe(
        self: Arc<Self>,
        mut stream: Box<dyn PlayerStateStream>,
        token: CancellationToken,
        slot: Weak<SessionSlot>,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = stream.next() => match next {
                    Some(snapshot) => {
                        if self.apply(&snapshot).await == SyncOutcome::Ended {
                            self.end_session(slot.clone());
                            break;
                        }
                    }
                    None => {
                        debug!("Player state stream closed");
                        break;
                    }
                },
            }
        }
    }

    /// Tear this session down from outside the observer, which teardown joins.
    fn end_session(&self, slot: Weak<SessionSlot>) {
        let session_id = self.session_id;
        let event_bus = self.event_bus.clone();
        tokio::spawn(async move {
            let Some(slot) = slot.upgrade() else {
                return;
            };
            let mut active = slot.lock().await;
            if active.as_ref().map(|a| a.session.id()) != Some(session_id) {
                return;
            }
            if let Some(session) = active.take() {
                PlaybackCoordinator::teardown(&event_bus, session, DismissReason::NoPlayableItem)
                    .await;
            }
        });
    }
}

/// Coordinates the background playback lifecycle.
pub struct PlaybackCoordinator {
    config: CoreConfig,
    event_bus: EventBus,
    active: Arc<SessionSlot>,
}

impl PlaybackCoordinator {
    /// Create a coordinator with its own event bus.
    pub fn new(config: CoreConfig) -> Self {
        let event_bus = EventBus::new(config.settings.event_buffer_size);
        Self::with_event_bus(config, event_bus)
    }

    /// Create a coordinator publishing on an existing event bus.
    pub fn with_event_bus(config: CoreConfig, event_bus: EventBus) -> Self {
        Self {
            config,
            event_bus,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Event bus carrying session, playback and notification events.
    pub fn events(&self) -> EventBus {
        self.event_bus.clone()
    }

    /// Start the session. Does nothing when a session already runs.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::CatalogUnavailable`] if the catalog is missing, malformed or empty
    /// - [`PlaybackError::EngineFailure`] if the engine cannot be created or prepared
    /// - [`PlaybackError::NotificationFailed`] if the channel cannot be registered
    ///
    /// No session exists after an error.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            debug!("Playback session already running");
            return Ok(());
        }

        match self.create_session().await {
            Ok(session) => {
                *active = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Playback session unavailable");
                self.event_bus
                    .emit(CoreEvent::Session(SessionEvent::Unavailable {
                        reason: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    async fn create_session(&self) -> Result<ActiveSession> {
        let settings = &self.config.settings;

        let catalog = Catalog::load(self.config.catalog_source.as_ref()).await?;

        self.config
            .notification_sink
            .create_channel(settings.notification.channel())
            .await
            .map_err(PlaybackError::notification)?;

        let engine = self
            .config
            .engine_factory
            .create()
            .map_err(PlaybackError::engine)?;
        let queue = catalog.sources();
        if let Err(e) = self.prepare_engine(engine.as_ref(), queue.clone()).await {
            if let Err(release_err) = engine.release().await {
                warn!(error = %release_err, "Failed to release engine after setup failure");
            }
            return Err(PlaybackError::engine(e));
        }

        let media_session = Arc::clone(&self.config.media_session);
        if let Err(e) = media_session.activate(&settings.media_session_tag).await {
            warn!(error = %e, "Failed to activate media session");
        } else if let Err(e) = media_session.set_queue(catalog.queue_entries()).await {
            warn!(error = %e, "Failed to publish media session queue");
        }

        let session = PlaybackSession::new(Arc::clone(&engine), catalog.clone(), queue);

        let presenter = Arc::new(NotificationPresenter::new(
            catalog.clone(),
            settings.notification.clone(),
            Arc::clone(&self.config.notification_sink),
            Arc::clone(&self.config.foreground_host),
            self.event_bus.clone(),
        ));
        presenter.activate().await;

        let sync = Arc::new(SessionSync {
            session_id: session.id(),
            catalog,
            presenter: Arc::clone(&presenter),
            media_session,
            event_bus: self.event_bus.clone(),
            last_shown: Mutex::new(None),
        });

        // Subscribe before the first render so no change is lost in between.
        let stream = engine.subscribe().await;
        match engine.snapshot().await {
            Ok(snapshot) => {
                sync.apply(&snapshot).await;
            }
            Err(e) => warn!(error = %e, "Failed to read initial player state"),
        }

        let observer_token = CancellationToken::new();
        let observer = match stream {
            Ok(stream) => tokio::spawn(Arc::clone(&sync).observe(
                stream,
                observer_token.clone(),
                Arc::downgrade(&self.active),
            )),
            Err(e) => {
                warn!(error = %e, "Player state stream unavailable; notification refreshes on commands only");
                tokio::spawn(async {})
            }
        };

        info!(
            session_id = %session.id(),
            queue_len = session.queue().len(),
            catalog_items = sync.catalog.len(),
            "Playback session started"
        );
        self.event_bus
            .emit(CoreEvent::Session(SessionEvent::Started {
                session_id: session.id().to_string(),
                queue_len: session.queue().len(),
            }))
            .ok();

        Ok(ActiveSession {
            session,
            presenter,
            sync,
            observer_token,
            observer,
        })
    }

    async fn prepare_engine(
        &self,
        engine: &dyn PlayerEngine,
        queue: Vec<MediaSource>,
    ) -> std::result::Result<(), BridgeError> {
        engine.set_queue(queue).await?;
        engine.prepare().await?;
        if self.config.settings.auto_play {
            engine.play().await?;
        }
        Ok(())
    }

    /// Non-owning handle to the player, or `None` without a session.
    pub async fn player(&self) -> Option<PlayerHandle> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.handle())
    }

    /// Tear the session down. Does nothing when no session runs.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(session) => {
                Self::teardown(&self.event_bus, session, DismissReason::SessionStopped).await;
                Ok(())
            }
            None => {
                debug!("No playback session to stop");
                Ok(())
            }
        }
    }

    /// The user swiped the notification away: end foreground execution and
    /// stop the session.
    #[instrument(skip(self))]
    pub async fn on_notification_dismissed(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(session) = active.take() {
            Self::teardown(&self.event_bus, session, DismissReason::UserDismissed).await;
        }
        Ok(())
    }

    async fn teardown(event_bus: &EventBus, active: ActiveSession, reason: DismissReason) {
        let ActiveSession {
            session,
            presenter,
            sync,
            observer_token,
            observer,
        } = active;

        observer_token.cancel();
        if let Err(e) = observer.await {
            error!(error = %e, "Player observer task failed");
        }

        presenter.dismiss(reason).await;

        if let Err(e) = sync.media_session.release().await {
            warn!(error = %e, "Failed to release media session");
        }

        let session_id = session.id();
        if let Err(e) = session.release().await {
            warn!(error = %e, "Failed to release player engine");
        }

        info!(%session_id, ?reason, "Playback session stopped");
        event_bus
            .emit(CoreEvent::Session(SessionEvent::Stopped {
                session_id: session_id.to_string(),
            }))
            .ok();
    }

    /// Execute a notification action by identifier.
    ///
    /// Unknown identifiers and calls without a session are ignored.
    #[instrument(skip(self))]
    pub async fn handle_command(&self, action_id: &str) -> Result<()> {
        match TransportCommand::from_action_id(action_id) {
            Some(command) => self.execute(command).await,
            None => {
                debug!(action = action_id, "Ignoring unknown notification action");
                self.event_bus
                    .emit(CoreEvent::Playback(PlaybackEvent::CommandIgnored {
                        action: action_id.to_string(),
                    }))
                    .ok();
                Ok(())
            }
        }
    }

    /// Run a transport command and refresh the notification from the result.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::EngineFailure`] if the engine rejects the command.
    #[instrument(skip(self), fields(command = %command))]
    pub async fn execute(&self, command: TransportCommand) -> Result<()> {
        let mut slot = self.active.lock().await;
        let Some(active) = slot.as_ref() else {
            debug!("No playback session; command ignored");
            return Ok(());
        };
        let engine = active.session.engine();

        if let TransportCommand::SkipToQueueItem(index) = command {
            if index >= active.session.queue().len() {
                debug!(index, "Queue index out of range; command ignored");
                self.event_bus
                    .emit(CoreEvent::Playback(PlaybackEvent::CommandIgnored {
                        action: command.to_string(),
                    }))
                    .ok();
                return Ok(());
            }
        }

        let result = match command {
            TransportCommand::Play => engine.play().await,
            TransportCommand::Pause => engine.pause().await,
            TransportCommand::Next | TransportCommand::Custom(CustomAction::SkipToNext) => {
                engine.seek_to_next().await
            }
            TransportCommand::Previous => engine.seek_to_previous().await,
            TransportCommand::SkipToQueueItem(index) => engine.seek_to_item(index).await,
        };

        if let Err(e) = result {
            let err = PlaybackError::engine(e);
            error!(error = %err, "Transport command failed");
            self.event_bus
                .emit(CoreEvent::Playback(PlaybackEvent::Error {
                    message: err.to_string(),
                    recoverable: true,
                }))
                .ok();
            return Err(err);
        }

        let outcome = match engine.snapshot().await {
            Ok(snapshot) => active.sync.apply(&snapshot).await,
            Err(e) => {
                warn!(error = %e, "Failed to read player state after command");
                SyncOutcome::Continue
            }
        };

        self.event_bus
            .emit(CoreEvent::Playback(PlaybackEvent::CommandHandled {
                command: command.to_string(),
            }))
            .ok();

        if outcome == SyncOutcome::Ended {
            if let Some(session) = slot.take() {
                Self::teardown(&self.event_bus, session, DismissReason::NoPlayableItem).await;
            }
        }
        Ok(())
    }

    /// Notification currently shown, if any.
    pub async fn notification_state(&self) -> Option<NotificationState> {
        let presenter = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.presenter))?;
        presenter.current().await
    }

    /// State of the current session's presenter, or `None` without a session.
    pub async fn presenter_state(&self) -> Option<PresenterState> {
        let presenter = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.presenter))?;
        Some(presenter.state().await)
    }

    /// Engine queue of the current session, in catalog order.
    pub async fn queue(&self) -> Vec<MediaSource> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.queue().to_vec())
            .unwrap_or_default()
    }

    /// Identifier of the running session.
    pub async fn session_id(&self) -> Option<PlaybackSessionId> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.id())
    }

    /// Whether a session is running.
    pub async fn is_started(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::{
        BundledCatalogSource, DesktopForegroundHost, DesktopMediaSession,
        LoggingNotificationSink, QueuePlayerEngineFactory,
    };
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::playback::PlayerEngineFactory;
    use mockall::mock;

    mock! {
        Engine {}

        #[async_trait]
        impl PlayerEngine for Engine {
            async fn set_queue(&self, sources: Vec<MediaSource>) -> BridgeResult<()>;
            async fn prepare(&self) -> BridgeResult<()>;
            async fn play(&self) -> BridgeResult<()>;
            async fn pause(&self) -> BridgeResult<()>;
            async fn seek_to_next(&self) -> BridgeResult<()>;
            async fn seek_to_previous(&self) -> BridgeResult<()>;
            async fn seek_to_item(&self, index: usize) -> BridgeResult<()>;
            async fn snapshot(&self) -> BridgeResult<PlayerSnapshot>;
            async fn subscribe(&self) -> BridgeResult<Box<dyn PlayerStateStream>>;
            async fn release(&self) -> BridgeResult<()>;
        }
    }

    mock! {
        Factory {}

        impl PlayerEngineFactory for Factory {
            fn create(&self) -> BridgeResult<Arc<dyn PlayerEngine>>;
        }
    }

    const CATALOG: &[u8] = br#"[
        {"url": "https://cdn.example.com/a/master.m3u8", "title": "A", "description": "First"},
        {"url": "https://cdn.example.com/b/master.m3u8", "title": "B", "description": "Second"}
    ]"#;

    fn config_with(catalog: &'static [u8], factory: Arc<dyn PlayerEngineFactory>) -> CoreConfig {
        CoreConfig::builder()
            .catalog_source(Arc::new(BundledCatalogSource::from_static(catalog)))
            .engine_factory(factory)
            .notification_sink(Arc::new(LoggingNotificationSink::new()))
            .media_session(Arc::new(DesktopMediaSession::new()))
            .foreground_host(Arc::new(DesktopForegroundHost::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let factory = Arc::new(QueuePlayerEngineFactory::new());
        let coordinator = PlaybackCoordinator::new(config_with(CATALOG, factory.clone()));

        coordinator.start().await.unwrap();
        let first = coordinator.session_id().await;
        coordinator.start().await.unwrap();

        assert_eq!(coordinator.session_id().await, first);
        assert_eq!(factory.created_count(), 1);
        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_engine_creation_failure_leaves_no_session() {
        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .returning(|| Err(BridgeError::NotAvailable("no decoder".to_string())));
        let coordinator = PlaybackCoordinator::new(config_with(CATALOG, Arc::new(factory)));

        let result = coordinator.start().await;
        assert!(matches!(result, Err(PlaybackError::EngineFailure(_))));
        assert!(!coordinator.is_started().await);
        assert!(coordinator.player().await.is_none());
    }

    #[tokio::test]
    async fn test_prepare_failure_releases_engine() {
        let mut engine = MockEngine::new();
        engine.expect_set_queue().times(1).returning(|_| Ok(()));
        engine
            .expect_prepare()
            .times(1)
            .returning(|| Err(BridgeError::OperationFailed("codec init".to_string())));
        engine.expect_play().never();
        engine.expect_release().times(1).returning(|| Ok(()));
        let engine: Arc<dyn PlayerEngine> = Arc::new(engine);

        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(move || Ok(Arc::clone(&engine)));
        let coordinator = PlaybackCoordinator::new(config_with(CATALOG, Arc::new(factory)));

        let result = coordinator.start().await;
        assert!(matches!(result, Err(PlaybackError::EngineFailure(_))));
        assert!(coordinator.player().await.is_none());
    }

    #[tokio::test]
    async fn test_execute_without_session_is_noop() {
        let factory = Arc::new(QueuePlayerEngineFactory::new());
        let coordinator = PlaybackCoordinator::new(config_with(CATALOG, factory.clone()));

        coordinator.execute(TransportCommand::Next).await.unwrap();
        coordinator.handle_command("pause").await.unwrap();
        assert_eq!(factory.created_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_to_queue_item_out_of_range_is_ignored() {
        let factory = Arc::new(QueuePlayerEngineFactory::new());
        let coordinator = PlaybackCoordinator::new(config_with(CATALOG, factory.clone()));
        coordinator.start().await.unwrap();

        coordinator
            .execute(TransportCommand::SkipToQueueItem(9))
            .await
            .unwrap();
        coordinator
            .execute(TransportCommand::SkipToQueueItem(1))
            .await
            .unwrap();

        let state = coordinator.notification_state().await.unwrap();
        assert_eq!(state.queue_index, 1);
        coordinator.stop().await.unwrap();
    }
}

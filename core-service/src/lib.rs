//! Host-facing service façade for background video playback.
//!
//! The host's background service forwards its lifecycle callbacks to a
//! [`PlaybackService`], which drives the shared
//! [`PlaybackCoordinator`](core_playback::PlaybackCoordinator). Desktop hosts
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! can use [`bootstrap_desktop`]; mobile hosts build a [`CoreConfig`] with
//! their native bridges.

pub mod error;

pub use error::{CoreError, Result};

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use core_playback::{PlaybackCoordinator, PlayerHandle};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// What the host should do if the process is killed while the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    /// Recreate the service once resources allow.
    Sticky,
    NotSticky,
}

/// Intent actions understood by [`PlaybackService::on_start_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceCommand {
    StartForeground,
    StopForeground,
}

impl ServiceCommand {
    pub const START_FOREGROUND_ACTION: &'static str = "START_FOREGROUND_ACTION";
    pub const STOP_FOREGROUND_ACTION: &'static str = "STOP_FOREGROUND_ACTION";

    pub fn parse(action: &str) -> Option<Self> {
        match action {
            Self::START_FOREGROUND_ACTION => Some(ServiceCommand::StartForeground),
            Self::STOP_FOREGROUND_ACTION => Some(ServiceCommand::StopForeground),
            _ => None,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ServiceCommand::StartForeground => Self::START_FOREGROUND_ACTION,
            ServiceCommand::StopForeground => Self::STOP_FOREGROUND_ACTION,
        }
    }
}

/// Returned to a binding client. Holds a non-owning player handle, which is
/// `None` when no session could be started.
#[derive(Debug, Clone)]
pub struct PlayerBinding {
    player: Option<PlayerHandle>,
}

impl PlayerBinding {
    pub fn player(&self) -> Option<&PlayerHandle> {
        self.player.as_ref()
    }

    pub fn into_player(self) -> Option<PlayerHandle> {
        self.player
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct PlaybackService {
    coordinator: Arc<PlaybackCoordinator>,
    bound_clients: Arc<AtomicUsize>,
}

impl PlaybackService {
    /// Create a new service from the provided configuration.
    pub fn new(config: CoreConfig) -> Self {
        Self::from_coordinator(Arc::new(PlaybackCoordinator::new(config)))
    }

    pub fn from_coordinator(coordinator: Arc<PlaybackCoordinator>) -> Self {
        Self {
            coordinator,
            bound_clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn coordinator(&self) -> Arc<PlaybackCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn events(&self) -> EventBus {
        self.coordinator.events()
    }

    /// Number of clients currently bound.
    pub fn bound_clients(&self) -> usize {
        self.bound_clients.load(Ordering::SeqCst)
    }

    /// Service created: start playback. Failures leave the service idle.
    #[instrument(skip(self))]
    pub async fn on_create(&self) {
        if let Err(e) = self.coordinator.start().await {
            warn!(error = %e, "Playback unavailable on create");
        }
    }

    /// Handle a start request carrying an optional intent action.
    #[instrument(skip(self))]
    pub async fn on_start_command(&self, action: Option<&str>) -> StartMode {
        match action.and_then(ServiceCommand::parse) {
            Some(ServiceCommand::StartForeground) => {
                if let Err(e) = self.coordinator.start().await {
                    warn!(error = %e, "Failed to start foreground playback");
                }
            }
            Some(ServiceCommand::StopForeground) => {
                if let Err(e) = self.coordinator.stop().await {
                    warn!(error = %e, "Failed to stop foreground playback");
                }
            }
            None => debug!(?action, "Ignoring start command"),
        }
        StartMode::Sticky
    }

    /// A client binds. Starts playback if needed and hands out the player.
    #[instrument(skip(self))]
    pub async fn on_bind(&self) -> PlayerBinding {
        if let Err(e) = self.coordinator.start().await {
            warn!(error = %e, "Binding without a playback session");
        }
        let clients = self.bound_clients.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(clients, "Client bound");
        PlayerBinding {
            player: self.coordinator.player().await,
        }
    }

    /// A client unbinds. Playback continues; returns the remaining count.
    pub fn on_unbind(&self) -> usize {
        let previous = self
            .bound_clients
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or_else(|n| n);
        let remaining = previous.saturating_sub(1);
        debug!(clients = remaining, "Client unbound");
        remaining
    }

    /// A notification button was tapped.
    pub async fn on_notification_action(&self, action_id: &str) -> Result<()> {
        self.coordinator.handle_command(action_id).await?;
        Ok(())
    }

    /// The user swiped the notification away.
    pub async fn on_notification_dismissed(&self) -> Result<()> {
        self.coordinator.on_notification_dismissed().await?;
        Ok(())
    }

    /// Service destroyed: release everything.
    #[instrument(skip(self))]
    pub async fn on_destroy(&self) -> Result<()> {
        self.coordinator.stop().await?;
        info!("Playback service destroyed");
        Ok(())
    }
}

impl fmt::Debug for PlaybackService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackService")
            .field("bound_clients", &self.bound_clients())
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts reading the catalog from disk.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// let service = core_service::bootstrap_desktop("assets/media.exolist.json")?;
/// service.on_create().await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    catalog_path: impl Into<std::path::PathBuf>,
) -> Result<PlaybackService> {
    let config = CoreConfig::builder().catalog_path(catalog_path).build()?;
    Ok(PlaybackService::new(config))
}

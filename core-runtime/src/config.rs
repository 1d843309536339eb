//! # Core Configuration Module
//!
//! Provides configuration management for the video playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every bridge the coordinator talks to plus the
//! playback settings. It enforces fail-fast validation so a host learns about
//! a missing capability at startup instead of on the first notification.
//!
//! ## Required Dependencies
//!
//! - `CatalogSource` - Bundled media catalog
//!
//! ## Dependencies with desktop defaults
//!
//! - `PlayerEngineFactory` - Native player (desktop default: `QueuePlayerEngineFactory`)
//! - `NotificationSink` - Playback notification (desktop default: `LoggingNotificationSink`)
//! - `MediaSession` - External controllers (desktop default: `DesktopMediaSession`)
//! - `ForegroundHost` - Background execution (desktop default: `DesktopForegroundHost`)
//!
//! When the `desktop-shims` feature is enabled these defaults are injected
//! automatically if not provided, and `catalog_path()` can stand in for an
//! explicit catalog source.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, PlaybackSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .catalog_source(Arc::new(MyAssetCatalog))
//!     .engine_factory(Arc::new(MyExoPlayerFactory))
//!     .notification_sink(Arc::new(MyNotificationManager))
//!     .media_session(Arc::new(MyMediaSession))
//!     .foreground_host(Arc::new(MyService))
//!     .settings(PlaybackSettings::default())
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Fails: no catalog source was provided
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing catalog source");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    CatalogSource, ForegroundHost, MediaSession, NotificationChannel, NotificationId,
    NotificationImportance, NotificationSink, PlayerEngineFactory,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Core configuration for the video playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Bundled media catalog
    pub catalog_source: Arc<dyn CatalogSource>,

    /// Creates one player engine per session
    pub engine_factory: Arc<dyn PlayerEngineFactory>,

    /// Host notification system
    pub notification_sink: Arc<dyn NotificationSink>,

    /// External media controllers
    pub media_session: Arc<dyn MediaSession>,

    /// Foreground/background execution
    pub foreground_host: Arc<dyn ForegroundHost>,

    /// Playback behaviour
    pub settings: PlaybackSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("catalog_source", &self.catalog_source.describe())
            .field("engine_factory", &"PlayerEngineFactory { ... }")
            .field("notification_sink", &"NotificationSink { ... }")
            .field("media_session", &"MediaSession { ... }")
            .field("foreground_host", &"ForegroundHost { ... }")
            .field("settings", &self.settings)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

/// Default notification id used for the playback notification.
pub const DEFAULT_NOTIFICATION_ID: NotificationId = 3001;

/// Default channel id for the playback notification.
pub const DEFAULT_CHANNEL_ID: &str = "com.example.videoplayer";

/// Default media session tag.
pub const DEFAULT_MEDIA_SESSION_TAG: &str = "mediaSession";

/// Playback notification presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub notification_id: NotificationId,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_description: String,
    pub importance: NotificationImportance,
    /// Static large icon resource shown on every notification.
    pub large_icon: Option<String>,
    pub use_previous_action: bool,
    pub use_next_action: bool,
    /// Show the custom skip action.
    pub use_skip_action: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            notification_id: DEFAULT_NOTIFICATION_ID,
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            channel_name: "Video playback".to_string(),
            channel_description: "Controls for background video playback".to_string(),
            importance: NotificationImportance::Low,
            large_icon: Some("ic_ap".to_string()),
            use_previous_action: true,
            use_next_action: true,
            use_skip_action: true,
        }
    }
}

impl NotificationSettings {
    /// Channel definition registered before the first post.
    pub fn channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.channel_id.clone(),
            name: self.channel_name.clone(),
            description: self.channel_description.clone(),
            importance: self.importance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.notification_id == 0 {
            return Err(Error::Config(
                "Notification id must be non-zero (0 is rejected by foreground hosts)".to_string(),
            ));
        }
        if self.channel_id.trim().is_empty() {
            return Err(Error::Config(
                "Notification channel id must not be empty".to_string(),
            ));
        }
        if self.channel_name.trim().is_empty() {
            return Err(Error::Config(
                "Notification channel name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Playback behaviour settings.
///
/// All fields have defaults, so a partial JSON document is accepted:
///
/// ```
/// use core_runtime::config::PlaybackSettings;
///
/// let settings: PlaybackSettings = serde_json::from_str(r#"{ "auto_play": false }"#).unwrap();
/// assert!(!settings.auto_play);
/// assert_eq!(settings.media_session_tag, "mediaSession");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Start playing as soon as the engine is prepared.
    pub auto_play: bool,
    pub media_session_tag: String,
    /// Capacity of the lifecycle event channel.
    pub event_buffer_size: usize,
    pub notification: NotificationSettings,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            auto_play: true,
            media_session_tag: DEFAULT_MEDIA_SESSION_TAG.to_string(),
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
            notification: NotificationSettings::default(),
        }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<()> {
        if self.media_session_tag.trim().is_empty() {
            return Err(Error::Config(
                "Media session tag must not be empty".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be at least 1".to_string(),
            ));
        }
        self.notification.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, role: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature to use the default. \
             Mobile: inject the platform-native implementation.",
            capability, role
        ),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        DesktopForegroundHost, DesktopMediaSession, FileCatalogSource, LoggingNotificationSink,
        QueuePlayerEngineFactory,
    };

    pub(super) fn catalog_source(path: Option<PathBuf>) -> Result<Arc<dyn CatalogSource>> {
        match path {
            Some(path) => Ok(Arc::new(FileCatalogSource::new(path))),
            None => Err(catalog_missing_error()),
        }
    }

    pub(super) fn engine_factory() -> Result<Arc<dyn PlayerEngineFactory>> {
        Ok(Arc::new(QueuePlayerEngineFactory::new()))
    }

    pub(super) fn notification_sink() -> Result<Arc<dyn NotificationSink>> {
        Ok(Arc::new(LoggingNotificationSink::new()))
    }

    pub(super) fn media_session() -> Result<Arc<dyn MediaSession>> {
        Ok(Arc::new(DesktopMediaSession::new()))
    }

    pub(super) fn foreground_host() -> Result<Arc<dyn ForegroundHost>> {
        Ok(Arc::new(DesktopForegroundHost::new()))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub(super) fn catalog_source(path: Option<PathBuf>) -> Result<Arc<dyn CatalogSource>> {
        match path {
            Some(path) => Err(Error::CapabilityMissing {
                capability: "CatalogSource".to_string(),
                message: format!(
                    "catalog_path({}) needs the 'desktop-shims' feature. \
                     Inject a CatalogSource that reads the bundled asset instead.",
                    path.display()
                ),
            }),
            None => Err(catalog_missing_error()),
        }
    }

    pub(super) fn engine_factory() -> Result<Arc<dyn PlayerEngineFactory>> {
        Err(capability_missing("PlayerEngineFactory", "media playback"))
    }

    pub(super) fn notification_sink() -> Result<Arc<dyn NotificationSink>> {
        Err(capability_missing("NotificationSink", "the playback notification"))
    }

    pub(super) fn media_session() -> Result<Arc<dyn MediaSession>> {
        Err(capability_missing("MediaSession", "external media controllers"))
    }

    pub(super) fn foreground_host() -> Result<Arc<dyn ForegroundHost>> {
        Err(capability_missing("ForegroundHost", "background playback"))
    }
}

fn catalog_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CatalogSource".to_string(),
        message: "CatalogSource implementation is required to build the playback queue. \
                  Android: read the bundled asset. Desktop: use catalog_path() with 'desktop-shims'."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the final
/// config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    catalog_source: Option<Arc<dyn CatalogSource>>,
    catalog_path: Option<PathBuf>,
    engine_factory: Option<Arc<dyn PlayerEngineFactory>>,
    notification_sink: Option<Arc<dyn NotificationSink>>,
    media_session: Option<Arc<dyn MediaSession>>,
    foreground_host: Option<Arc<dyn ForegroundHost>>,
    settings: Option<PlaybackSettings>,
}

impl CoreConfigBuilder {
    /// Sets the catalog source implementation (required).
    pub fn catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.catalog_source = Some(source);
        self
    }

    /// Reads the catalog from a JSON file on disk. Requires `desktop-shims`;
    /// ignored when an explicit catalog source is set.
    pub fn catalog_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn engine_factory(mut self, factory: Arc<dyn PlayerEngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn media_session(mut self, session: Arc<dyn MediaSession>) -> Self {
        self.media_session = Some(session);
        self
    }

    pub fn foreground_host(mut self, host: Arc<dyn ForegroundHost>) -> Self {
        self.foreground_host = Some(host);
        self
    }

    pub fn settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Shorthand for toggling `settings.auto_play`.
    pub fn auto_play(mut self, enabled: bool) -> Self {
        self.settings.get_or_insert_with(PlaybackSettings::default).auto_play = enabled;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a bridge is missing and no default exists
    /// - [`Error::Config`] when the settings are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let catalog_source = match self.catalog_source {
            Some(source) => source,
            None => defaults::catalog_source(self.catalog_path)?,
        };

        let engine_factory = match self.engine_factory {
            Some(factory) => factory,
            None => defaults::engine_factory()?,
        };

        let notification_sink = match self.notification_sink {
            Some(sink) => sink,
            None => defaults::notification_sink()?,
        };

        let media_session = match self.media_session {
            Some(session) => session,
            None => defaults::media_session()?,
        };

        let foreground_host = match self.foreground_host {
            Some(host) => host,
            None => defaults::foreground_host()?,
        };

        let config = CoreConfig {
            catalog_source,
            engine_factory,
            notification_sink,
            media_session,
            foreground_host,
            settings: self.settings.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

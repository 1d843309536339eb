//! Notification Bridge
//!
//! Host notification system abstraction. The core renders a single persistent
//! playback notification per session and hands the finished content to the
//! host, which maps it onto the platform API:
//! - **Android**: `NotificationManager` + `MediaStyle` notification channel
//! - **iOS**: Now Playing info center (notification content is advisory)
//! - **Desktop**: Tray/status notifiers or a log sink

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Identifier of a posted notification.
pub type NotificationId = u32;

/// Channel importance. Playback notifications use [`NotificationImportance::Low`]
/// so they never make a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationImportance {
    Min,
    #[default]
    Low,
    Default,
    High,
}

/// Channel the playback notification is posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: NotificationImportance,
}

/// A button on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationAction {
    Previous,
    Play,
    Pause,
    Next,
    /// Application-defined action identified by `name`.
    Custom { name: String, label: String },
}

impl NotificationAction {
    pub const PREVIOUS: &'static str = "previous";
    pub const PLAY: &'static str = "play";
    pub const PAUSE: &'static str = "pause";
    pub const NEXT: &'static str = "next";

    /// Identifier the host sends back when the action is tapped.
    pub fn id(&self) -> &str {
        match self {
            NotificationAction::Previous => Self::PREVIOUS,
            NotificationAction::Play => Self::PLAY,
            NotificationAction::Pause => Self::PAUSE,
            NotificationAction::Next => Self::NEXT,
            NotificationAction::Custom { name, .. } => name,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            NotificationAction::Previous => "Previous",
            NotificationAction::Play => "Play",
            NotificationAction::Pause => "Pause",
            NotificationAction::Next => "Next",
            NotificationAction::Custom { label, .. } => label,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, NotificationAction::Custom { .. })
    }
}

/// What tapping the notification body does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentIntent {
    /// Bring the player UI to the foreground.
    #[default]
    OpenPlayerUi,
}

/// Fully rendered notification handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    /// Static large icon resource name.
    pub large_icon: Option<String>,
    /// Full action set shown in the expanded layout.
    pub actions: Vec<NotificationAction>,
    /// Indices into `actions` shown in the collapsed layout (at most 3).
    pub compact_actions: Vec<usize>,
    /// Whether the user should be prevented from swiping the notification away.
    pub ongoing: bool,
    pub content_intent: ContentIntent,
}

/// Host notification system.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NotificationSink: PlatformSendSync {
    /// Register the channel. Called once per session start; must be idempotent.
    async fn create_channel(&self, channel: NotificationChannel) -> Result<()>;

    /// Post or replace the notification with the given id.
    async fn post(&self, id: NotificationId, content: NotificationContent) -> Result<()>;

    /// Remove the notification with the given id. Removing an unknown id is not an error.
    async fn cancel(&self, id: NotificationId) -> Result<()>;
}

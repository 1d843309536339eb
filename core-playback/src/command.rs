//! Transport commands and the custom notification action.

use bridge_traits::notification::NotificationAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-defined notification action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomAction {
    /// Advance to the next queue item.
    SkipToNext,
}

impl CustomAction {
    /// Canonical identifier of [`CustomAction::SkipToNext`].
    pub const SKIP: &'static str = "skip";
    /// Identifier used by older hosts for the same button.
    pub const LEGACY_FAV: &'static str = "fav";

    /// Resolve an action identifier, accepting the legacy alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            Self::SKIP | Self::LEGACY_FAV => Some(CustomAction::SkipToNext),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CustomAction::SkipToNext => Self::SKIP,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomAction::SkipToNext => "Skip",
        }
    }

    pub fn notification_action(&self) -> NotificationAction {
        NotificationAction::Custom {
            name: self.name().to_string(),
            label: self.label().to_string(),
        }
    }
}

/// A transport request executed against the player engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportCommand {
    Play,
    Pause,
    Next,
    Previous,
    /// Jump to a queue item, as requested by external controllers.
    SkipToQueueItem(usize),
    Custom(CustomAction),
}

impl TransportCommand {
    /// Map a notification action identifier to a command.
    ///
    /// ```
    /// use core_playback::{CustomAction, TransportCommand};
    ///
    /// assert_eq!(TransportCommand::from_action_id("pause"), Some(TransportCommand::Pause));
    /// assert_eq!(
    ///     TransportCommand::from_action_id("fav"),
    ///     Some(TransportCommand::Custom(CustomAction::SkipToNext))
    /// );
    /// assert_eq!(TransportCommand::from_action_id("rewind"), None);
    /// ```
    pub fn from_action_id(id: &str) -> Option<Self> {
        match id {
            NotificationAction::PREVIOUS => Some(TransportCommand::Previous),
            NotificationAction::PLAY => Some(TransportCommand::Play),
            NotificationAction::PAUSE => Some(TransportCommand::Pause),
            NotificationAction::NEXT => Some(TransportCommand::Next),
            other => CustomAction::from_name(other).map(TransportCommand::Custom),
        }
    }
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCommand::Play => write!(f, "play"),
            TransportCommand::Pause => write!(f, "pause"),
            TransportCommand::Next => write!(f, "next"),
            TransportCommand::Previous => write!(f, "previous"),
            TransportCommand::SkipToQueueItem(index) => write!(f, "skip_to_queue_item({})", index),
            TransportCommand::Custom(action) => write!(f, "custom({})", action.name()),
        }
    }
}

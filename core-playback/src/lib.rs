//! # Background Playback
//!
//! Keeps one video queue playing while the host application is in the
//! background, with a media-style notification as the user's only control.
//!
//! ## Overview
//!
//! This crate handles:
//! - Loading the media catalog and building the playback queue
//! - Owning the single player session and handing out non-owning handles
//! - Rendering the playback notification and its compact view
//! - Translating notification taps into transport commands
//!
//! Platform capabilities (engine, notifications, media session, foreground
//! execution) come from `bridge-traits`; wiring happens in
//! [`core_runtime::config::CoreConfig`].

pub mod catalog;
pub mod command;
pub mod coordinator;
pub mod error;
pub mod notification;
pub mod session;

pub use catalog::{Catalog, MediaItem};
pub use command::{CustomAction, TransportCommand};
pub use coordinator::PlaybackCoordinator;
pub use error::{PlaybackError, Result};
pub use notification::{
    action_indices_for_compact_view, available_actions, DismissReason, NotificationPresenter,
    NotificationState, PresenterState, MAX_COMPACT_ACTIONS,
};
pub use session::{PlaybackSession, PlayerHandle};

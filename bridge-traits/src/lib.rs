//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (Android, iOS, desktop).
//!
//! ## Traits
//!
//! ### Media
//! - [`CatalogSource`](catalog::CatalogSource) - Bundled media catalog resource
//! - [`PlayerEngine`](playback::PlayerEngine) - Native media player (queue, transport, state stream)
//! - [`PlayerEngineFactory`](playback::PlayerEngineFactory) - Creates one engine per session
//!
//! ### Platform Integration
//! - [`NotificationSink`](notification::NotificationSink) - Persistent playback notification
//! - [`MediaSession`](media_session::MediaSession) - External media controllers
//! - [`ForegroundHost`](background::ForegroundHost) - Foreground/background execution
//!
//! ### Utilities
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | Android  | TBD                 | 📋 Planned |
//! | iOS      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and include context (resource names, notification ids).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds on native targets so they
//! can be shared across async tasks.

pub mod background;
pub mod catalog;
pub mod error;
pub mod logger;
pub mod media_session;
pub mod notification;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::ForegroundHost;
pub use catalog::CatalogSource;
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media_session::{MediaSession, QueueEntry, SessionMetadata};
pub use notification::{
    ContentIntent, NotificationAction, NotificationChannel, NotificationContent, NotificationId,
    NotificationImportance, NotificationSink,
};
pub use playback::{
    EngineState, MediaSource, PlaybackSessionId, PlayerEngine, PlayerEngineFactory,
    PlayerSnapshot, PlayerStateStream, SourceKind,
};

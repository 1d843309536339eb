//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `CatalogSource` from a file (`tokio::fs`) or a bundled asset
//! - `PlayerEngine` as a queue/transport state machine publishing snapshots
//!   through `tokio::sync::watch`
//! - `NotificationSink` that logs and records notifications
//! - `MediaSession` that records controller-visible state
//! - `ForegroundHost` that tracks foreground state and stop requests
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileCatalogSource, QueuePlayerEngineFactory};
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .catalog_source(Arc::new(FileCatalogSource::new("assets/media.exolist.json")))
//!     .engine_factory(Arc::new(QueuePlayerEngineFactory::new()))
//!     .build()?;
//! ```

mod background;
mod catalog;
mod engine;
mod media_session;
mod notification;

pub use background::DesktopForegroundHost;
pub use catalog::{BundledCatalogSource, FileCatalogSource, DEFAULT_CATALOG_ASSET};
pub use engine::{QueuePlayerEngine, QueuePlayerEngineFactory};
pub use media_session::DesktopMediaSession;
pub use notification::LoggingNotificationSink;

//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the video playback core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback and service
//! crates depend on. It establishes the logging conventions, the bridge
//! wiring performed at configuration time, and the event broadcasting used to
//! report session lifecycle changes to hosts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

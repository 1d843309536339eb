//! Workspace umbrella crate.
//!
//! Re-exports the host-facing crates (`core-service`, `core-playback`) behind
//! the `desktop-shims` feature so hosts can depend on `vpc-workspace` alone
//! instead of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service as service;

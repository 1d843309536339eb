//! # Playback Error Types
//!
//! Error types for the playback coordinator and notification presenter.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur while coordinating background playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The media catalog is missing, unreadable, malformed or empty.
    #[error("Media catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Operation requires a running playback session.
    #[error("No playback session is running")]
    SessionNotStarted,

    /// Action identifier does not map to any transport command.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// The player engine could not be created or rejected a command.
    #[error("Player engine failure: {0}")]
    EngineFailure(String),

    /// The notification could not be posted or removed.
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    /// Any other bridge failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if playback can continue after this error.
    ///
    /// Unrecoverable errors leave the coordinator without a session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::SessionNotStarted
                | PlaybackError::UnknownAction(_)
                | PlaybackError::NotificationFailed(_)
                | PlaybackError::Bridge(_)
        )
    }

    pub(crate) fn engine(err: BridgeError) -> Self {
        PlaybackError::EngineFailure(err.to_string())
    }

    pub(crate) fn notification(err: BridgeError) -> Self {
        PlaybackError::NotificationFailed(err.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(!PlaybackError::CatalogUnavailable("empty".into()).is_recoverable());
        assert!(!PlaybackError::EngineFailure("boom".into()).is_recoverable());
        assert!(PlaybackError::SessionNotStarted.is_recoverable());
        assert!(PlaybackError::notification(BridgeError::OperationFailed("x".into())).is_recoverable());
    }

    #[test]
    fn test_bridge_conversion() {
        let err: PlaybackError = BridgeError::NotAvailable("gone".into()).into();
        assert!(matches!(err, PlaybackError::Bridge(_)));
        assert!(err.to_string().contains("gone"));
    }
}

// Error types for the soundpad session core
//
// This module defines custom error types for engine and asset operations,
// providing structured error handling with stable numeric codes for log
// correlation across worker threads.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// command workers and the presentation layer.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log an audio error with structured context
///
/// Errors are reported through the `log` facade rather than the log relay
/// so that a failure inside the relay itself cannot recurse.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=EngineSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Log an asset error with structured context
pub fn log_asset_error(err: &AssetError, context: &str) {
    error!(
        "Asset error in {}: code={}, component=AssetProvider, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover engine construction, playback calls, and session
/// lifecycle management.
///
/// Error code ranges: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Engine handle could not be constructed
    ConstructionFailed { reason: String },

    /// A playback or stop call on the engine handle failed
    PlaybackFailed { source: String, reason: String },

    /// Releasing the engine handle failed
    ShutdownFailed { reason: String },

    /// Session was shut down under the terminal policy; no new handle
    /// will be constructed
    SessionTerminated,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::ConstructionFailed { .. } => 1001,
            AudioError::PlaybackFailed { .. } => 1002,
            AudioError::ShutdownFailed { .. } => 1003,
            AudioError::SessionTerminated => 1004,
            AudioError::LockPoisoned { .. } => 1005,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::ConstructionFailed { reason } => {
                format!("Failed to construct audio engine: {}", reason)
            }
            AudioError::PlaybackFailed { source, reason } => {
                format!("Playback failed for '{}': {}", source, reason)
            }
            AudioError::ShutdownFailed { reason } => {
                format!("Failed to release audio engine: {}", reason)
            }
            AudioError::SessionTerminated => {
                "Session has been shut down and does not allow restarts".to_string()
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

/// Asset-resolution errors
///
/// These errors cover reads of logical asset names (audio clips and the
/// credits text resource).
///
/// Error code ranges: 2001-2002
#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The named asset does not exist
    NotFound { name: String },

    /// The asset exists but could not be read
    ReadFailed { name: String, reason: String },
}

impl ErrorCode for AssetError {
    fn code(&self) -> i32 {
        match self {
            AssetError::NotFound { .. } => 2001,
            AssetError::ReadFailed { .. } => 2002,
        }
    }

    fn message(&self) -> String {
        match self {
            AssetError::NotFound { name } => format!("Asset not found: {}", name),
            AssetError::ReadFailed { name, reason } => {
                format!("Failed to read asset '{}': {}", name, reason)
            }
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AssetError {}

//! Error types used by the crate.

use thiserror::Error;

use crate::model::QueryCode;

/// Error of a session operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Operation requested while the surface is not in a state that allows it (not rendering,
    /// already destroyed, destroyed while rendering).
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Operation arguments violate the operation contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Operation was superseded on its channel, explicitly cancelled, or the surface was stopped.
    #[error("operation was cancelled")]
    Cancelled,
    /// Search or route calculation backend returned an error code.
    #[error("query failed with code {0}")]
    QueryFailed(QueryCode),
    /// Location access was refused by the user.
    #[error("location permission denied")]
    PermissionDenied,
    /// Native engine reported an error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Error reported by a native engine implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine refused the credential or the request.
    #[error("rejected by engine: {0}")]
    Rejected(String),
    /// The engine could not allocate a rendering surface.
    #[error("rendering surface is not available")]
    SurfaceUnavailable,
    /// A camera animation finished without reaching its target.
    #[error("animation did not complete")]
    AnimationFailed,
}

/// Error of the process-wide engine initialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Empty credential string.
    #[error("engine token is empty")]
    EmptyToken,
    /// [`initialize`](crate::engine::initialize) was already called in this process.
    #[error("engine is already initialized")]
    AlreadyInitialized,
    /// The engine refused the credential.
    #[error("engine rejected the token")]
    Rejected(#[source] EngineError),
}

//! Error types for the gesture core.

use thiserror::Error;

/// Rejected input at the edges of the core: malformed detector output or
/// an unusable launch command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GestureError {
    #[error("expected {expected} landmarks per hand, got {got}")]
    LandmarkCount { expected: usize, got: usize },
    #[error("unknown handedness label: {0:?}")]
    Handedness(String),
    #[error("invalid launch command: {0}")]
    Command(String),
}

/// Failure reported by an external collaborator (volume/brightness sink,
/// process inspector, process launcher).
///
/// The session logs these and carries on; they never change session state.
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("{what} could not be started: {source}")]
    Spawn {
        what:   String,
        #[source]
        source: std::io::Error,
    },
    #[error("{what} exited with {status}")]
    Status { what: String, status: String },
    #[error("{0}")]
    Other(String),
}

pub type GestureResult<T> = Result<T, GestureError>;

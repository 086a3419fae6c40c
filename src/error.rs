use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GestureError {
    #[error("hand landmark set must have {expected} points, got {actual}")]
    MalformedLandmarks { expected: usize, actual: usize },
    #[error("activation set must contain at least one recognizable gesture")]
    InvalidActivation,
    #[error("unknown gesture `{0}`")]
    UnknownGesture(String),
    #[error("invalid trigger timings: {0}")]
    InvalidTimings(&'static str),
}

use thiserror::Error;

/// Raised when a compile context names a stage we do not know.
///
/// There is no fallback stage: routing a vertex error into the fragment
/// buffer is worse than refusing the event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Unknown shader stage name: {0}")]
    UnknownName(String),

    #[error("Unknown shader stage enum: {0:#06x}")]
    UnknownEnum(u32),
}

/// Result alias for stage resolution
pub type StageResult<T> = Result<T, StageError>;

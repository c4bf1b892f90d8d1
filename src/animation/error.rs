//! Error types for keyframe storage, timeline seeking and animation files.

use super::chunk::ChunkTag;
use super::store::KeyframeHandle;
use crate::curve::CurveError;
use crate::schema::ConfigError;

/// Errors that abort an operation on an animation.
///
/// Framing problems (`InvalidSignature`, `ChunkTooLarge`) and I/O failures
/// end a load or save, since the stream position can no longer be trusted.
/// `InvalidHandle` and `InvalidState` report misuse of the in-memory API.
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("File signature does not match an animation file")]
    InvalidSignature,

    #[error("Chunk {tag} declares {length} bytes, limit is {limit}")]
    ChunkTooLarge {
        tag: ChunkTag,
        length: u64,
        limit: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyframe handle {0:?} does not refer to a live keyframe")]
    InvalidHandle(KeyframeHandle),

    #[error("Timeline cursor is past the end of the animation")]
    InvalidState,

    #[error("Keyframe duration must be finite and positive, got {0}")]
    InvalidDuration(f64),

    #[error("Frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f64),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AnimationError>;

/// A recoverable problem with a single chunk during load.
///
/// The offending field is skipped and loading continues with the next chunk.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("Chunk {tag} appeared outside of a keyframe")]
    NoOpenKeyframe { tag: ChunkTag },

    #[error("Duration chunk is incorrectly sized, {length} bytes instead of 8")]
    DurationSize { length: usize },

    #[error("Duration {0} is not a finite positive number of seconds")]
    InvalidDuration(f64),

    #[error("Curve chunk rejected: {0}")]
    Curve(#[from] CurveError),

    #[error("Keyframe started before the previous one was ended")]
    UnterminatedKeyframe,
}

/// A field error together with where in the file it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedField {
    /// Tag of the chunk that was skipped.
    pub tag: ChunkTag,
    /// Index the enclosing keyframe would have in the store, if one was open.
    pub keyframe: Option<usize>,
    /// What was wrong with it.
    pub error: FieldError,
}

//! Keyframe animation: storage, timeline seeking and persistence.
//!
//! A [`KeyframeStore`] holds the ordered keyframes, a [`TimelineCursor`] maps
//! elapsed seconds onto them, and an [`AnimationCodec`] reads and writes them.
//!
//! # File Format
//!
//! Animation files are a signature followed by chunks, until end of stream:
//!
//! ```text
//! Signature: "de Jong Explorer Animation\n\r\xFF\n" (30 bytes)
//!
//! Chunk:
//!   Tag: 4 bytes (ASCII)
//!   Length: u32, big-endian
//!   Payload: Length bytes
//!
//! Per keyframe, in order:
//!   KfrS  start marker (empty)
//!   djPR  parameter text (omitted if empty)
//!   djTH  encoded thumbnail image (omitted if absent)
//!   dura  transition duration, f64 little-endian
//!   splC  curve control points (omitted for the default curve)
//!   KfrE  end marker (empty)
//! ```
//!
//! Unknown chunk types are skipped when loading.

mod chunk;
mod codec;
mod cursor;
mod error;
mod store;

pub use chunk::{Chunk, ChunkTag, read_signature, write_chunk, write_signature};
pub use codec::{
    ANIMATION_SIGNATURE, AnimationCodec, CHUNK_CURVE, CHUNK_DURATION, CHUNK_KEYFRAME_END,
    CHUNK_KEYFRAME_START, CHUNK_PARAMETERS, CHUNK_THUMBNAIL, LoadReport, Record, SaveStats,
};
pub use cursor::{FramePair, Frames, TimelineCursor};
pub use error::{AnimationError, FieldError, Result, SkippedField};
pub use store::{DEFAULT_DURATION, Keyframe, KeyframeHandle, KeyframeStore};

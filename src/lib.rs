//! Keyframe animation engine for parametric attractor explorers.
//!
//! This crate stores timed keyframes of an opaque parameter set, samples the
//! animation at any point in time, and persists it in a chunked binary format.
//!
//! # Architecture
//!
//! - `animation`: keyframe store, timeline cursor, and the file codec
//! - `curve`: interpolation curves warping progress into blend weights
//! - `schema`: configuration and the parameter-set capability
//!
//! # Example
//!
//! ```rust,no_run
//! use attractor_anim::{
//!     animation::{AnimationCodec, KeyframeStore, TimelineCursor},
//!     schema::DeJongParams,
//! };
//!
//! let mut store = KeyframeStore::new();
//! store.append_snapshot(&DeJongParams::default());
//! let key = store.append_snapshot(&DeJongParams { a: 2.0, ..Default::default() });
//! store.set_duration(key, 2.0).unwrap();
//!
//! // Sample halfway through the first transition
//! let cursor = TimelineCursor::at(&store, 2.5);
//! let params: DeJongParams = cursor.sample(&store).unwrap();
//! println!("a = {}", params.a);
//!
//! AnimationCodec::default().save_file(&store, "flight.anim").unwrap();
//! ```

pub mod animation;
pub mod curve;
pub mod schema;

// Re-export commonly used types
pub use animation::{AnimationCodec, AnimationError, Keyframe, KeyframeStore, TimelineCursor};
pub use curve::Spline;
pub use schema::{AnimationConfig, DeJongParams, ParameterSet};

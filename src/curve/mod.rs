//! Interpolation curves that warp keyframe progress into blend weights.

mod spline;

pub use spline::*;

//! Schema module - Configuration and parameter-set types for animations.

mod config;
mod params;

pub use config::*;
pub use params::*;

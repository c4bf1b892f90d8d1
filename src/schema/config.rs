//! Configuration types for keyframe defaults and animation file handling.

use serde::{Deserialize, Serialize};

/// Largest chunk payload accepted on load by default (64 MiB).
pub const DEFAULT_MAX_CHUNK_LEN: u32 = 64 * 1024 * 1024;

fn default_max_chunk_len() -> u32 {
    DEFAULT_MAX_CHUNK_LEN
}

/// Top-level animation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Transition duration in seconds given to newly appended keyframes.
    pub default_duration: f64,
    /// Width of thumbnails rendered for new keyframes.
    pub thumbnail_width: u32,
    /// Height of thumbnails rendered for new keyframes.
    pub thumbnail_height: u32,
    /// Frames per second used when stepping through the animation.
    pub frame_rate: f64,
    /// Container codec settings.
    #[serde(default)]
    pub codec: CodecConfig,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_duration: 5.0,
            thumbnail_width: 128,
            thumbnail_height: 128,
            frame_rate: 30.0,
            codec: CodecConfig::default(),
        }
    }
}

/// What to do with a keyframe whose end marker is missing at end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncatedKeyframePolicy {
    /// Keep the keyframe with whatever fields were read.
    #[default]
    Keep,
    /// Drop the incomplete keyframe.
    Discard,
}

/// Settings for reading and writing animation files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Chunks declaring a longer payload abort the load.
    #[serde(default = "default_max_chunk_len")]
    pub max_chunk_len: u32,
    /// Handling of a trailing keyframe with no end marker.
    #[serde(default)]
    pub truncated_keyframe: TruncatedKeyframePolicy,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            truncated_keyframe: TruncatedKeyframePolicy::Keep,
        }
    }
}

impl AnimationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.default_duration.is_finite() && self.default_duration > 0.0) {
            return Err(ConfigError::InvalidDuration(self.default_duration));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(ConfigError::InvalidThumbnailSize);
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        if self.codec.max_chunk_len == 0 {
            return Err(ConfigError::InvalidChunkLimit);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Default duration must be finite and positive, got {0}")]
    InvalidDuration(f64),
    #[error("Thumbnail dimensions must be non-zero")]
    InvalidThumbnailSize,
    #[error("Frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f64),
    #[error("Maximum chunk length must be non-zero")]
    InvalidChunkLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnimationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_duration, 5.0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AnimationConfig {
            default_duration: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidDuration(0.0)));

        config.default_duration = 1.0;
        config.thumbnail_height = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThumbnailSize));

        config.thumbnail_height = 64;
        config.frame_rate = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFrameRate(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_and_defaults() {
        let config = AnimationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnimationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // Codec section is optional
        let parsed: AnimationConfig = serde_json::from_str(
            r#"{"default_duration": 2.5, "thumbnail_width": 64,
                "thumbnail_height": 48, "frame_rate": 24.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.codec, CodecConfig::default());

        let parsed: CodecConfig =
            serde_json::from_str(r#"{"truncated_keyframe": "discard"}"#).unwrap();
        assert_eq!(parsed.truncated_keyframe, TruncatedKeyframePolicy::Discard);
        assert_eq!(parsed.max_chunk_len, DEFAULT_MAX_CHUNK_LEN);
    }
}

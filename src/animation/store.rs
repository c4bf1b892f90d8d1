//! Ordered keyframe storage with generation-checked handles.

use log::debug;

use super::error::{AnimationError, Result};
use crate::curve::Spline;
use crate::schema::{AnimationConfig, ParameterSet, Thumbnail};

/// Transition duration given to keyframes when nothing else is configured.
pub const DEFAULT_DURATION: f64 = 5.0;

/// Stable reference to a keyframe, invalidated by [`KeyframeStore::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyframeHandle {
    index: u32,
    generation: u32,
}

impl KeyframeHandle {
    /// Position of the keyframe in the timeline.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// One authored point in the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    parameters: Vec<u8>,
    thumbnail: Option<Thumbnail>,
    /// Seconds spent transitioning to the next keyframe.
    duration: f64,
    curve: Spline,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            thumbnail: None,
            duration: DEFAULT_DURATION,
            curve: Spline::smooth(),
        }
    }
}

impl Keyframe {
    /// Empty keyframe with the given transition duration.
    pub fn with_duration(duration: f64) -> Result<Self> {
        let mut keyframe = Self::default();
        keyframe.set_duration(duration)?;
        Ok(keyframe)
    }

    pub fn parameters(&self) -> &[u8] {
        &self.parameters
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn curve(&self) -> &Spline {
        &self.curve
    }

    pub fn set_parameters(&mut self, parameters: Vec<u8>) {
        self.parameters = parameters;
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<Thumbnail>) {
        self.thumbnail = thumbnail;
    }

    /// Set the transition duration. Zero, negative and non-finite values are rejected.
    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        if !is_valid_duration(duration) {
            return Err(AnimationError::InvalidDuration(duration));
        }
        self.duration = duration;
        Ok(())
    }

    pub fn set_curve(&mut self, curve: Spline) {
        self.curve = curve;
    }

    /// Curve-warped blend weight after `offset` seconds into this keyframe.
    pub fn weight_at(&self, offset: f64) -> f64 {
        let progress = (offset / self.duration).clamp(0.0, 1.0);
        self.curve.evaluate(progress)
    }
}

pub(crate) fn is_valid_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Ordered collection of keyframes; insertion order is temporal order.
///
/// Usage:
/// ```ignore
/// let mut store = KeyframeStore::new();
/// let key = store.append_default();
/// store.set_duration(key, 2.0)?;
/// store.set_parameters(key, params.save())?;
/// assert_eq!(store.total_length(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
    /// Bumped by `clear` so that older handles stop resolving.
    generation: u32,
    default_duration: f64,
    thumbnail_size: (u32, u32),
}

impl Default for KeyframeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeStore {
    /// Create an empty store with default settings.
    pub fn new() -> Self {
        let config = AnimationConfig::default();
        Self {
            keyframes: Vec::new(),
            generation: 0,
            default_duration: config.default_duration,
            thumbnail_size: (config.thumbnail_width, config.thumbnail_height),
        }
    }

    /// Create an empty store using the keyframe defaults from `config`.
    pub fn from_config(config: &AnimationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            keyframes: Vec::new(),
            generation: 0,
            default_duration: config.default_duration,
            thumbnail_size: (config.thumbnail_width, config.thumbnail_height),
        })
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Duration given to keyframes created by [`KeyframeStore::append_default`].
    pub fn default_duration(&self) -> f64 {
        self.default_duration
    }

    /// A keyframe carrying this store's defaults, not yet part of the store.
    pub fn new_keyframe(&self) -> Keyframe {
        Keyframe {
            duration: self.default_duration,
            ..Keyframe::default()
        }
    }

    /// Append a keyframe with the default duration and curve, no parameters
    /// and no thumbnail.
    pub fn append_default(&mut self) -> KeyframeHandle {
        let keyframe = self.new_keyframe();
        self.append(keyframe)
    }

    /// Append a fully built keyframe.
    pub fn append(&mut self, keyframe: Keyframe) -> KeyframeHandle {
        let index = self.keyframes.len() as u32;
        self.keyframes.push(keyframe);
        KeyframeHandle {
            index,
            generation: self.generation,
        }
    }

    /// Append a keyframe holding a snapshot of `params` and its thumbnail.
    pub fn append_snapshot<P: ParameterSet>(&mut self, params: &P) -> KeyframeHandle {
        let handle = self.append_default();
        let keyframe = &mut self.keyframes[handle.index()];
        keyframe.parameters = params.save();
        keyframe.thumbnail = params.make_thumbnail(self.thumbnail_size.0, self.thumbnail_size.1);
        handle
    }

    /// Remove every keyframe. All outstanding handles become invalid.
    pub fn clear(&mut self) {
        debug!("Clearing {} keyframes", self.keyframes.len());
        self.keyframes.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Total animation length in seconds.
    pub fn total_length(&self) -> f64 {
        self.keyframes.iter().map(|k| k.duration).sum()
    }

    /// Absolute time in seconds at which the keyframe begins.
    pub fn start_time(&self, handle: KeyframeHandle) -> Result<f64> {
        self.resolve(handle)?;
        Ok(self.keyframes[..handle.index()]
            .iter()
            .map(|k| k.duration)
            .sum())
    }

    /// Copy of a keyframe.
    pub fn get(&self, handle: KeyframeHandle) -> Result<Keyframe> {
        self.keyframe(handle).cloned()
    }

    /// Read-only view of a keyframe.
    pub fn keyframe(&self, handle: KeyframeHandle) -> Result<&Keyframe> {
        let index = self.resolve(handle)?;
        Ok(&self.keyframes[index])
    }

    /// Read-only view of the keyframe at `index`.
    pub fn at(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    /// Handle for the keyframe at `index`.
    pub fn handle(&self, index: usize) -> Option<KeyframeHandle> {
        (index < self.keyframes.len()).then(|| KeyframeHandle {
            index: index as u32,
            generation: self.generation,
        })
    }

    /// Handles for all keyframes, in order.
    pub fn handles(&self) -> impl Iterator<Item = KeyframeHandle> + '_ {
        (0..self.keyframes.len()).map(|index| KeyframeHandle {
            index: index as u32,
            generation: self.generation,
        })
    }

    /// Iterate over keyframes in timeline order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Keyframe> {
        self.keyframes.iter()
    }

    pub fn set_parameters(&mut self, handle: KeyframeHandle, parameters: Vec<u8>) -> Result<()> {
        self.keyframe_mut(handle)?.set_parameters(parameters);
        Ok(())
    }

    pub fn set_thumbnail(
        &mut self,
        handle: KeyframeHandle,
        thumbnail: Option<Thumbnail>,
    ) -> Result<()> {
        self.keyframe_mut(handle)?.set_thumbnail(thumbnail);
        Ok(())
    }

    pub fn set_duration(&mut self, handle: KeyframeHandle, duration: f64) -> Result<()> {
        self.keyframe_mut(handle)?.set_duration(duration)
    }

    pub fn set_curve(&mut self, handle: KeyframeHandle, curve: Spline) -> Result<()> {
        self.keyframe_mut(handle)?.set_curve(curve);
        Ok(())
    }

    /// Store a parameter set and a freshly rendered thumbnail in a keyframe.
    pub fn store_params<P: ParameterSet>(&mut self, handle: KeyframeHandle, params: &P) -> Result<()> {
        let (width, height) = self.thumbnail_size;
        let keyframe = self.keyframe_mut(handle)?;
        keyframe.parameters = params.save();
        keyframe.thumbnail = params.make_thumbnail(width, height);
        Ok(())
    }

    /// Load a keyframe's parameters into an existing parameter set.
    pub fn load_params<P: ParameterSet>(&self, handle: KeyframeHandle, params: &mut P) -> Result<()> {
        params.load(self.keyframe(handle)?.parameters());
        Ok(())
    }

    fn keyframe_mut(&mut self, handle: KeyframeHandle) -> Result<&mut Keyframe> {
        let index = self.resolve(handle)?;
        Ok(&mut self.keyframes[index])
    }

    fn resolve(&self, handle: KeyframeHandle) -> Result<usize> {
        if handle.generation != self.generation || handle.index() >= self.keyframes.len() {
            return Err(AnimationError::InvalidHandle(handle));
        }
        Ok(handle.index())
    }
}

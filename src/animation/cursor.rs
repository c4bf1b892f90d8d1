//! Time-position cursor over a keyframe store.

use std::marker::PhantomData;

use log::warn;

use super::error::{AnimationError, Result};
use super::store::{KeyframeHandle, KeyframeStore};
use crate::schema::ParameterSet;

/// Parameter sets at the start and end of one rendered frame.
///
/// Renderers integrate between the two to produce motion blur.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePair<P> {
    pub start: P,
    pub end: P,
}

/// A position in an animation: the current keyframe plus seconds elapsed in it.
///
/// The cursor does not borrow the store; every operation takes the store it
/// should be evaluated against. Once it runs past the last keyframe it becomes
/// invalid and stays so until [`seek_to_start`](Self::seek_to_start) or
/// [`seek_absolute`](Self::seek_absolute).
///
/// Usage:
/// ```ignore
/// let mut cursor = TimelineCursor::start(&store);
/// while let Some(frame) = cursor.read_frame::<DeJongParams>(&store, 30.0)? {
///     render_blurred(&frame.start, &frame.end);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineCursor {
    position: usize,
    local_offset: f64,
    valid: bool,
}

impl TimelineCursor {
    /// Cursor at time 0.
    pub fn start(store: &KeyframeStore) -> Self {
        let mut cursor = Self {
            position: 0,
            local_offset: 0.0,
            valid: false,
        };
        cursor.seek_to_start(store);
        cursor
    }

    /// Cursor at an absolute time in seconds.
    pub fn at(store: &KeyframeStore, time: f64) -> Self {
        let mut cursor = Self::start(store);
        cursor.seek_relative(store, time);
        cursor
    }

    /// Whether the cursor denotes a real keyframe.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Index of the current keyframe, `None` past the end.
    pub fn position(&self) -> Option<usize> {
        self.valid.then_some(self.position)
    }

    /// Seconds elapsed since the current keyframe started.
    pub fn local_offset(&self) -> f64 {
        self.local_offset
    }

    /// Handle of the current keyframe.
    pub fn current(&self, store: &KeyframeStore) -> Option<KeyframeHandle> {
        self.position().and_then(|index| store.handle(index))
    }

    /// Absolute time in seconds, `None` past the end.
    pub fn absolute_time(&self, store: &KeyframeStore) -> Option<f64> {
        let index = self.position()?;
        let start: f64 = store.iter().take(index).map(|k| k.duration()).sum();
        Some(start + self.local_offset)
    }

    pub fn seek_to_start(&mut self, store: &KeyframeStore) {
        self.position = 0;
        self.local_offset = 0.0;
        self.valid = !store.is_empty();
    }

    /// Move to an absolute time. Negative times clamp to the start.
    pub fn seek_absolute(&mut self, store: &KeyframeStore, time: f64) {
        self.seek_to_start(store);
        self.seek_relative(store, time);
    }

    /// Move forward or backward by `delta` seconds.
    ///
    /// Moving back before the first keyframe stops at time 0. Moving past the
    /// end of the last keyframe invalidates the cursor. An invalid cursor
    /// ignores relative seeks.
    pub fn seek_relative(&mut self, store: &KeyframeStore, delta: f64) {
        if delta.is_nan() {
            warn!("Ignoring NaN seek");
            return;
        }
        if !self.valid {
            return;
        }
        self.local_offset += delta;
        self.normalize(store);
    }

    /// Bring `local_offset` back into `[0, duration)` of the current keyframe.
    fn normalize(&mut self, store: &KeyframeStore) {
        while self.valid {
            let Some(duration) = store.at(self.position).map(|k| k.duration()) else {
                // Store shrank underneath us
                self.valid = false;
                break;
            };

            if self.local_offset >= duration {
                self.local_offset -= duration;
                self.position += 1;
                if self.position >= store.len() {
                    self.valid = false;
                }
            } else if self.local_offset < 0.0 {
                if self.position == 0 {
                    self.local_offset = 0.0;
                } else {
                    self.position -= 1;
                    self.local_offset += store.at(self.position).map_or(0.0, |k| k.duration());
                }
            } else {
                break;
            }
        }
    }

    /// Curve-warped progress through the current keyframe, in [0, 1].
    pub fn interpolation_weight(&self, store: &KeyframeStore) -> Result<f64> {
        let keyframe = self
            .position()
            .and_then(|index| store.at(index))
            .ok_or(AnimationError::InvalidState)?;
        Ok(keyframe.weight_at(self.local_offset))
    }

    /// Blend the current keyframe's parameters with the next one's.
    ///
    /// The last keyframe blends with itself, so it holds steady.
    pub fn sample<P: ParameterSet>(&self, store: &KeyframeStore) -> Result<P> {
        let index = self.position().ok_or(AnimationError::InvalidState)?;
        let current = store.at(index).ok_or(AnimationError::InvalidState)?;
        let weight = current.weight_at(self.local_offset);

        let a = P::from_bytes(current.parameters());
        let blended = match store.at(index + 1) {
            Some(next) => P::linear_blend(&a, &P::from_bytes(next.parameters()), weight),
            None => P::linear_blend(&a, &a, weight),
        };
        Ok(blended)
    }

    /// Sample one frame and step over it.
    ///
    /// Returns `Ok(None)` on end-of-animation, whether the cursor was already
    /// past the end or the step carried it there.
    pub fn read_frame<P: ParameterSet>(
        &mut self,
        store: &KeyframeStore,
        frame_rate: f64,
    ) -> Result<Option<FramePair<P>>> {
        check_frame_rate(frame_rate)?;
        if !self.valid {
            return Ok(None);
        }
        let start = self.sample(store)?;

        self.seek_relative(store, 1.0 / frame_rate);

        if !self.valid {
            return Ok(None);
        }
        let end = self.sample(store)?;

        Ok(Some(FramePair { start, end }))
    }

    /// Iterate over the remaining frames.
    pub fn frames<'a, P: ParameterSet>(
        &'a mut self,
        store: &'a KeyframeStore,
        frame_rate: f64,
    ) -> Result<Frames<'a, P>> {
        check_frame_rate(frame_rate)?;
        Ok(Frames {
            cursor: self,
            store,
            frame_rate,
            _params: PhantomData,
        })
    }
}

fn check_frame_rate(frame_rate: f64) -> Result<()> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(AnimationError::InvalidFrameRate(frame_rate));
    }
    Ok(())
}

/// Iterator over animation frames.
pub struct Frames<'a, P> {
    cursor: &'a mut TimelineCursor,
    store: &'a KeyframeStore,
    frame_rate: f64,
    _params: PhantomData<P>,
}

impl<'a, P: ParameterSet> Iterator for Frames<'a, P> {
    type Item = Result<FramePair<P>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .read_frame(self.store, self.frame_rate)
            .transpose()
    }
}

//! Parameter sets: the opaque per-keyframe state blended during playback.
//!
//! The animation engine never interprets parameters itself. It stores the
//! serialized form produced by [`ParameterSet::save`] and hands it back to
//! [`ParameterSet::load`] when sampling.

use std::fmt;

use log::debug;

/// Encoded thumbnail image bytes (any format the image layer understands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail(Vec<u8>);

impl Thumbnail {
    pub fn new(encoded: Vec<u8>) -> Self {
        Self(encoded)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Capability provided by the parameter-set owner.
pub trait ParameterSet: Default {
    /// Replace recognized fields with the values in `data`.
    fn load(&mut self, data: &[u8]);

    /// Serialize to the byte form stored in keyframes.
    fn save(&self) -> Vec<u8>;

    /// Blend two parameter sets, `weight` 0 giving `a` and 1 giving `b`.
    fn linear_blend(a: &Self, b: &Self, weight: f64) -> Self;

    /// Render a small preview image, if this parameter set can.
    fn make_thumbnail(&self, _width: u32, _height: u32) -> Option<Thumbnail> {
        None
    }

    /// Build a parameter set from stored bytes.
    fn from_bytes(data: &[u8]) -> Self {
        let mut params = Self::default();
        params.load(data);
        params
    }
}

/// 24-bit colour, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);
    pub const BLACK: Self = Self([0x00, 0x00, 0x00]);

    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut rgb = [0u8; 3];
        for (i, c) in rgb.iter_mut().enumerate() {
            *c = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(rgb))
    }

    fn blend(a: Self, b: Self, weight: f64) -> Self {
        let mut rgb = [0u8; 3];
        for (i, c) in rgb.iter_mut().enumerate() {
            *c = lerp(a.0[i] as f64, b.0[i] as f64, weight)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
        Self(rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

#[inline]
fn lerp(a: f64, b: f64, weight: f64) -> f64 {
    a + (b - a) * weight
}

/// Peter de Jong attractor parameters in their `key = value` text form.
#[derive(Debug, Clone, PartialEq)]
pub struct DeJongParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub zoom: f64,
    pub xoffset: f64,
    pub yoffset: f64,
    pub rotation: f64,
    pub blur_radius: f64,
    pub blur_ratio: f64,
    pub exposure: f64,
    pub gamma: f64,
    pub bgcolor: Color,
    pub fgcolor: Color,
    pub clamped: bool,
    pub tileable: bool,
    pub bgalpha: u32,
    pub fgalpha: u32,
}

impl Default for DeJongParams {
    fn default() -> Self {
        Self {
            a: 1.41914,
            b: -2.28413,
            c: 2.42754,
            d: -2.17719,
            zoom: 1.0,
            xoffset: 0.0,
            yoffset: 0.0,
            rotation: 0.0,
            blur_radius: 0.0,
            blur_ratio: 1.0,
            exposure: 0.05,
            gamma: 1.0,
            bgcolor: Color::WHITE,
            fgcolor: Color::BLACK,
            clamped: false,
            tileable: false,
            bgalpha: 0xFFFF,
            fgalpha: 0xFFFF,
        }
    }
}

impl DeJongParams {
    /// Set a single field. Returns false if the key isn't recognized or the
    /// value doesn't parse.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        fn float(slot: &mut f64, value: &str) -> bool {
            value.parse().map(|v| *slot = v).is_ok()
        }
        fn int(slot: &mut u32, value: &str) -> bool {
            value.parse().map(|v| *slot = v).is_ok()
        }
        fn flag(slot: &mut bool, value: &str) -> bool {
            value.parse::<i64>().map(|v| *slot = v != 0).is_ok()
        }
        fn color(slot: &mut Color, value: &str) -> bool {
            Color::parse(value).map(|c| *slot = c).is_some()
        }

        match key {
            "a" => float(&mut self.a, value),
            "b" => float(&mut self.b, value),
            "c" => float(&mut self.c, value),
            "d" => float(&mut self.d, value),
            "zoom" => float(&mut self.zoom, value),
            "xoffset" => float(&mut self.xoffset, value),
            "yoffset" => float(&mut self.yoffset, value),
            "rotation" => float(&mut self.rotation, value),
            "blur_radius" => float(&mut self.blur_radius, value),
            "blur_ratio" => float(&mut self.blur_ratio, value),
            "exposure" => float(&mut self.exposure, value),
            "gamma" => float(&mut self.gamma, value),
            "bgcolor" => color(&mut self.bgcolor, value),
            "fgcolor" => color(&mut self.fgcolor, value),
            "clamped" => flag(&mut self.clamped, value),
            "tileable" => flag(&mut self.tileable, value),
            "bgalpha" => int(&mut self.bgalpha, value),
            "fgalpha" => int(&mut self.fgalpha, value),
            _ => false,
        }
    }
}

impl ParameterSet for DeJongParams {
    fn load(&mut self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if !self.set(key, value) {
                debug!("Ignoring parameter {:?} = {:?}", key, value);
            }
        }
    }

    fn save(&self) -> Vec<u8> {
        format!(
            "a = {:.6}\n\
             b = {:.6}\n\
             c = {:.6}\n\
             d = {:.6}\n\
             zoom = {:.6}\n\
             xoffset = {:.6}\n\
             yoffset = {:.6}\n\
             rotation = {:.6}\n\
             blur_radius = {:.6}\n\
             blur_ratio = {:.6}\n\
             exposure = {:.6}\n\
             gamma = {:.6}\n\
             bgcolor = {}\n\
             fgcolor = {}\n\
             clamped = {}\n\
             tileable = {}\n\
             bgalpha = {}\n\
             fgalpha = {}\n",
            self.a,
            self.b,
            self.c,
            self.d,
            self.zoom,
            self.xoffset,
            self.yoffset,
            self.rotation,
            self.blur_radius,
            self.blur_ratio,
            self.exposure,
            self.gamma,
            self.bgcolor,
            self.fgcolor,
            self.clamped as u8,
            self.tileable as u8,
            self.bgalpha,
            self.fgalpha,
        )
        .into_bytes()
    }

    fn linear_blend(a: &Self, b: &Self, weight: f64) -> Self {
        // Discrete settings switch over halfway through the transition
        let pick = if weight < 0.5 { a } else { b };
        Self {
            a: lerp(a.a, b.a, weight),
            b: lerp(a.b, b.b, weight),
            c: lerp(a.c, b.c, weight),
            d: lerp(a.d, b.d, weight),
            zoom: lerp(a.zoom, b.zoom, weight),
            xoffset: lerp(a.xoffset, b.xoffset, weight),
            yoffset: lerp(a.yoffset, b.yoffset, weight),
            rotation: lerp(a.rotation, b.rotation, weight),
            blur_radius: lerp(a.blur_radius, b.blur_radius, weight),
            blur_ratio: lerp(a.blur_ratio, b.blur_ratio, weight),
            exposure: lerp(a.exposure, b.exposure, weight),
            gamma: lerp(a.gamma, b.gamma, weight),
            bgcolor: Color::blend(a.bgcolor, b.bgcolor, weight),
            fgcolor: Color::blend(a.fgcolor, b.fgcolor, weight),
            clamped: pick.clamped,
            tileable: pick.tileable,
            bgalpha: pick.bgalpha,
            fgalpha: pick.fgalpha,
        }
    }
}

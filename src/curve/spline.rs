//! Control-point splines mapping progress in [0, 1] to a warped progress in [0, 1].
//!
//! Evaluation uses monotone cubic Hermite interpolation (Fritsch-Carlson), so a
//! spline whose control points rise monotonically never overshoots and stays
//! monotonic between them.

/// A single spline control point. Both coordinates lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
}

impl ControlPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bytes used by one serialized control point (two little-endian f64).
const POINT_SIZE: usize = 16;

const LINEAR_POINTS: [ControlPoint; 2] = [ControlPoint::new(0.0, 0.0), ControlPoint::new(1.0, 1.0)];

const SMOOTH_POINTS: [ControlPoint; 5] = [
    ControlPoint::new(0.0, 0.0),
    ControlPoint::new(0.2, 0.08),
    ControlPoint::new(0.5, 0.5),
    ControlPoint::new(0.8, 0.92),
    ControlPoint::new(1.0, 1.0),
];

/// Interpolation curve defined by control points with strictly increasing x.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    points: Vec<ControlPoint>,
    /// Hermite tangent at each control point.
    tangents: Vec<f64>,
}

impl Spline {
    /// Build a spline, validating the control points.
    pub fn new(points: Vec<ControlPoint>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }
        for (i, p) in points.iter().enumerate() {
            if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
                return Err(CurveError::OutOfRange { index: i });
            }
            if i > 0 && p.x <= points[i - 1].x {
                return Err(CurveError::NotIncreasing { index: i });
            }
        }

        let tangents = monotone_tangents(&points);
        Ok(Self { points, tangents })
    }

    /// Identity curve: weight equals linear progress.
    pub fn linear() -> Self {
        Self::from_template(&LINEAR_POINTS)
    }

    /// Ease-in/ease-out curve used for newly created keyframes.
    pub fn smooth() -> Self {
        Self::from_template(&SMOOTH_POINTS)
    }

    fn from_template(points: &[ControlPoint]) -> Self {
        let points = points.to_vec();
        let tangents = monotone_tangents(&points);
        Self { points, tangents }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Evaluate the curve at `t`. Inputs outside the control range clamp to
    /// the end points.
    pub fn evaluate(&self, t: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if t.is_nan() || t <= first.x {
            return first.y;
        }
        if t >= last.x {
            return last.y;
        }

        // Segment k satisfies points[k].x <= t < points[k + 1].x
        let k = self.points.partition_point(|p| p.x <= t) - 1;
        let (p0, p1) = (self.points[k], self.points[k + 1]);
        let h = p1.x - p0.x;
        let s = (t - p0.x) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        let y = h00 * p0.y
            + h10 * h * self.tangents[k]
            + h01 * p1.y
            + h11 * h * self.tangents[k + 1];
        y.clamp(0.0, 1.0)
    }

    /// Serialize control points as consecutive little-endian (x, y) f64 pairs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.points.len() * POINT_SIZE);
        for p in &self.points {
            bytes.extend_from_slice(&p.x.to_le_bytes());
            bytes.extend_from_slice(&p.y.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`Spline::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveError> {
        if bytes.len() % POINT_SIZE != 0 {
            return Err(CurveError::Length(bytes.len()));
        }
        let points = bytes
            .chunks_exact(POINT_SIZE)
            .map(|b| {
                let mut x = [0u8; 8];
                let mut y = [0u8; 8];
                x.copy_from_slice(&b[..8]);
                y.copy_from_slice(&b[8..]);
                ControlPoint::new(f64::from_le_bytes(x), f64::from_le_bytes(y))
            })
            .collect();
        Self::new(points)
    }
}

impl Default for Spline {
    fn default() -> Self {
        Self::smooth()
    }
}

/// Fritsch-Carlson tangents. Flat segments get zero tangents and steep ones
/// are scaled back so each segment stays monotone.
fn monotone_tangents(points: &[ControlPoint]) -> Vec<f64> {
    let n = points.len();
    let secants: Vec<f64> = points
        .windows(2)
        .map(|w| (w[1].y - w[0].y) / (w[1].x - w[0].x))
        .collect();

    let mut tangents = vec![0.0; n];
    tangents[0] = secants[0];
    tangents[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        let (d0, d1) = (secants[k - 1], secants[k]);
        tangents[k] = if d0 * d1 <= 0.0 { 0.0 } else { (d0 + d1) / 2.0 };
    }

    for k in 0..n - 1 {
        let d = secants[k];
        if d == 0.0 {
            tangents[k] = 0.0;
            tangents[k + 1] = 0.0;
            continue;
        }
        let a = tangents[k] / d;
        let b = tangents[k + 1] / d;
        let r = a * a + b * b;
        if r > 9.0 {
            let tau = 3.0 / r.sqrt();
            tangents[k] = tau * a * d;
            tangents[k + 1] = tau * b * d;
        }
    }

    tangents
}

/// Malformed curve data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("Curve data length {0} is not a whole number of control points")]
    Length(usize),
    #[error("A curve needs at least 2 control points, got {0}")]
    TooFewPoints(usize),
    #[error("Control point {index} lies outside the unit square")]
    OutOfRange { index: usize },
    #[error("Control point {index} does not increase in x")]
    NotIncreasing { index: usize },
}

//! Bezier curves for the Curve rule.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A control point of a [`BezierCurve`].
///
/// `handle_before` shapes the segment arriving at the point,
/// `handle_after` the segment leaving it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub point: Vec2,
    pub handle_before: Vec2,
    pub handle_after: Vec2,
}

impl CurvePoint {
    pub fn new(point: Vec2, handle_before: Vec2, handle_after: Vec2) -> Self {
        Self {
            point,
            handle_before,
            handle_after,
        }
    }

    /// A point whose handles coincide with it, producing sharp corners.
    pub fn corner(point: Vec2) -> Self {
        Self::new(point, point, point)
    }
}

/// A user-authored curve of bezier segments, evaluated by x.
///
/// Points are kept sorted by x. Evaluation clamps to the first and last
/// point's y outside the authored range; an empty curve evaluates to 0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BezierCurve {
    points: Vec<CurvePoint>,
}

impl BezierCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity ramp through (0,0) and (1,1) with linear handles.
    pub fn unit_ramp() -> Self {
        let mut curve = Self::new();
        curve.add_point(CurvePoint::new(
            Vec2::ZERO,
            Vec2::new(-1.0 / 3.0, -1.0 / 3.0),
            Vec2::new(1.0 / 3.0, 1.0 / 3.0),
        ));
        curve.add_point(CurvePoint::new(
            Vec2::ONE,
            Vec2::new(2.0 / 3.0, 2.0 / 3.0),
            Vec2::new(4.0 / 3.0, 4.0 / 3.0),
        ));
        curve
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts a point, keeping the list sorted by x.
    pub fn add_point(&mut self, point: CurvePoint) -> &mut Self {
        let at = self
            .points
            .iter()
            .position(|p| p.point.x > point.point.x)
            .unwrap_or(self.points.len());
        self.points.insert(at, point);
        self
    }

    pub fn remove_point(&mut self, index: usize) -> Option<CurvePoint> {
        if index < self.points.len() {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Evaluates the curve at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        let last = self.points.last().unwrap_or(first);

        if x <= first.point.x {
            return first.point.y;
        }
        if x >= last.point.x {
            return last.point.y;
        }

        for pair in self.points.windows(2) {
            let (p0, p1) = (&pair[0], &pair[1]);
            if x <= p1.point.x {
                return segment_evaluate(p0, p1, x);
            }
        }

        last.point.y
    }
}

/// Evaluates one cubic bezier segment at `x` by solving the curve parameter
/// with a bisection on the (monotonic) x polynomial.
fn segment_evaluate(p0: &CurvePoint, p1: &CurvePoint, x: f32) -> f32 {
    let (a, b, c, d) = (p0.point, p0.handle_after, p1.handle_before, p1.point);

    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    for _ in 0..32 {
        let mid = 0.5 * (lo + hi);
        if cubic(a.x, b.x, c.x, d.x, mid) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = 0.5 * (lo + hi);

    cubic(a.y, b.y, c.y, d.y, t)
}

#[inline]
fn cubic(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

//! Quadratic Bézier math for flow and trust-line curves.
//!
//! Threat-model documents store curves as a source point, a target point and
//! an author-placed *handle*. The handle is a point the curve should pass near,
//! not the Bézier control point itself; [`QuadraticCurve::from_handle`] derives
//! the control point so that the curve passes exactly through the handle at
//! `t = 0.5`.

use crate::geometry::{Bounds, Point};

/// Number of arrowheads sampled along a flow curve.
pub const ARROWHEAD_SAMPLES: usize = 4;

/// A quadratic Bézier curve `B(t) = (1−t)²·S + 2(1−t)t·C + t²·T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticCurve {
    source: Point,
    control: Point,
    target: Point,
}

impl QuadraticCurve {
    /// Creates a curve from explicit source, control and target points.
    pub fn new(source: Point, control: Point, target: Point) -> Self {
        Self {
            source,
            control,
            target,
        }
    }

    /// Creates a curve whose control point is derived from an author handle.
    ///
    /// `control = 2·handle − source/2 − target/2` on each axis.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trustmap_core::{curve::QuadraticCurve, geometry::Point};
    /// let curve = QuadraticCurve::from_handle(
    ///     Point::new(0.0, 0.0),
    ///     Point::new(100.0, 100.0),
    ///     Point::new(200.0, 0.0),
    /// );
    /// assert_eq!(curve.control(), Point::new(100.0, 200.0));
    /// ```
    pub fn from_handle(source: Point, handle: Point, target: Point) -> Self {
        let control = Point::new(
            2.0 * handle.x() - source.x() / 2.0 - target.x() / 2.0,
            2.0 * handle.y() - source.y() / 2.0 - target.y() / 2.0,
        );
        Self::new(source, control, target)
    }

    pub fn source(&self) -> Point {
        self.source
    }

    pub fn control(&self) -> Point {
        self.control
    }

    pub fn target(&self) -> Point {
        self.target
    }

    /// Evaluates the curve at `t ∈ [0, 1]`.
    pub fn point_at(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t;
        let c = t * t;
        Point::new(
            a * self.source.x() + b * self.control.x() + c * self.target.x(),
            a * self.source.y() + b * self.control.y() + c * self.target.y(),
        )
    }

    /// Derivative `2(1−t)(C−S) + 2t(T−C)` at `t`.
    pub fn derivative_at(&self, t: f32) -> Point {
        let to_control = self.control.sub_point(self.source);
        let to_target = self.target.sub_point(self.control);
        to_control
            .scale(2.0 * (1.0 - t))
            .add_point(to_target.scale(2.0 * t))
    }

    /// Tangent direction at `t`, in degrees as returned by `atan2(dy, dx)`.
    pub fn tangent_angle(&self, t: f32) -> f32 {
        let d = self.derivative_at(t);
        d.y().atan2(d.x()).to_degrees()
    }

    /// Evenly spaced parameters `0, 1/(n−1), …, 1`.
    ///
    /// Returns `[0.0]` for `n == 1` and nothing for `n == 0`.
    pub fn sample_parameters(n: usize) -> Vec<f32> {
        match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
        }
    }

    /// Tight bounding box of the curve, including interior extrema.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::from_point(self.source).include_point(self.target);
        for t in [
            extremum(self.source.x(), self.control.x(), self.target.x()),
            extremum(self.source.y(), self.control.y(), self.target.y()),
        ]
        .into_iter()
        .flatten()
        {
            bounds = bounds.include_point(self.point_at(t));
        }
        bounds
    }
}

/// Parameter of the single extremum of a 1-D quadratic Bézier, if it lies inside (0, 1).
fn extremum(p0: f32, p1: f32, p2: f32) -> Option<f32> {
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let t = (p0 - p1) / denom;
    (t > 0.0 && t < 1.0).then_some(t)
}

//! The shared 2D curve contract plus the line and circle primitives.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb2, Point2, Tolerance, Vec2};

use crate::error::{Result, SketchError};

/// Parametric curve over `t ∈ [0, 1]`.
pub trait Curve2d {
    /// Point at parameter `t`.
    fn evaluate(&self, t: f64) -> Point2;

    /// Unit tangent in the direction of increasing `t`; zero for a bare point.
    fn tangent(&self, t: f64) -> Vec2;

    /// Axis-aligned box enclosing the curve.
    fn bounding_box(&self) -> Aabb2;

    /// Arc length.
    fn length(&self) -> f64;

    /// Parameter of the curve point nearest to `p`.
    fn closest_parameter(&self, p: &Point2) -> f64;

    /// `segments + 1` evenly spaced samples from `t = 0` to `t = 1`.
    fn tessellate(&self, segments: usize) -> Vec<Point2> {
        let n = segments.max(1);
        (0..=n).map(|i| self.evaluate(i as f64 / n as f64)).collect()
    }

    /// Distance from `p` to the nearest curve point.
    fn distance_to(&self, p: &Point2) -> f64 {
        (self.evaluate(self.closest_parameter(p)) - p).norm()
    }
}

/// Normalize `v`, falling back to +X for near-zero vectors.
pub(crate) fn unit_or_x(v: Vec2) -> Vec2 {
    let len = v.norm();
    if len < 1e-15 || !len.is_finite() {
        Vec2::x()
    } else {
        v / len
    }
}

/// Straight segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Point at `t = 0`.
    pub start: Point2,
    /// Point at `t = 1`.
    pub end: Point2,
}

impl Line {
    /// Create a line segment.
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// `end − start`.
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    /// True if the endpoints coincide within the default tolerance.
    pub fn is_degenerate(&self) -> bool {
        self.direction().norm() < Tolerance::DEFAULT.linear
    }

    /// Segment midpoint.
    pub fn mid_point(&self) -> Point2 {
        Point2::from((self.start.coords + self.end.coords) * 0.5)
    }

    /// Swap the endpoints.
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}

impl Curve2d for Line {
    fn evaluate(&self, t: f64) -> Point2 {
        if t == 1.0 {
            return self.end;
        }
        self.start + self.direction() * t
    }

    fn tangent(&self, _t: f64) -> Vec2 {
        unit_or_x(self.direction())
    }

    fn bounding_box(&self) -> Aabb2 {
        Aabb2::from_corners(self.start, self.end)
    }

    fn length(&self) -> f64 {
        self.direction().norm()
    }

    fn closest_parameter(&self, p: &Point2) -> f64 {
        let d = self.direction();
        let len2 = d.norm_squared();
        if len2 < 1e-30 {
            return 0.0;
        }
        ((p - self.start).dot(&d) / len2).clamp(0.0, 1.0)
    }
}

/// Full circle traversed counter-clockwise from +X.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center point.
    pub center: Point2,
    /// Radius.
    pub radius: f64,
}

impl Circle {
    /// Create a circle; the radius must be finite and positive.
    pub fn new(center: Point2, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SketchError::NonPositiveRadius(radius));
        }
        Ok(Self { center, radius })
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

impl Curve2d for Circle {
    fn evaluate(&self, t: f64) -> Point2 {
        // A full turn lands exactly on the start point
        let a = if t == 1.0 { 0.0 } else { t * TAU };
        self.center + Vec2::new(a.cos(), a.sin()) * self.radius
    }

    fn tangent(&self, t: f64) -> Vec2 {
        let a = t * TAU;
        Vec2::new(-a.sin(), a.cos())
    }

    fn bounding_box(&self) -> Aabb2 {
        let r = Vec2::new(self.radius, self.radius);
        Aabb2::from_corners(self.center - r, self.center + r)
    }

    fn length(&self) -> f64 {
        TAU * self.radius
    }

    /// Polar angle of `p` about the center, as a fraction of a full turn.
    fn closest_parameter(&self, p: &Point2) -> f64 {
        let d = p - self.center;
        if d.norm_squared() < 1e-30 {
            return 0.0;
        }
        d.y.atan2(d.x).rem_euclid(TAU) / TAU
    }

    /// `segments` samples; the closing point is not repeated.
    fn tessellate(&self, segments: usize) -> Vec<Point2> {
        let n = segments.max(3);
        (0..n).map(|i| self.evaluate(i as f64 / n as f64)).collect()
    }
}

//! Circular arcs with an explicit traversal direction.

use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{cross2, Aabb2, Point2, Vec2};

use crate::curve::Curve2d;
use crate::error::{Result, SketchError};

/// Circular arc from `start_angle` to `end_angle` around `center`.
///
/// The `ccw` flag decides which of the two arcs between the end angles is
/// meant, so reflex arcs survive round trips through their endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Center point.
    pub center: Point2,
    /// Radius.
    pub radius: f64,
    /// Polar angle of the start point (radians).
    pub start_angle: f64,
    /// Polar angle of the end point (radians).
    pub end_angle: f64,
    /// Traverse counter-clockwise from start to end.
    pub ccw: bool,
}

impl Arc {
    /// Create an arc; the radius must be finite and positive.
    pub fn new(
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        ccw: bool,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SketchError::NonPositiveRadius(radius));
        }
        Ok(Self {
            center,
            radius,
            start_angle,
            end_angle,
            ccw,
        })
    }

    /// The arc starting at `start`, passing through `through` and ending at `end`.
    pub fn from_three_points(start: Point2, through: Point2, end: Point2) -> Result<Self> {
        let a = through - start;
        let b = end - start;
        let d = 2.0 * cross2(&a, &b);
        let scale = a.norm().max(b.norm());
        if d.abs() <= 1e-12 * scale * scale || scale < 1e-15 {
            return Err(SketchError::CollinearPoints);
        }
        let a2 = a.norm_squared();
        let b2 = b.norm_squared();
        let offset = Vec2::new(b.y * a2 - a.y * b2, a.x * b2 - b.x * a2) / d;
        let center = start + offset;
        let radius = offset.norm();
        let angle_of = |p: Point2| {
            let v = p - center;
            v.y.atan2(v.x)
        };
        // Positive orientation of start→through→end means counter-clockwise travel
        let ccw = cross2(&(through - start), &(end - through)) > 0.0;
        Self::new(center, radius, angle_of(start), angle_of(end), ccw)
    }

    /// Signed angle swept from start to end: positive when counter-clockwise.
    ///
    /// Always within `[-2π, 2π]`. Distinct end angles that differ by a whole
    /// number of turns describe a full circle.
    pub fn sweep_angle(&self) -> f64 {
        let raw = self.end_angle - self.start_angle;
        let forward = if self.ccw { raw } else { -raw };
        let mut sweep = forward.rem_euclid(TAU);
        if sweep == 0.0 && raw != 0.0 {
            sweep = TAU;
        }
        if self.ccw {
            sweep
        } else {
            -sweep
        }
    }

    /// Polar angle at parameter `t`.
    pub fn angle_at(&self, t: f64) -> f64 {
        self.start_angle + t * self.sweep_angle()
    }

    /// Point halfway along the traversed arc.
    pub fn mid_point(&self) -> Point2 {
        self.evaluate(0.5)
    }

    /// Start point.
    pub fn start_point(&self) -> Point2 {
        self.point_at_angle(self.start_angle)
    }

    /// End point.
    pub fn end_point(&self) -> Point2 {
        self.point_at_angle(self.end_angle)
    }

    /// The same arc traversed in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            start_angle: self.end_angle,
            end_angle: self.start_angle,
            ccw: !self.ccw,
            ..*self
        }
    }

    fn point_at_angle(&self, angle: f64) -> Point2 {
        self.center + Vec2::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Angle travelled from the start to reach polar angle `angle`, in `[0, 2π)`.
    fn travel_to(&self, angle: f64) -> f64 {
        let raw = angle - self.start_angle;
        if self.ccw {
            raw.rem_euclid(TAU)
        } else {
            (-raw).rem_euclid(TAU)
        }
    }

    /// True if the polar angle lies on the traversed arc.
    pub fn contains_angle(&self, angle: f64) -> bool {
        self.travel_to(angle) <= self.sweep_angle().abs() + 1e-12
    }
}

impl Curve2d for Arc {
    fn evaluate(&self, t: f64) -> Point2 {
        if t == 1.0 {
            return self.end_point();
        }
        self.point_at_angle(self.angle_at(t))
    }

    fn tangent(&self, t: f64) -> Vec2 {
        let a = self.angle_at(t);
        let v = Vec2::new(-a.sin(), a.cos());
        if self.ccw {
            v
        } else {
            -v
        }
    }

    /// Tight box: both endpoints plus every axis extreme the arc crosses.
    fn bounding_box(&self) -> Aabb2 {
        let mut bb = Aabb2::point(self.start_point());
        bb.include_point(&self.end_point());
        for k in 0..4 {
            let angle = k as f64 * FRAC_PI_2;
            if self.contains_angle(angle) {
                bb.include_point(&self.point_at_angle(angle));
            }
        }
        bb
    }

    fn length(&self) -> f64 {
        self.radius * self.sweep_angle().abs()
    }

    /// Fractional angular position when `p` lies in the arc's angular range,
    /// otherwise whichever endpoint is nearer.
    fn closest_parameter(&self, p: &Point2) -> f64 {
        let sweep = self.sweep_angle().abs();
        if sweep < 1e-15 {
            return 0.0;
        }
        let d = p - self.center;
        if d.norm_squared() < 1e-30 {
            return 0.0;
        }
        let travel = self.travel_to(d.y.atan2(d.x));
        if travel <= sweep {
            return travel / sweep;
        }
        let to_start = (self.start_point() - p).norm_squared();
        let to_end = (self.end_point() - p).norm_squared();
        if to_start <= to_end {
            0.0
        } else {
            1.0
        }
    }
}

#![warn(missing_docs)]

//! Math types for the tessera geometry kernel.
//!
//! Thin wrappers around nalgebra providing the domain types shared by the
//! mesh, section, sketch and solver crates: points, vectors, directions,
//! rigid/affine transforms, axis-aligned boxes, tolerance constants and the
//! cooperative progress/cancellation helper.

mod bbox;
mod progress;

pub use bbox::{Aabb2, Aabb3};
pub use progress::{Progress, ProgressFn};

use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D sketch space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Wrap an angle into the half-open interval `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub fn cross2(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default kernel tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Cross-product magnitude below which a triangle counts as degenerate.
    pub const DEGENERATE_AREA: f64 = 1e-10;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation() {
        let t = Transform::translation(Vec3::new(1.0, 2.0, 3.0));
        let moved = t.apply_point(&Point3::new(5.0, 6.0, 7.0));
        assert_relative_eq!(moved.x, 6.0);
        assert_relative_eq!(moved.y, 8.0);
        assert_relative_eq!(moved.z, 10.0);
    }

    #[test]
    fn test_wrap_angle_range() {
        assert_relative_eq!(wrap_angle(PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_cross2_sign() {
        assert_relative_eq!(cross2(&Vec2::x(), &Vec2::y()), 1.0);
        assert_relative_eq!(cross2(&Vec2::y(), &Vec2::x()), -1.0);
    }
}

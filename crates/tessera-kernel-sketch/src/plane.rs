//! The 3D frame a sketch lives in.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Dir3, Point2, Point3, Vec3};

use crate::error::{Result, SketchError};

/// An origin plus an orthonormal, right-handed frame `(x_axis, y_axis, normal)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    /// Origin of the local 2D coordinate system.
    pub origin: Point3,
    /// Plane normal (`x_axis × y_axis`).
    pub normal: Dir3,
    /// Local +X direction.
    pub x_axis: Dir3,
    /// Local +Y direction.
    pub y_axis: Dir3,
}

impl SketchPlane {
    /// The world XY plane through the origin.
    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            normal: Vec3::z_axis(),
            x_axis: Vec3::x_axis(),
            y_axis: Vec3::y_axis(),
        }
    }

    /// The world XZ plane; local Y maps to world Z, normal −Y.
    pub fn xz() -> Self {
        Self {
            origin: Point3::origin(),
            normal: Dir3::new_unchecked(-Vec3::y()),
            x_axis: Vec3::x_axis(),
            y_axis: Vec3::z_axis(),
        }
    }

    /// The world YZ plane; local X maps to world Y, normal +X.
    pub fn yz() -> Self {
        Self {
            origin: Point3::origin(),
            normal: Vec3::x_axis(),
            x_axis: Vec3::y_axis(),
            y_axis: Vec3::z_axis(),
        }
    }

    /// Build a frame from an origin and a normal.
    ///
    /// The local Y axis is the world up-vector (+Z, or +Y when the normal is
    /// within ~25° of Z) made orthogonal to the normal.
    pub fn from_normal(origin: Point3, normal: Vec3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < 1e-12 {
            return Err(SketchError::DegenerateNormal);
        }
        let n = normal / len;
        let up = if n.z.abs() >= 0.9 { Vec3::y() } else { Vec3::z() };
        let y = (up - n * up.dot(&n)).normalize();
        let x = y.cross(&n);
        Ok(Self {
            origin,
            normal: Dir3::new_unchecked(n),
            x_axis: Dir3::new_normalize(x),
            y_axis: Dir3::new_unchecked(y),
        })
    }

    /// Build a frame from an origin and an in-plane X direction, with the
    /// Y direction orthogonalized against it.
    pub fn from_axes(origin: Point3, x_dir: Vec3, y_hint: Vec3) -> Result<Self> {
        let x_len = x_dir.norm();
        if !x_len.is_finite() || x_len < 1e-12 {
            return Err(SketchError::DegenerateNormal);
        }
        let x = x_dir / x_len;
        let n = x.cross(&y_hint);
        let n_len = n.norm();
        if !n_len.is_finite() || n_len < 1e-12 {
            return Err(SketchError::DegenerateNormal);
        }
        let n = n / n_len;
        Ok(Self {
            origin,
            normal: Dir3::new_unchecked(n),
            x_axis: Dir3::new_unchecked(x),
            y_axis: Dir3::new_normalize(n.cross(&x)),
        })
    }

    /// Map a local 2D point into world space.
    pub fn to_world(&self, p: &Point2) -> Point3 {
        self.origin + self.x_axis.as_ref() * p.x + self.y_axis.as_ref() * p.y
    }

    /// Project a world point into local 2D coordinates.
    pub fn to_local(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_axis.as_ref()), d.dot(self.y_axis.as_ref()))
    }

    /// Signed distance of a world point from the plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }
}

impl Default for SketchPlane {
    fn default() -> Self {
        Self::xy()
    }
}

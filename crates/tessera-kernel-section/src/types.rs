//! Section planes, segments, polylines and options.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb3, Dir3, Point3, Vec3};

use crate::error::{Result, SectionError};

/// A cutting plane through `origin` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPlane {
    /// Point on the plane.
    pub origin: Point3,
    /// Unit plane normal; points toward the positive side.
    pub normal: Dir3,
}

impl SectionPlane {
    /// Create a plane, normalizing `normal`.
    pub fn new(origin: Point3, normal: Vec3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < 1e-12 {
            return Err(SectionError::DegenerateNormal);
        }
        Ok(Self {
            origin,
            normal: Dir3::new_unchecked(normal / len),
        })
    }

    /// Horizontal plane `z = z`, normal +Z.
    pub fn xy(z: f64) -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, z),
            normal: Vec3::z_axis(),
        }
    }

    /// Plane `y = y`, normal +Y.
    pub fn xz(y: f64) -> Self {
        Self {
            origin: Point3::new(0.0, y, 0.0),
            normal: Vec3::y_axis(),
        }
    }

    /// Plane `x = x`, normal +X.
    pub fn yz(x: f64) -> Self {
        Self {
            origin: Point3::new(x, 0.0, 0.0),
            normal: Vec3::x_axis(),
        }
    }

    /// The parallel plane shifted by `distance` along the normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal.as_ref() * distance,
            normal: self.normal,
        }
    }

    /// Signed distance from `p` to the plane (positive on the normal side).
    #[inline]
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.origin))
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.normal.as_ref() * self.signed_distance(p)
    }
}

/// A cut segment contributed by one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSegment {
    /// First endpoint.
    pub start: Point3,
    /// Second endpoint.
    pub end: Point3,
    /// Index of the triangle that produced the segment.
    pub triangle: usize,
}

impl EdgeSegment {
    /// Segment length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Ordered points forming an open or closed curve.
///
/// Closed polylines do not repeat their first point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Vertices in traversal order.
    pub points: Vec<Point3>,
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

impl Polyline {
    /// Create a polyline.
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, including the closing pair for closed curves.
    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        let n = self.points.len();
        let count = if self.closed && n > 1 { n } else { n.saturating_sub(1) };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Total length, including the closing segment.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Bounding box of the vertices.
    pub fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points(&self.points)
    }

    /// Newell vector area; its direction follows the traversal orientation.
    pub fn vector_area(&self) -> Vec3 {
        let n = self.points.len();
        if n < 3 {
            return Vec3::zeros();
        }
        let sum = (0..n).fold(Vec3::zeros(), |acc, i| {
            acc + self.points[i].coords.cross(&self.points[(i + 1) % n].coords)
        });
        sum * 0.5
    }

    /// Reverse the traversal direction in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }
}

/// Settings for [`section_mesh`](crate::section_mesh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionOptions {
    /// Distance below which a vertex counts as on the plane and endpoints merge.
    pub tolerance: f64,
    /// Join segments into polylines.
    pub chain: bool,
    /// Remove collinear interior vertices from chained polylines.
    pub simplify: bool,
    /// Collinearity threshold: vertices are removed when `dot ≥ 1 − tol`.
    pub simplify_tolerance: f64,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            chain: true,
            simplify: false,
            simplify_tolerance: 1e-6,
        }
    }
}

impl SectionOptions {
    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SectionError::InvalidOptions(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if !(0.0..=2.0).contains(&self.simplify_tolerance) {
            return Err(SectionError::InvalidOptions(format!(
                "simplify_tolerance must lie in [0, 2], got {}",
                self.simplify_tolerance
            )));
        }
        Ok(())
    }
}

/// Output of a single section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    /// The plane that was cut.
    pub plane: SectionPlane,
    /// Chained curves (empty when chaining is disabled).
    pub polylines: Vec<Polyline>,
    /// Raw per-triangle segments.
    pub segments: Vec<EdgeSegment>,
    /// False when the options were rejected and nothing was computed.
    pub success: bool,
}

impl SectionResult {
    /// Number of closed polylines.
    pub fn closed_count(&self) -> usize {
        self.polylines.iter().filter(|p| p.closed).count()
    }

    /// Sum of all polyline lengths.
    pub fn total_length(&self) -> f64 {
        self.polylines.iter().map(Polyline::length).sum()
    }
}

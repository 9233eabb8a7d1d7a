//! Point and ray queries against single triangles.

use tessera_kernel_math::{Point3, Tolerance, Vec3};

use crate::Ray;

/// Parallel-ray and self-hit threshold for [`ray_triangle_intersect`].
pub const RAY_EPSILON: f64 = 1e-7;

/// Closest point to `p` on segment `a`–`b`.
pub fn closest_point_on_segment(p: &Point3, a: &Point3, b: &Point3) -> Point3 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-30 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point to `p` on triangle `(a, b, c)`.
///
/// Uses Ericson's Voronoi region classification. Degenerate triangles fall
/// back to the nearest point on their three edges.
pub fn closest_point_on_triangle(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(&ac).norm() < Tolerance::DEGENERATE_AREA {
        return closest_point_on_edges(p, a, b, c);
    }

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    // Vertex region A
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    // Vertex region B
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    // Edge region AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    // Vertex region C
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    // Edge region AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    // Edge region BC
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Face interior
    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

fn closest_point_on_edges(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    [
        closest_point_on_segment(p, a, b),
        closest_point_on_segment(p, b, c),
        closest_point_on_segment(p, c, a),
    ]
    .into_iter()
    .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
    .unwrap_or(*a)
}

/// Möller–Trumbore ray/triangle test.
///
/// Returns the ray parameter of the hit when it lies strictly in front of
/// the origin (`t > RAY_EPSILON`).
pub fn ray_triangle_intersect(ray: &Ray, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
    let dir: &Vec3 = ray.direction.as_ref();
    let edge1 = b - a;
    let edge2 = c - a;

    let h = dir.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < RAY_EPSILON {
        return None;
    }

    let f = 1.0 / det;
    let s = ray.origin - a;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > RAY_EPSILON).then_some(t)
}

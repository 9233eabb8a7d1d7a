//! Discrete per-vertex curvature estimates.
//!
//! Mean curvature uses the cotangent Laplace–Beltrami operator normalized by
//! the mixed Voronoi area of Meyer et al.; Gaussian curvature uses the angle
//! deficit over the same area.

use std::f64::consts::TAU;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Point3, Vec3};

use crate::adjacency::EdgeAdjacency;
use crate::MeshData;

/// Which curvature quantity to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurvatureKind {
    /// Signed mean curvature `H`.
    #[default]
    Mean,
    /// Gaussian curvature `K` (angle deficit; 0 on the boundary).
    Gaussian,
    /// Absolute mean curvature `|H|`.
    Maximum,
    /// Larger principal curvature `H + √max(H² − K, 0)`.
    MaxPrincipal,
    /// Smaller principal curvature `H − √max(H² − K, 0)`.
    MinPrincipal,
}

impl FromStr for CurvatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "gaussian" => Ok(Self::Gaussian),
            "maximum" | "max" => Ok(Self::Maximum),
            "max_principal" => Ok(Self::MaxPrincipal),
            "min_principal" => Ok(Self::MinPrincipal),
            other => Err(format!("unknown curvature kind '{other}'")),
        }
    }
}

/// Per-vertex accumulators shared by all curvature kinds.
struct VertexCurvature {
    mean: f64,
    gaussian: f64,
}

/// Cotangent of the angle between `u` and `w`; 0 when they are parallel.
fn cotangent(u: &Vec3, w: &Vec3) -> f64 {
    let cross = u.cross(w).norm();
    if cross < 1e-12 {
        0.0
    } else {
        u.dot(w) / cross
    }
}

fn angle_between(u: &Vec3, w: &Vec3) -> f64 {
    u.cross(w).norm().atan2(u.dot(w))
}

/// Mixed Voronoi area contribution of triangle `(p, q, r)` to corner `p`.
fn mixed_area(p: &Point3, q: &Point3, r: &Point3) -> f64 {
    let pq = q - p;
    let pr = r - p;
    let area = 0.5 * pq.cross(&pr).norm();
    if area < 1e-20 {
        return 0.0;
    }
    if pq.dot(&pr) < 0.0 {
        return area / 2.0;
    }
    let qp = p - q;
    let qr = r - q;
    let rp = p - r;
    let rq = q - r;
    if qp.dot(&qr) < 0.0 || rp.dot(&rq) < 0.0 {
        return area / 4.0;
    }
    let cot_q = cotangent(&qp, &qr);
    let cot_r = cotangent(&rp, &rq);
    (pr.norm_squared() * cot_q + pq.norm_squared() * cot_r) / 8.0
}

fn vertex_curvature(mesh: &MeshData, adjacency: &EdgeAdjacency, v: u32) -> VertexCurvature {
    let p = mesh.vertex(v as usize);
    let mut laplace = Vec3::zeros();
    let mut area = 0.0;
    let mut angle_sum = 0.0;

    for &t in adjacency.faces_for_vertex(v) {
        let tri = mesh.triangle_indices(t);
        let Some(corner) = tri.iter().position(|&w| w == v) else {
            continue;
        };
        let qi = tri[(corner + 1) % 3];
        let ri = tri[(corner + 2) % 3];
        if qi == v || ri == v || qi == ri {
            continue;
        }
        let q = mesh.vertex(qi as usize);
        let r = mesh.vertex(ri as usize);

        // Edge (v, q) is opposite the angle at r, edge (v, r) opposite q.
        let cot_q = cotangent(&(p - q), &(r - q));
        let cot_r = cotangent(&(p - r), &(q - r));
        laplace += 0.5 * cot_r * (q - p) + 0.5 * cot_q * (r - p);
        area += mixed_area(&p, &q, &r);
        angle_sum += angle_between(&(q - p), &(r - p));
    }

    if area < 1e-20 {
        return VertexCurvature {
            mean: 0.0,
            gaussian: 0.0,
        };
    }

    let magnitude = laplace.norm() / (2.0 * area);
    // The Laplacian points toward the inside of a convex surface.
    let mean = match mesh.vertex_normal(v as usize) {
        Some(n) if laplace.dot(&n) > 0.0 => -magnitude,
        _ => magnitude,
    };
    let gaussian = if adjacency.is_boundary_vertex(v, mesh) {
        0.0
    } else {
        (TAU - angle_sum) / area
    };

    VertexCurvature { mean, gaussian }
}

/// Compute one curvature value per vertex with prebuilt adjacency.
///
/// Unreferenced vertices and vertices whose incident triangles all have
/// zero area report 0.
pub fn compute_curvature_with(
    mesh: &MeshData,
    adjacency: &EdgeAdjacency,
    kind: CurvatureKind,
) -> Vec<f64> {
    (0..mesh.vertex_count() as u32)
        .map(|v| {
            let c = vertex_curvature(mesh, adjacency, v);
            let spread = (c.mean * c.mean - c.gaussian).max(0.0).sqrt();
            match kind {
                CurvatureKind::Mean => c.mean,
                CurvatureKind::Gaussian => c.gaussian,
                CurvatureKind::Maximum => c.mean.abs(),
                CurvatureKind::MaxPrincipal => c.mean + spread,
                CurvatureKind::MinPrincipal => c.mean - spread,
            }
        })
        .collect()
}

/// Compute one curvature value per vertex.
pub fn compute_curvature(mesh: &MeshData, kind: CurvatureKind) -> Vec<f64> {
    let adjacency = EdgeAdjacency::build(mesh);
    compute_curvature_with(mesh, &adjacency, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::uv_sphere;

    /// Average over vertices in the equatorial band, away from the pole fans.
    fn band_mean(values: &[f64], mesh: &MeshData, radius: f64) -> f64 {
        let band: Vec<f64> = (0..mesh.vertex_count())
            .filter(|&i| mesh.vertex(i).z.abs() < 0.5 * radius)
            .map(|i| values[i])
            .collect();
        band.iter().sum::<f64>() / band.len() as f64
    }

    #[test]
    fn test_sphere_mean_curvature() {
        let mesh = uv_sphere(2.0, 31, 64);
        let h = compute_curvature(&mesh, CurvatureKind::Mean);
        assert_eq!(h.len(), mesh.vertex_count());
        let avg = band_mean(&h, &mesh, 2.0);
        assert!((avg - 0.5).abs() < 0.05, "mean curvature {avg}");
        assert!(h.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_sphere_gaussian_and_principal() {
        let mesh = uv_sphere(1.0, 31, 64);
        let k = compute_curvature(&mesh, CurvatureKind::Gaussian);
        let avg = band_mean(&k, &mesh, 1.0);
        assert!((avg - 1.0).abs() < 0.1, "gaussian curvature {avg}");

        let k1 = compute_curvature(&mesh, CurvatureKind::MaxPrincipal);
        let k2 = compute_curvature(&mesh, CurvatureKind::MinPrincipal);
        for (a, b) in k1.iter().zip(&k2) {
            assert!(a >= b);
        }
    }

    #[test]
    fn test_inverted_normals_flip_sign() {
        let mesh = uv_sphere(1.0, 15, 32);
        let flipped: Vec<[f32; 3]> = mesh
            .normals()
            .iter()
            .map(|n| [-n[0], -n[1], -n[2]])
            .collect();
        let mut b = mesh.clone().into_builder();
        b.set_normals(flipped);
        let inverted = b.build().unwrap();
        let h = compute_curvature(&mesh, CurvatureKind::Mean);
        let hi = compute_curvature(&inverted, CurvatureKind::Mean);
        // A vertex on a ring next to the equator
        let v = 1 + 7 * 32;
        assert!(h[v] > 0.0);
        assert!(hi[v] < 0.0);
        let hm = compute_curvature(&inverted, CurvatureKind::Maximum);
        assert!((hm[v] - h[v]).abs() < 1e-12);
    }

    #[test]
    fn test_flat_patch_is_zero() {
        let mesh = MeshData::from_raw(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.5, 0.5, 0.0],
            ],
            vec![0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4],
        )
        .unwrap();
        let h = compute_curvature(&mesh, CurvatureKind::Mean);
        assert!(h[4].abs() < 1e-9);
        let k = compute_curvature(&mesh, CurvatureKind::Gaussian);
        assert!(k[4].abs() < 1e-9);
        assert_eq!(k[0], 0.0);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("gaussian".parse::<CurvatureKind>(), Ok(CurvatureKind::Gaussian));
        assert!("bogus".parse::<CurvatureKind>().is_err());
    }
}

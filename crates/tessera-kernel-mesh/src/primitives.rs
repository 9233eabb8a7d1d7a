//! Closed reference meshes.

use std::f64::consts::{PI, TAU};

use tessera_kernel_math::Point3;

use crate::{MeshBuilder, MeshData};

/// Axis-aligned unit cube `[0, 1]³` with 8 shared vertices and 12
/// outward-facing triangles.
///
/// Faces are stored in the order −Z, +Z, −Y, +Y, −X, +X, two triangles each.
pub fn unit_cube() -> MeshData {
    let mut b = MeshBuilder::with_capacity(8, 12);
    for &(x, y, z) in &[
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 1.0),
        (0.0, 1.0, 1.0),
    ] {
        b.add_vertex(Point3::new(x, y, z));
    }
    for &[i, j, k] in &[
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ] {
        b.add_face(i, j, k);
    }
    b.into_mesh()
}

/// Watertight UV sphere centered at the origin.
///
/// `stacks` latitude bands (at least 2) and `slices` longitude segments (at
/// least 3). The poles are single vertices, so vertex 0 is the north pole and
/// the last vertex the south pole; ring `i` (1-based) starts at
/// `1 + (i - 1) * slices`. Normals are the exact radial directions.
pub fn uv_sphere(radius: f64, stacks: u32, slices: u32) -> MeshData {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let rings = stacks - 1;
    let mut b = MeshBuilder::with_capacity(
        (rings * slices + 2) as usize,
        (2 * slices * (stacks - 1)) as usize,
    );
    let mut normals = Vec::new();

    let mut push = |b: &mut MeshBuilder, theta: f64, phi: f64| {
        let n = [
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        ];
        normals.push([n[0] as f32, n[1] as f32, n[2] as f32]);
        b.add_vertex(Point3::new(radius * n[0], radius * n[1], radius * n[2]))
    };

    let north = push(&mut b, 0.0, 0.0);
    for i in 1..=rings {
        let theta = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            push(&mut b, theta, TAU * j as f64 / slices as f64);
        }
    }
    let south = push(&mut b, PI, 0.0);

    let at = |ring: u32, j: u32| 1 + (ring - 1) * slices + (j % slices);

    for j in 0..slices {
        b.add_face(north, at(1, j), at(1, j + 1));
    }
    for ring in 1..rings {
        for j in 0..slices {
            let (a, bb) = (at(ring, j), at(ring, j + 1));
            let (c, d) = (at(ring + 1, j), at(ring + 1, j + 1));
            b.add_face(a, c, d);
            b.add_face(a, d, bb);
        }
    }
    for j in 0..slices {
        b.add_face(south, at(rings, j + 1), at(rings, j));
    }

    b.set_normals(normals);
    b.into_mesh()
}

impl MeshBuilder {
    /// Finalize a builder whose indices are valid by construction.
    fn into_mesh(self) -> MeshData {
        self.build().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::EdgeAdjacency;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_is_closed_and_outward() {
        let s = uv_sphere(1.0, 9, 16);
        assert_eq!(s.vertex_count(), 8 * 16 + 2);
        assert_eq!(s.triangle_count(), 2 * 16 * 8);
        assert!(EdgeAdjacency::build(&s).is_closed());
        let v = s.volume();
        assert!(v > 0.0);
        assert!((v - 4.0 / 3.0 * PI).abs() < 0.15 * 4.0 / 3.0 * PI);
    }

    #[test]
    fn test_sphere_normals_are_radial() {
        let s = uv_sphere(3.0, 5, 8);
        for i in 0..s.vertex_count() {
            let n = s.vertex_normal(i).unwrap();
            let p = s.vertex(i).coords / 3.0;
            assert_relative_eq!((n - p).norm(), 0.0, epsilon = 1e-6);
        }
    }
}

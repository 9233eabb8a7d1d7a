//! Hole detection by tracing boundary edge rings.
//!
//! A hole is a closed ring of boundary edges (edges with one incident
//! triangle). Rings are oriented against their owning faces, so a hole in an
//! outward-facing surface runs clockwise when viewed from outside.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Point3, Vec3};
use tracing::{debug, warn};

use crate::adjacency::{has_directed_edge, Edge, EdgeAdjacency};
use crate::MeshData;

/// A traced boundary ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoleInfo {
    /// Ordered vertex indices around the ring (first vertex not repeated).
    pub vertices: Vec<u32>,
    /// Sum of ring edge lengths, including the closing edge.
    pub perimeter: f64,
    /// Average of the ring vertex positions.
    pub centroid: Point3,
    /// Planar area estimate from the Newell vector area of the ring.
    pub area: f64,
}

impl HoleInfo {
    /// Number of edges (and vertices) in the ring.
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    fn from_ring(mesh: &MeshData, vertices: Vec<u32>) -> Self {
        let points: Vec<Point3> = vertices.iter().map(|&v| mesh.vertex(v as usize)).collect();
        let n = points.len();
        let mut perimeter = 0.0;
        let mut newell = Vec3::zeros();
        let mut sum = Vec3::zeros();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            perimeter += (b - a).norm();
            newell += a.coords.cross(&b.coords);
            sum += a.coords;
        }
        let centroid = if n == 0 {
            Point3::origin()
        } else {
            Point3::from(sum / n as f64)
        };
        Self {
            vertices,
            perimeter,
            centroid,
            area: 0.5 * newell.norm(),
        }
    }
}

/// Find all holes in `mesh`.
pub fn find_holes(mesh: &MeshData) -> Vec<HoleInfo> {
    let adjacency = EdgeAdjacency::build(mesh);
    trace_holes(mesh, &adjacency)
}

/// Trace holes using prebuilt adjacency.
pub fn trace_holes(mesh: &MeshData, adjacency: &EdgeAdjacency) -> Vec<HoleInfo> {
    let boundary: Vec<(Edge, usize)> = adjacency
        .edges()
        .filter(|(_, f)| f.len() == 1)
        .map(|(e, f)| (e, f[0]))
        .collect();
    if boundary.is_empty() {
        return Vec::new();
    }

    let mut incident: HashMap<u32, Vec<Edge>> = HashMap::new();
    for &(e, _) in &boundary {
        incident.entry(e.v0()).or_default().push(e);
        incident.entry(e.v1()).or_default().push(e);
    }

    let cap = mesh.vertex_count() + 1;
    let mut visited: BTreeSet<Edge> = BTreeSet::new();
    let mut holes = Vec::new();

    for &(seed, face) in &boundary {
        if !visited.insert(seed) {
            continue;
        }
        // Walk opposite to the owning face's traversal of the edge.
        let tri = mesh.triangle_indices(face);
        let (start, mut front) = if has_directed_edge(tri, seed.v0(), seed.v1()) {
            (seed.v1(), seed.v0())
        } else {
            (seed.v0(), seed.v1())
        };

        let mut ring = vec![start];
        let mut closed = false;
        for _ in 0..cap {
            if front == start {
                closed = true;
                break;
            }
            ring.push(front);
            let next = incident
                .get(&front)
                .and_then(|edges| edges.iter().find(|e| !visited.contains(e)).copied());
            match next {
                Some(e) => {
                    visited.insert(e);
                    front = e.other(front).unwrap_or(front);
                }
                None => break,
            }
        }

        if closed && ring.len() >= 3 {
            holes.push(HoleInfo::from_ring(mesh, ring));
        } else {
            warn!(
                start,
                len = ring.len(),
                "boundary chain did not close into a ring"
            );
        }
    }

    debug!(holes = holes.len(), boundary_edges = boundary.len(), "traced holes");
    holes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::unit_cube;
    use approx::assert_relative_eq;

    fn cube_without_top() -> MeshData {
        // unit_cube stores the +Z face as triangles 2 and 3
        let mut b = unit_cube().into_builder();
        b.remove_face(3).remove_face(2);
        b.build().unwrap()
    }

    #[test]
    fn test_closed_cube_has_no_holes() {
        assert!(find_holes(&unit_cube()).is_empty());
    }

    #[test]
    fn test_open_top_square_hole() {
        let mesh = cube_without_top();
        let holes = find_holes(&mesh);
        assert_eq!(holes.len(), 1);
        let hole = &holes[0];
        assert_eq!(hole.edge_count(), 4);
        assert_relative_eq!(hole.perimeter, 4.0, epsilon = 1e-6);
        assert_relative_eq!(hole.area, 1.0, epsilon = 1e-6);
        assert_relative_eq!(hole.centroid.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(hole.centroid.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_single_triangle_is_one_hole() {
        let mesh = MeshData::from_raw(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
        .unwrap();
        let holes = find_holes(&mesh);
        assert_eq!(holes.len(), 1);
        // Ring runs opposite to the face winding
        assert_eq!(holes[0].vertices, vec![1, 0, 2]);
        assert_relative_eq!(holes[0].area, 0.5, epsilon = 1e-9);
    }
}

//! Edge and vertex incidence for indexed triangle meshes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MeshData;

/// An undirected mesh edge, stored canonically as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    v0: u32,
    v1: u32,
}

impl Edge {
    /// Create the canonical edge between two vertices.
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Smaller vertex index.
    pub fn v0(&self) -> u32 {
        self.v0
    }

    /// Larger vertex index.
    pub fn v1(&self) -> u32 {
        self.v1
    }

    /// The endpoint opposite `v`, or `None` if `v` is not on this edge.
    pub fn other(&self, v: u32) -> Option<u32> {
        if v == self.v0 {
            Some(self.v1)
        } else if v == self.v1 {
            Some(self.v0)
        } else {
            None
        }
    }

    /// True if `v` is an endpoint.
    pub fn contains(&self, v: u32) -> bool {
        v == self.v0 || v == self.v1
    }
}

/// Incidence maps from edges and vertices to triangles.
///
/// Edge iteration is ordered by the canonical vertex pair, so every
/// traversal built on top of it is deterministic.
#[derive(Debug, Clone, Default)]
pub struct EdgeAdjacency {
    edge_faces: BTreeMap<Edge, Vec<usize>>,
    vertex_faces: Vec<Vec<usize>>,
}

impl EdgeAdjacency {
    /// Build incidence for every triangle of `mesh`.
    ///
    /// Triangle edges whose endpoints coincide are not recorded.
    pub fn build(mesh: &MeshData) -> Self {
        let mut edge_faces: BTreeMap<Edge, Vec<usize>> = BTreeMap::new();
        let mut vertex_faces = vec![Vec::new(); mesh.vertex_count()];

        for (t, [a, b, c]) in mesh.triangles().enumerate() {
            for v in [a, b, c] {
                let faces: &mut Vec<usize> = &mut vertex_faces[v as usize];
                if faces.last() != Some(&t) {
                    faces.push(t);
                }
            }
            for (p, q) in [(a, b), (b, c), (c, a)] {
                if p != q {
                    edge_faces.entry(Edge::new(p, q)).or_default().push(t);
                }
            }
        }

        Self {
            edge_faces,
            vertex_faces,
        }
    }

    /// Triangles sharing the edge `(a, b)`, or `None` if it is not a mesh edge.
    pub fn faces_for_edge(&self, a: u32, b: u32) -> Option<&[usize]> {
        self.edge_faces.get(&Edge::new(a, b)).map(Vec::as_slice)
    }

    /// Triangles touching vertex `v` (empty for unreferenced vertices).
    pub fn faces_for_vertex(&self, v: u32) -> &[usize] {
        self.vertex_faces
            .get(v as usize)
            .map_or(&[], Vec::as_slice)
    }

    /// All edges with their incident triangles, in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = (Edge, &[usize])> + '_ {
        self.edge_faces.iter().map(|(&e, f)| (e, f.as_slice()))
    }

    /// Edges with exactly one incident triangle.
    pub fn boundary_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges().filter(|(_, f)| f.len() == 1).map(|(e, _)| e)
    }

    /// Edges with more than two incident triangles.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges().filter(|(_, f)| f.len() > 2).map(|(e, _)| e)
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edge_faces.len()
    }

    /// Number of boundary edges.
    pub fn boundary_edge_count(&self) -> usize {
        self.boundary_edges().count()
    }

    /// Number of edges shared by exactly two triangles.
    pub fn manifold_edge_count(&self) -> usize {
        self.edge_faces.values().filter(|f| f.len() == 2).count()
    }

    /// Number of non-manifold edges.
    pub fn non_manifold_edge_count(&self) -> usize {
        self.non_manifold_edges().count()
    }

    /// Every edge has at most two incident triangles.
    pub fn is_manifold(&self) -> bool {
        self.edge_faces.values().all(|f| f.len() <= 2)
    }

    /// Every edge has exactly two incident triangles.
    pub fn is_closed(&self) -> bool {
        !self.edge_faces.is_empty() && self.edge_faces.values().all(|f| f.len() == 2)
    }

    /// True if `v` lies on a boundary edge.
    pub fn is_boundary_vertex(&self, v: u32, mesh: &MeshData) -> bool {
        self.faces_for_vertex(v).iter().any(|&t| {
            let tri = mesh.triangle_indices(t);
            tri.iter()
                .filter(|&&w| w != v)
                .any(|&w| self.faces_for_edge(v, w).is_some_and(|f| f.len() == 1))
        })
    }

    /// Sorted, de-duplicated one-ring neighbours of `v`.
    pub fn vertex_neighbors(&self, v: u32, mesh: &MeshData) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .faces_for_vertex(v)
            .iter()
            .flat_map(|&t| mesh.triangle_indices(t))
            .filter(|&w| w != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// True if triangle `tri` traverses the directed edge `a → b`.
pub fn has_directed_edge(tri: [u32; 3], a: u32, b: u32) -> bool {
    (tri[0] == a && tri[1] == b) || (tri[1] == a && tri[2] == b) || (tri[2] == a && tri[0] == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::unit_cube;
    use std::collections::HashSet;

    #[test]
    fn test_edge_canonical() {
        let e = Edge::new(7, 3);
        assert_eq!(e.v0(), 3);
        assert_eq!(e.v1(), 7);
        assert_eq!(e, Edge::new(3, 7));
        assert_eq!(e.other(3), Some(7));
        assert_eq!(e.other(5), None);

        let mut set = HashSet::new();
        set.insert(Edge::new(1, 2));
        assert!(set.contains(&Edge::new(2, 1)));
    }

    #[test]
    fn test_two_triangles() {
        let mesh = MeshData::from_raw(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            vec![0, 1, 2, 1, 3, 2],
        )
        .unwrap();
        let adj = EdgeAdjacency::build(&mesh);
        assert_eq!(adj.edge_count(), 5);
        assert_eq!(adj.boundary_edge_count(), 4);
        assert_eq!(adj.manifold_edge_count(), 1);
        assert_eq!(adj.faces_for_edge(2, 1), Some(&[0, 1][..]));
        assert!(adj.faces_for_edge(0, 3).is_none());
        assert_eq!(adj.faces_for_vertex(1), &[0, 1]);
        assert!(adj.is_manifold());
        assert!(!adj.is_closed());
        assert!(adj.is_boundary_vertex(0, &mesh));
        assert_eq!(adj.vertex_neighbors(1, &mesh), vec![0, 2, 3]);
    }

    #[test]
    fn test_cube_is_closed() {
        let cube = unit_cube();
        let adj = EdgeAdjacency::build(&cube);
        assert_eq!(adj.edge_count(), 18);
        assert!(adj.is_closed());
        assert_eq!(adj.boundary_edge_count(), 0);
        // Deterministic canonical order
        let edges: Vec<Edge> = adj.edges().map(|(e, _)| e).collect();
        let mut sorted = edges.clone();
        sorted.sort();
        assert_eq!(edges, sorted);
    }

    #[test]
    fn test_non_manifold_fin() {
        // Three triangles sharing edge (0, 1)
        let mesh = MeshData::from_raw(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, -1.0, 0.0],
                [0.5, 0.0, 1.0],
            ],
            vec![0, 1, 2, 1, 0, 3, 0, 1, 4],
        )
        .unwrap();
        let adj = EdgeAdjacency::build(&mesh);
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert_eq!(adj.non_manifold_edges().next(), Some(Edge::new(0, 1)));
        assert!(!adj.is_manifold());
    }

    #[test]
    fn test_directed_edge() {
        assert!(has_directed_edge([0, 1, 2], 2, 0));
        assert!(!has_directed_edge([0, 1, 2], 0, 2));
    }
}

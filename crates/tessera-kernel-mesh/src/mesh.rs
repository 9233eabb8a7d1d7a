//! Indexed triangle mesh storage and its builder.

use std::sync::OnceLock;

use tessera_kernel_math::{Aabb3, Point3, Tolerance, Transform, Vec3};

use crate::error::{MeshError, Result};

/// Indexed triangle mesh.
///
/// Positions, normals and UVs are stored as `f32` the way renderers consume
/// them; every geometric query promotes to `f64`. A finalized mesh is
/// immutable: to edit it, convert it back with [`MeshData::into_builder`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    bounds: OnceLock<Aabb3>,
    centroid: OnceLock<Point3>,
}

impl MeshData {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw positions and a flat index buffer.
    pub fn from_raw(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Result<Self> {
        MeshBuilder {
            positions,
            indices,
            ..MeshBuilder::default()
        }
        .build()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw vertex positions.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Raw vertex normals (empty when absent).
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Raw texture coordinates (empty when absent).
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Flat triangle index buffer.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// True if per-vertex normals are stored.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Position of vertex `i` in double precision.
    pub fn vertex(&self, i: usize) -> Point3 {
        let [x, y, z] = self.positions[i];
        Point3::new(x as f64, y as f64, z as f64)
    }

    /// Stored normal of vertex `i`, if normals are present.
    pub fn vertex_normal(&self, i: usize) -> Option<Vec3> {
        self.normals
            .get(i)
            .map(|&[x, y, z]| Vec3::new(x as f64, y as f64, z as f64))
    }

    /// Vertex indices of triangle `t`.
    pub fn triangle_indices(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ]
    }

    /// Corner positions of triangle `t`.
    pub fn triangle(&self, t: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangle_indices(t);
        [
            self.vertex(a as usize),
            self.vertex(b as usize),
            self.vertex(c as usize),
        ]
    }

    /// Iterate over all triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Unnormalized face normal `(b - a) × (c - a)` of triangle `t`.
    pub fn triangle_cross(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.triangle(t);
        (b - a).cross(&(c - a))
    }

    /// Area of triangle `t`.
    pub fn triangle_area(&self, t: usize) -> f64 {
        0.5 * self.triangle_cross(t).norm()
    }

    /// Unit face normal of triangle `t`, or `None` when degenerate.
    pub fn triangle_normal(&self, t: usize) -> Option<Vec3> {
        let n = self.triangle_cross(t);
        let len = n.norm();
        if len < Tolerance::DEGENERATE_AREA {
            None
        } else {
            Some(n / len)
        }
    }

    /// A triangle is degenerate when two indices coincide or its area vanishes.
    pub fn is_degenerate_triangle(&self, t: usize) -> bool {
        let [a, b, c] = self.triangle_indices(t);
        a == b || b == c || a == c || self.triangle_cross(t).norm() < Tolerance::DEGENERATE_AREA
    }

    /// Number of degenerate triangles.
    pub fn degenerate_triangle_count(&self) -> usize {
        (0..self.triangle_count())
            .filter(|&t| self.is_degenerate_triangle(t))
            .count()
    }

    /// Bounding box of all vertices (cached after the first call).
    pub fn bounding_box(&self) -> Aabb3 {
        *self.bounds.get_or_init(|| {
            let mut aabb = Aabb3::empty();
            for i in 0..self.positions.len() {
                aabb.include_point(&self.vertex(i));
            }
            aabb
        })
    }

    /// Average of all vertex positions (cached after the first call).
    pub fn centroid(&self) -> Point3 {
        *self.centroid.get_or_init(|| {
            if self.positions.is_empty() {
                return Point3::origin();
            }
            let sum = (0..self.positions.len())
                .fold(Vec3::zeros(), |acc, i| acc + self.vertex(i).coords);
            Point3::from(sum / self.positions.len() as f64)
        })
    }

    /// Length of the bounding box diagonal.
    pub fn diagonal(&self) -> f64 {
        self.bounding_box().diagonal()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangle_count())
            .map(|t| self.triangle_area(t))
            .sum()
    }

    /// Signed enclosed volume by the divergence theorem.
    ///
    /// Positive for closed meshes with outward-facing (CCW) triangles.
    pub fn volume(&self) -> f64 {
        (0..self.triangle_count())
            .map(|t| {
                let [a, b, c] = self.triangle(t);
                a.coords.dot(&b.coords.cross(&c.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Apply an affine transform, returning a new mesh.
    ///
    /// Normals are re-derived from the transformed geometry when present.
    pub fn transformed(&self, transform: &Transform) -> MeshData {
        let positions = (0..self.vertex_count())
            .map(|i| {
                let p = transform.apply_point(&self.vertex(i));
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect();
        let mut builder = MeshBuilder {
            positions,
            normals: Vec::new(),
            uvs: self.uvs.clone(),
            indices: self.indices.clone(),
        };
        if self.has_normals() {
            builder.compute_normals();
        }
        // Indices and attribute lengths are unchanged, so validation cannot fail.
        builder.into_mesh_unchecked()
    }

    /// Convert back into a builder for wholesale edits.
    pub fn into_builder(self) -> MeshBuilder {
        MeshBuilder {
            positions: self.positions,
            normals: self.normals,
            uvs: self.uvs,
            indices: self.indices,
        }
    }
}

/// Incremental constructor for [`MeshData`].
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with preallocated storage.
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, p: Point3) -> u32 {
        self.positions.push([p.x as f32, p.y as f32, p.z as f32]);
        (self.positions.len() - 1) as u32
    }

    /// Append a triangle and return its index.
    pub fn add_face(&mut self, a: u32, b: u32, c: u32) -> usize {
        self.indices.extend_from_slice(&[a, b, c]);
        self.indices.len() / 3 - 1
    }

    /// Replace per-vertex normals.
    pub fn set_normals(&mut self, normals: Vec<[f32; 3]>) -> &mut Self {
        self.normals = normals;
        self
    }

    /// Replace per-vertex texture coordinates.
    pub fn set_uvs(&mut self, uvs: Vec<[f32; 2]>) -> &mut Self {
        self.uvs = uvs;
        self
    }

    /// Number of vertices added so far.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles added so far.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Reverse the winding of triangle `t` (no-op if out of range).
    pub fn flip_face(&mut self, t: usize) -> &mut Self {
        let base = t * 3;
        if base + 2 < self.indices.len() {
            self.indices.swap(base + 1, base + 2);
        }
        self
    }

    /// Remove triangle `t` (no-op if out of range).
    pub fn remove_face(&mut self, t: usize) -> &mut Self {
        let base = t * 3;
        if base + 2 < self.indices.len() {
            self.indices.drain(base..base + 3);
        }
        self
    }

    /// Fill vertex normals with area-weighted face normals.
    ///
    /// Out-of-range indices are skipped here; [`MeshBuilder::build`] reports them.
    pub fn compute_normals(&mut self) -> &mut Self {
        let mut acc = vec![Vec3::zeros(); self.positions.len()];
        let point = |i: u32| {
            let [x, y, z] = self.positions[i as usize];
            Point3::new(x as f64, y as f64, z as f64)
        };
        for tri in self.indices.chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= self.positions.len()) {
                continue;
            }
            let (a, b, c) = (point(tri[0]), point(tri[1]), point(tri[2]));
            let n = (b - a).cross(&(c - a));
            for &i in tri {
                acc[i as usize] += n;
            }
        }
        self.normals = acc
            .into_iter()
            .map(|n| {
                let n = n.try_normalize(1e-20).unwrap_or_else(Vec3::zeros);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();
        self
    }

    /// Validate and finalize the mesh.
    pub fn build(self) -> Result<MeshData> {
        let vertex_count = self.positions.len();
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle(self.indices.len()));
        }
        if let Some(i) = self
            .positions
            .iter()
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(MeshError::NonFiniteVertex(i));
        }
        if let Some((pos, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                triangle: pos / 3,
                index,
                vertex_count,
            });
        }
        if !self.normals.is_empty() && self.normals.len() != vertex_count {
            return Err(MeshError::NormalCountMismatch {
                normals: self.normals.len(),
                vertices: vertex_count,
            });
        }
        if !self.uvs.is_empty() && self.uvs.len() != vertex_count {
            return Err(MeshError::UvCountMismatch {
                uvs: self.uvs.len(),
                vertices: vertex_count,
            });
        }
        Ok(self.into_mesh_unchecked())
    }

    fn into_mesh_unchecked(self) -> MeshData {
        MeshData {
            positions: self.positions,
            normals: self.normals,
            uvs: self.uvs,
            indices: self.indices,
            bounds: OnceLock::new(),
            centroid: OnceLock::new(),
        }
    }
}

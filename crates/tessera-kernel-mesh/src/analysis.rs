//! One-shot topology and quality analysis.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb3, Point3, Progress, ProgressFn};
use tracing::{debug, info};

use crate::adjacency::{has_directed_edge, Edge, EdgeAdjacency};
use crate::curvature::CurvatureKind;
use crate::error::{MeshError, Result};
use crate::holes::{trace_holes, HoleInfo};
use crate::MeshData;

/// Number of progress milestones reported by [`analyze`].
const PHASES: f64 = 8.0;

/// Settings for mesh analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Curvature quantity used for per-vertex coloring.
    pub curvature: CurvatureKind,
    /// Trace boundary rings into [`HoleInfo`] records.
    pub trace_holes: bool,
    /// Triangles with an aspect ratio above this count as poorly shaped.
    pub max_aspect_ratio: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            curvature: CurvatureKind::Mean,
            trace_holes: true,
            max_aspect_ratio: 10.0,
        }
    }
}

impl AnalysisOptions {
    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.max_aspect_ratio.is_finite() || self.max_aspect_ratio < 1.0 {
            return Err(MeshError::InvalidOptions(format!(
                "max_aspect_ratio must be finite and >= 1, got {}",
                self.max_aspect_ratio
            )));
        }
        Ok(())
    }
}

/// Everything [`analyze`] learns about a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAnalysisStats {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of triangles.
    pub face_count: usize,
    /// Number of distinct edges.
    pub edge_count: usize,
    /// Edges with one incident triangle.
    pub boundary_edge_count: usize,
    /// Edges with two incident triangles.
    pub manifold_edge_count: usize,
    /// Edges with more than two incident triangles.
    pub non_manifold_edge_count: usize,
    /// Triangles with repeated indices or vanishing area.
    pub degenerate_face_count: usize,
    /// Vertices not used by any triangle.
    pub unreferenced_vertex_count: usize,
    /// Total surface area.
    pub surface_area: f64,
    /// Signed enclosed volume.
    pub volume: f64,
    /// Bounding box of all vertices.
    pub bounding_box: Aabb3,
    /// Vertex average.
    pub centroid: Point3,
    /// Shortest edge.
    pub min_edge_length: f64,
    /// Longest edge.
    pub max_edge_length: f64,
    /// Mean edge length.
    pub avg_edge_length: f64,
    /// Smallest non-degenerate triangle area.
    pub min_face_area: f64,
    /// Largest triangle area.
    pub max_face_area: f64,
    /// Mean triangle area (degenerate triangles count as zero).
    pub avg_face_area: f64,
    /// Best aspect ratio (1 is equilateral).
    pub min_aspect_ratio: f64,
    /// Worst aspect ratio over non-degenerate triangles.
    pub max_aspect_ratio: f64,
    /// Triangles above [`AnalysisOptions::max_aspect_ratio`].
    pub poor_aspect_count: usize,
    /// True when every manifold edge is traversed in opposite directions.
    pub winding_consistent: bool,
    /// Manifold edges traversed in the same direction by both triangles.
    pub inconsistent_edge_count: usize,
    /// Closed, manifold and consistently wound.
    pub is_watertight: bool,
    /// No edge has more than two incident triangles.
    pub is_manifold: bool,
    /// Number of traced holes.
    pub hole_count: usize,
    /// Traced holes.
    pub holes: Vec<HoleInfo>,
    /// Number of face-connected components.
    pub component_count: usize,
    /// `V − E + F` over referenced vertices.
    pub euler_characteristic: i64,
    /// Analysis stopped early at the caller's request.
    pub cancelled: bool,
}

impl MeshAnalysisStats {
    /// Zeroed statistics, as reported for an empty mesh.
    pub fn empty() -> Self {
        Self {
            vertex_count: 0,
            face_count: 0,
            edge_count: 0,
            boundary_edge_count: 0,
            manifold_edge_count: 0,
            non_manifold_edge_count: 0,
            degenerate_face_count: 0,
            unreferenced_vertex_count: 0,
            surface_area: 0.0,
            volume: 0.0,
            bounding_box: Aabb3::empty(),
            centroid: Point3::origin(),
            min_edge_length: 0.0,
            max_edge_length: 0.0,
            avg_edge_length: 0.0,
            min_face_area: 0.0,
            max_face_area: 0.0,
            avg_face_area: 0.0,
            min_aspect_ratio: 0.0,
            max_aspect_ratio: 0.0,
            poor_aspect_count: 0,
            winding_consistent: true,
            inconsistent_edge_count: 0,
            is_watertight: false,
            is_manifold: true,
            hole_count: 0,
            holes: Vec::new(),
            component_count: 0,
            euler_characteristic: 0,
            cancelled: false,
        }
    }
}

impl Default for MeshAnalysisStats {
    fn default() -> Self {
        Self::empty()
    }
}

/// Analyze `mesh` with default options.
pub fn analyze(mesh: &MeshData, progress: Option<ProgressFn<'_>>) -> MeshAnalysisStats {
    analyze_with(mesh, &AnalysisOptions::default(), progress)
}

/// Analyze `mesh`, reporting progress between phases.
///
/// If the callback returns `false`, analysis stops at the next phase
/// boundary and the partially filled stats carry `cancelled = true`.
pub fn analyze_with(
    mesh: &MeshData,
    options: &AnalysisOptions,
    progress: Option<ProgressFn<'_>>,
) -> MeshAnalysisStats {
    let mut progress = Progress::new(progress);
    let mut stats = MeshAnalysisStats::empty();
    stats.vertex_count = mesh.vertex_count();
    stats.face_count = mesh.triangle_count();

    if mesh.is_empty() {
        stats.unreferenced_vertex_count = mesh.vertex_count();
        progress.report(1.0);
        return stats;
    }

    info!(
        vertices = stats.vertex_count,
        faces = stats.face_count,
        "starting mesh analysis"
    );

    macro_rules! milestone {
        ($phase:expr, $name:expr) => {
            debug!(phase = $name, "analysis phase complete");
            if !progress.report($phase as f64 / PHASES) {
                debug!(phase = $name, "analysis cancelled");
                stats.cancelled = true;
                return stats;
            }
        };
    }

    // Edge adjacency
    let adjacency = EdgeAdjacency::build(mesh);
    stats.edge_count = adjacency.edge_count();
    milestone!(1, "adjacency");

    // Bounds and area
    stats.bounding_box = mesh.bounding_box();
    stats.centroid = mesh.centroid();
    stats.surface_area = mesh.surface_area();
    stats.volume = mesh.volume();
    milestone!(2, "bounds");

    // Edge lengths
    if stats.edge_count > 0 {
        let mut min = f64::INFINITY;
        let mut max = 0.0f64;
        let mut sum = 0.0;
        for (e, _) in adjacency.edges() {
            let len = (mesh.vertex(e.v1() as usize) - mesh.vertex(e.v0() as usize)).norm();
            min = min.min(len);
            max = max.max(len);
            sum += len;
        }
        stats.min_edge_length = min;
        stats.max_edge_length = max;
        stats.avg_edge_length = sum / stats.edge_count as f64;
    }
    milestone!(3, "edge_stats");

    // Face areas and shape
    face_stats(mesh, options, &mut stats);
    milestone!(4, "face_stats");

    // Topology
    stats.boundary_edge_count = adjacency.boundary_edge_count();
    stats.manifold_edge_count = adjacency.manifold_edge_count();
    stats.non_manifold_edge_count = adjacency.non_manifold_edge_count();
    let referenced = referenced_vertices(mesh);
    stats.unreferenced_vertex_count = referenced.iter().filter(|&&r| !r).count();
    stats.component_count = count_components(mesh, &referenced);
    let v_ref = (stats.vertex_count - stats.unreferenced_vertex_count) as i64;
    stats.euler_characteristic = v_ref - stats.edge_count as i64 + stats.face_count as i64;
    milestone!(5, "topology");

    // Winding
    stats.inconsistent_edge_count = inconsistent_edges(mesh, &adjacency).len();
    stats.winding_consistent = stats.inconsistent_edge_count == 0;
    milestone!(6, "winding");

    // Holes
    if options.trace_holes {
        stats.holes = trace_holes(mesh, &adjacency);
    }
    milestone!(7, "holes");

    // Summary flags
    stats.hole_count = stats.holes.len();
    stats.is_manifold = stats.non_manifold_edge_count == 0;
    stats.is_watertight = stats.boundary_edge_count == 0
        && stats.is_manifold
        && stats.winding_consistent
        && stats.edge_count > 0;
    milestone!(8, "counts");

    info!(
        edges = stats.edge_count,
        boundary = stats.boundary_edge_count,
        non_manifold = stats.non_manifold_edge_count,
        holes = stats.hole_count,
        watertight = stats.is_watertight,
        "mesh analysis complete"
    );
    stats
}

fn face_stats(mesh: &MeshData, options: &AnalysisOptions, stats: &mut MeshAnalysisStats) {
    let mut min_area = f64::INFINITY;
    let mut max_area = 0.0f64;
    let mut min_aspect = f64::INFINITY;
    let mut max_aspect = 0.0f64;
    let mut degenerate = 0;
    let mut poor = 0;

    for t in 0..mesh.triangle_count() {
        if mesh.is_degenerate_triangle(t) {
            degenerate += 1;
            continue;
        }
        let area = mesh.triangle_area(t);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
        let aspect = aspect_ratio(&mesh.triangle(t));
        min_aspect = min_aspect.min(aspect);
        max_aspect = max_aspect.max(aspect);
        if aspect > options.max_aspect_ratio {
            poor += 1;
        }
    }

    stats.degenerate_face_count = degenerate;
    stats.poor_aspect_count = poor;
    stats.avg_face_area = stats.surface_area / mesh.triangle_count() as f64;
    if degenerate < mesh.triangle_count() {
        stats.min_face_area = min_area;
        stats.max_face_area = max_area;
        stats.min_aspect_ratio = min_aspect;
        stats.max_aspect_ratio = max_aspect;
    }
}

/// Longest edge times perimeter over `4√3 · area`; 1 for an equilateral triangle.
pub fn aspect_ratio(tri: &[Point3; 3]) -> f64 {
    let [a, b, c] = tri;
    let la = (b - a).norm();
    let lb = (c - b).norm();
    let lc = (a - c).norm();
    let area = 0.5 * (b - a).cross(&(c - a)).norm();
    if area <= 0.0 {
        return f64::INFINITY;
    }
    la.max(lb).max(lc) * (la + lb + lc) / (4.0 * 3f64.sqrt() * area)
}

fn referenced_vertices(mesh: &MeshData) -> Vec<bool> {
    let mut used = vec![false; mesh.vertex_count()];
    for &i in mesh.indices() {
        used[i as usize] = true;
    }
    used
}

fn count_components(mesh: &MeshData, referenced: &[bool]) -> usize {
    let mut parent: Vec<usize> = (0..mesh.vertex_count()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for [a, b, c] in mesh.triangles() {
        for (p, q) in [(a, b), (b, c)] {
            let rp = find(&mut parent, p as usize);
            let rq = find(&mut parent, q as usize);
            if rp != rq {
                parent[rp] = rq;
            }
        }
    }

    (0..mesh.vertex_count())
        .filter(|&v| referenced[v] && find(&mut parent, v) == v)
        .count()
}

/// Manifold edges that both incident triangles traverse in the same direction.
pub fn inconsistent_edges(mesh: &MeshData, adjacency: &EdgeAdjacency) -> Vec<Edge> {
    adjacency
        .edges()
        .filter(|(_, faces)| faces.len() == 2)
        .filter(|(e, faces)| {
            let f0 = mesh.triangle_indices(faces[0]);
            let f1 = mesh.triangle_indices(faces[1]);
            has_directed_edge(f0, e.v0(), e.v1()) == has_directed_edge(f1, e.v0(), e.v1())
        })
        .map(|(e, _)| e)
        .collect()
}

/// Closed, manifold and consistently wound.
pub fn is_watertight(mesh: &MeshData) -> bool {
    let adjacency = EdgeAdjacency::build(mesh);
    adjacency.is_closed() && inconsistent_edges(mesh, &adjacency).is_empty()
}

/// No edge has more than two incident triangles.
///
/// Vertex fans are not examined: two surfaces touching at a single vertex
/// still count as manifold.
pub fn is_manifold(mesh: &MeshData) -> bool {
    EdgeAdjacency::build(mesh).is_manifold()
}

/// Edges with exactly one incident triangle, in canonical order.
pub fn find_boundary_edges(mesh: &MeshData) -> Vec<Edge> {
    EdgeAdjacency::build(mesh).boundary_edges().collect()
}

/// Edges with more than two incident triangles, in canonical order.
pub fn find_non_manifold_edges(mesh: &MeshData) -> Vec<Edge> {
    EdgeAdjacency::build(mesh).non_manifold_edges().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{unit_cube, uv_sphere};
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube_is_watertight() {
        let cube = unit_cube();
        let stats = analyze(&cube, None);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.face_count, 12);
        assert_eq!(stats.edge_count, 18);
        assert_eq!(stats.boundary_edge_count, 0);
        assert_eq!(stats.manifold_edge_count, 18);
        assert_eq!(stats.non_manifold_edge_count, 0);
        assert!(stats.winding_consistent);
        assert!(stats.is_watertight);
        assert!(stats.is_manifold);
        assert_eq!(stats.hole_count, 0);
        assert_eq!(stats.component_count, 1);
        assert_eq!(stats.euler_characteristic, 2);
        assert_relative_eq!(stats.volume, 1.0, epsilon = 1e-6);
        assert_relative_eq!(stats.surface_area, 6.0, epsilon = 1e-6);
        assert_relative_eq!(stats.min_edge_length, 1.0, epsilon = 1e-6);
        assert_relative_eq!(stats.max_edge_length, 2f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(stats.avg_face_area, 0.5, epsilon = 1e-9);
        assert!(stats.min_aspect_ratio >= 1.0);
        assert!(!stats.cancelled);
        assert!(is_watertight(&cube));
        assert!(is_manifold(&cube));
    }

    #[test]
    fn test_single_flip_detected() {
        let mut b = unit_cube().into_builder();
        b.flip_face(5);
        let mesh = b.build().unwrap();
        let stats = analyze(&mesh, None);
        assert!(!stats.winding_consistent);
        // The flipped triangle disagrees with all three neighbours
        assert_eq!(stats.inconsistent_edge_count, 3);
        assert!(!stats.is_watertight);
        assert!(!is_watertight(&mesh));
        assert!(is_manifold(&mesh));
    }

    #[test]
    fn test_hole_detection() {
        let mut b = unit_cube().into_builder();
        b.remove_face(3).remove_face(2);
        let mesh = b.build().unwrap();
        let stats = analyze(&mesh, None);
        assert_eq!(stats.boundary_edge_count, 4);
        assert_eq!(stats.hole_count, 1);
        assert_eq!(stats.holes[0].vertices.len(), 4);
        assert_relative_eq!(stats.holes[0].perimeter, 4.0, epsilon = 1e-6);
        assert!(!stats.is_watertight);
        assert_eq!(find_boundary_edges(&mesh).len(), 4);
        assert_eq!(stats.euler_characteristic, 1);
    }

    #[test]
    fn test_empty_mesh_zeroed() {
        let stats = analyze(&MeshData::new(), None);
        assert_eq!(stats.face_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.surface_area, 0.0);
        assert!(!stats.is_watertight);
        assert!(stats.holes.is_empty());
    }

    #[test]
    fn test_cancellation_stops_early() {
        let mut calls = Vec::new();
        let mut cb = |f: f64| {
            calls.push(f);
            f < 0.3
        };
        let stats = analyze(&unit_cube(), Some(&mut cb));
        assert!(stats.cancelled);
        assert_eq!(stats.edge_count, 18);
        // Stopped before the topology phase filled in its counts
        assert_eq!(stats.boundary_edge_count, 0);
        assert_eq!(stats.component_count, 0);
        assert_eq!(calls, vec![0.125, 0.25, 0.375]);
    }

    #[test]
    fn test_progress_is_monotonic_and_complete() {
        let mut calls = Vec::new();
        let mut cb = |f: f64| {
            calls.push(f);
            true
        };
        analyze(&uv_sphere(1.0, 5, 8), Some(&mut cb));
        assert_eq!(calls.len(), 8);
        assert!(calls.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(calls.last(), Some(&1.0));
    }

    #[test]
    fn test_unreferenced_and_components() {
        let mut b = unit_cube().into_builder();
        b.add_vertex(Point3::new(9.0, 9.0, 9.0));
        let base = b.vertex_count() as u32;
        b.add_vertex(Point3::new(5.0, 0.0, 0.0));
        b.add_vertex(Point3::new(6.0, 0.0, 0.0));
        b.add_vertex(Point3::new(5.0, 1.0, 0.0));
        b.add_face(base, base + 1, base + 2);
        let stats = analyze(&b.build().unwrap(), None);
        assert_eq!(stats.unreferenced_vertex_count, 1);
        assert_eq!(stats.component_count, 2);
    }

    #[test]
    fn test_non_manifold_reported() {
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
        assert!(!is_manifold(&mesh));
        assert_eq!(find_non_manifold_edges(&mesh), vec![Edge::new(0, 1)]);
    }

    #[test]
    fn test_aspect_ratio_equilateral() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3f64.sqrt() / 2.0, 0.0),
        ];
        assert_relative_eq!(aspect_ratio(&tri), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_options_validate() {
        assert!(AnalysisOptions::default().validate().is_ok());
        let bad = AnalysisOptions {
            max_aspect_ratio: 0.5,
            ..AnalysisOptions::default()
        };
        assert!(bad.validate().is_err());
    }
}

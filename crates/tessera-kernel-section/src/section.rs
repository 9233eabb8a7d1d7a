//! Mesh/plane intersection and segment chaining.

use std::collections::HashSet;

use tessera_kernel_math::{Point3, Vec3};
use tessera_kernel_mesh::MeshData;
use tracing::{debug, warn};

use crate::types::{EdgeSegment, Polyline, SectionOptions, SectionPlane, SectionResult};

/// Side of the plane a vertex lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    Below,
    On,
}

fn classify(d: f64, tol: f64) -> Side {
    if d > tol {
        Side::Above
    } else if d < -tol {
        Side::Below
    } else {
        Side::On
    }
}

/// Crossing point of edge `(i, j)`, always computed from the lower index so
/// both triangles sharing the edge produce bit-identical points.
fn edge_crossing(mesh: &MeshData, i: u32, j: u32, di: f64, dj: f64) -> Point3 {
    let (a, b, da, db) = if i <= j { (i, j, di, dj) } else { (j, i, dj, di) };
    let pa = mesh.vertex(a as usize);
    let pb = mesh.vertex(b as usize);
    pa + (pb - pa) * (da / (da - db))
}

/// Intersect triangle `t` with `plane`.
///
/// Returns a segment when exactly two distinct points lie on the plane. The
/// segment is oriented so that it runs along `plane.normal × face_normal`,
/// which makes sections of outward-facing closed meshes counter-clockwise
/// when viewed from the positive side.
pub fn intersect_triangle(
    mesh: &MeshData,
    t: usize,
    plane: &SectionPlane,
    tol: f64,
) -> Option<EdgeSegment> {
    let idx = mesh.triangle_indices(t);
    let d = idx.map(|i| plane.signed_distance(&mesh.vertex(i as usize)));
    let side = d.map(|di| classify(di, tol));

    if side.iter().all(|&s| s == Side::On) {
        return None;
    }

    let mut points: Vec<Point3> = Vec::with_capacity(3);
    let push_unique = |p: Point3, points: &mut Vec<Point3>| {
        if !points.iter().any(|q| (q - p).norm() < tol) {
            points.push(p);
        }
    };

    for k in 0..3 {
        if side[k] == Side::On {
            push_unique(mesh.vertex(idx[k] as usize), &mut points);
        }
    }
    for (k, l) in [(0, 1), (1, 2), (2, 0)] {
        let straddles = matches!(
            (side[k], side[l]),
            (Side::Above, Side::Below) | (Side::Below, Side::Above)
        );
        if straddles {
            push_unique(edge_crossing(mesh, idx[k], idx[l], d[k], d[l]), &mut points);
        }
    }

    if points.len() != 2 {
        return None;
    }

    let (mut start, mut end) = (points[0], points[1]);
    let along = plane.normal.cross(&mesh.triangle_cross(t));
    if (end - start).dot(&along) < 0.0 {
        std::mem::swap(&mut start, &mut end);
    }
    Some(EdgeSegment {
        start,
        end,
        triangle: t,
    })
}

/// Quantized endpoint pair used to drop segments emitted twice for an
/// on-plane edge shared by two triangles.
fn segment_key(s: &EdgeSegment, tol: f64) -> [(i64, i64, i64); 2] {
    let key = |p: &Point3| {
        let scale = 1.0 / tol;
        (
            (p.x * scale).round() as i64,
            (p.y * scale).round() as i64,
            (p.z * scale).round() as i64,
        )
    };
    let (a, b) = (key(&s.start), key(&s.end));
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Cut `mesh` with `plane`.
///
/// Coplanar triangles contribute nothing. An empty mesh or a plane that
/// misses the mesh yields an empty, successful result.
pub fn section_mesh(mesh: &MeshData, plane: &SectionPlane, options: &SectionOptions) -> SectionResult {
    let mut result = SectionResult {
        plane: *plane,
        polylines: Vec::new(),
        segments: Vec::new(),
        success: true,
    };
    if let Err(e) = options.validate() {
        warn!(error = %e, "section options rejected");
        result.success = false;
        return result;
    }

    let tol = options.tolerance;
    let mut seen = HashSet::new();
    for t in 0..mesh.triangle_count() {
        if let Some(seg) = intersect_triangle(mesh, t, plane, tol) {
            if seen.insert(segment_key(&seg, tol)) {
                result.segments.push(seg);
            }
        }
    }

    if options.chain {
        result.polylines = chain_segments(&result.segments, tol);
        if options.simplify {
            for polyline in &mut result.polylines {
                simplify_polyline(polyline, options.simplify_tolerance);
            }
        }
    }

    debug!(
        triangles = mesh.triangle_count(),
        segments = result.segments.len(),
        polylines = result.polylines.len(),
        closed = result.closed_count(),
        "section computed"
    );
    result
}

/// Cut `count` parallel planes spaced `spacing` apart, starting at `plane`.
pub fn section_parallel(
    mesh: &MeshData,
    plane: &SectionPlane,
    spacing: f64,
    count: usize,
    options: &SectionOptions,
) -> Vec<SectionResult> {
    (0..count)
        .map(|k| section_mesh(mesh, &plane.offset(k as f64 * spacing), options))
        .collect()
}

/// Join segments that share endpoints (within `tol`) into polylines.
///
/// Each chain is seeded from the first unused segment and grown forward
/// from its end, then backward from its start. Matched endpoints are
/// snapped to the existing chain point. A chain whose ends meet is closed
/// and its duplicate final point removed.
pub fn chain_segments(segments: &[EdgeSegment], tol: f64) -> Vec<Polyline> {
    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();

    // Find an unused segment touching `p`; returns the far endpoint.
    let take_next = |used: &mut Vec<bool>, p: &Point3| -> Option<Point3> {
        for (i, s) in segments.iter().enumerate() {
            if used[i] {
                continue;
            }
            if (s.start - p).norm() < tol {
                used[i] = true;
                return Some(s.end);
            }
            if (s.end - p).norm() < tol {
                used[i] = true;
                return Some(s.start);
            }
        }
        None
    };

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let first = segments[seed].start;
        let mut chain = vec![first, segments[seed].end];

        // Forward
        let mut closed = false;
        while let Some(next) = take_next(&mut used, &chain[chain.len() - 1]) {
            if (next - first).norm() < tol {
                closed = true;
                break;
            }
            chain.push(next);
        }

        // Backward
        if !closed {
            let mut front = Vec::new();
            let mut current = first;
            while let Some(prev) = take_next(&mut used, &current) {
                front.push(prev);
                current = prev;
            }
            if !front.is_empty() {
                front.reverse();
                front.extend(chain);
                chain = front;
            }
            if chain.len() >= 3 && (chain[0] - chain[chain.len() - 1]).norm() < tol {
                chain.pop();
                closed = true;
            }
        }

        polylines.push(Polyline::new(chain, closed));
    }

    polylines
}

/// Remove interior vertices whose incoming and outgoing directions agree
/// within `tol` (`dot ≥ 1 − tol`). Closed polylines keep at least three
/// vertices, open ones keep their endpoints.
pub fn simplify_polyline(polyline: &mut Polyline, tol: f64) {
    let min_len = if polyline.closed { 3 } else { 2 };
    if polyline.points.len() <= min_len {
        return;
    }

    let direction = |a: &Point3, b: &Point3| -> Option<Vec3> { (b - a).try_normalize(1e-15) };
    let collinear = |prev: &Point3, cur: &Point3, next: &Point3| match (
        direction(prev, cur),
        direction(cur, next),
    ) {
        (Some(u), Some(v)) => u.dot(&v) >= 1.0 - tol,
        // Coincident neighbours carry no shape information.
        _ => true,
    };

    let points = &polyline.points;
    let n = points.len();
    let mut kept: Vec<Point3> = Vec::with_capacity(n);

    if polyline.closed {
        for i in 0..n {
            let prev = kept.last().copied().unwrap_or(points[(i + n - 1) % n]);
            let next = points[(i + 1) % n];
            if !collinear(&prev, &points[i], &next) {
                kept.push(points[i]);
            }
        }
        // The first vertex was judged against an unsimplified predecessor.
        if kept.len() >= 3 {
            let last = kept[kept.len() - 1];
            if collinear(&last, &kept[0], &kept[1]) {
                kept.remove(0);
            }
        }
        if kept.len() < 3 {
            return;
        }
    } else {
        kept.push(points[0]);
        for i in 1..n - 1 {
            let prev = kept[kept.len() - 1];
            if !collinear(&prev, &points[i], &points[i + 1]) {
                kept.push(points[i]);
            }
        }
        kept.push(points[n - 1]);
    }

    polyline.points = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;
    use tessera_kernel_mesh::{unit_cube, uv_sphere};

    #[test]
    fn test_triangle_straddling() {
        let mesh = MeshData::from_raw(
            vec![[0.0, 0.0, -1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
            vec![0, 1, 2],
        )
        .unwrap();
        let seg = intersect_triangle(&mesh, 0, &SectionPlane::xy(0.0), 1e-9).unwrap();
        assert_relative_eq!(seg.start.z, 0.0);
        assert_relative_eq!(seg.length(), (2f64).sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_touching_vertex_dropped() {
        let mesh = MeshData::from_raw(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
            vec![0, 1, 2],
        )
        .unwrap();
        assert!(intersect_triangle(&mesh, 0, &SectionPlane::xy(0.0), 1e-9).is_none());
        // Coplanar
        assert!(intersect_triangle(&mesh, 0, &SectionPlane::xy(5.0), 1e-9).is_none());
        let flat = MeshData::from_raw(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
        .unwrap();
        assert!(intersect_triangle(&flat, 0, &SectionPlane::xy(0.0), 1e-9).is_none());
    }

    #[test]
    fn test_cube_section_square() {
        let cube = unit_cube();
        let result = section_mesh(&cube, &SectionPlane::xy(0.5), &SectionOptions::default());
        assert!(result.success);
        assert_eq!(result.segments.len(), 8);
        assert_eq!(result.polylines.len(), 1);
        let loop_ = &result.polylines[0];
        assert!(loop_.closed);
        assert_relative_eq!(loop_.length(), 4.0, epsilon = 1e-9);
        // Counter-clockwise seen from +Z
        assert!(loop_.vector_area().z > 0.0);
    }

    #[test]
    fn test_simplify_cube_section() {
        let cube = unit_cube();
        let options = SectionOptions {
            simplify: true,
            ..SectionOptions::default()
        };
        let result = section_mesh(&cube, &SectionPlane::xy(0.5), &options);
        let loop_ = &result.polylines[0];
        assert!(loop_.closed);
        assert_eq!(loop_.len(), 4);
        assert_relative_eq!(loop_.length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_section_perimeter() {
        let sphere = uv_sphere(1.0, 31, 128);
        let result = section_mesh(&sphere, &SectionPlane::xy(0.0), &SectionOptions::default());
        assert_eq!(result.polylines.len(), 1);
        let loop_ = &result.polylines[0];
        assert!(loop_.closed);
        assert!((loop_.length() - TAU).abs() / TAU < 0.01);
        for seg in &result.segments {
            let [a, b, c] = sphere.triangle(seg.triangle);
            let signs = [a.z > 0.0, b.z > 0.0, c.z > 0.0];
            assert!(signs.iter().any(|&s| s) && signs.iter().any(|&s| !s));
        }
    }

    #[test]
    fn test_bottom_face_on_plane() {
        // The bottom face is coplanar and skipped; each side face touches
        // the plane along one edge.
        let cube = unit_cube();
        let result = section_mesh(&cube, &SectionPlane::xy(0.0), &SectionOptions::default());
        assert_eq!(result.segments.len(), 4);
        assert_eq!(result.polylines.len(), 1);
        assert!(result.polylines[0].closed);
        assert_relative_eq!(result.polylines[0].length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shared_on_plane_edges_emitted_once() {
        // An even stack count puts a vertex ring on z = 0, so every equator
        // edge is cut by the triangle above it and the one below it.
        let sphere = uv_sphere(1.0, 8, 16);
        let result = section_mesh(&sphere, &SectionPlane::xy(0.0), &SectionOptions::default());
        assert_eq!(result.segments.len(), 16);
        assert_eq!(result.polylines.len(), 1);
        assert!(result.polylines[0].closed);
        assert_eq!(result.polylines[0].len(), 16);
    }

    #[test]
    fn test_miss_and_empty() {
        let cube = unit_cube();
        let miss = section_mesh(&cube, &SectionPlane::xy(3.0), &SectionOptions::default());
        assert!(miss.success);
        assert!(miss.polylines.is_empty());
        let empty = section_mesh(&MeshData::new(), &SectionPlane::xy(0.0), &SectionOptions::default());
        assert!(empty.success);
        assert!(empty.segments.is_empty());
    }

    #[test]
    fn test_invalid_options_fail() {
        let bad = SectionOptions {
            tolerance: -1.0,
            ..SectionOptions::default()
        };
        let result = section_mesh(&unit_cube(), &SectionPlane::xy(0.5), &bad);
        assert!(!result.success);
    }

    #[test]
    fn test_open_chain_extends_backward() {
        let p = |x: f64| Point3::new(x, 0.0, 0.0);
        let segments = vec![
            EdgeSegment { start: p(1.0), end: p(2.0), triangle: 0 },
            EdgeSegment { start: p(0.0), end: p(1.0), triangle: 1 },
            EdgeSegment { start: p(3.0), end: p(2.0), triangle: 2 },
        ];
        let chains = chain_segments(&segments, 1e-9);
        assert_eq!(chains.len(), 1);
        assert!(!chains[0].closed);
        let xs: Vec<f64> = chains[0].points.iter().map(|q| q.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);

        let mut line = chains[0].clone();
        simplify_polyline(&mut line, 1e-9);
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn test_parallel_sections() {
        let cube = unit_cube();
        let results = section_parallel(&cube, &SectionPlane::xy(0.25), 0.25, 3, &SectionOptions::default());
        assert_eq!(results.len(), 3);
        for r in &results {
            assert_eq!(r.closed_count(), 1);
            assert_relative_eq!(r.total_length(), 4.0, epsilon = 1e-9);
        }
        assert_relative_eq!(results[2].plane.origin.z, 0.75);
    }
}

//! KD-tree over mesh triangles for nearest-point and ray crossing queries.
//!
//! Triangles are split at the median centroid along `depth mod 3`, down to
//! one triangle per leaf. Every node keeps the bounding box of its subtree
//! so queries can prune whole branches.

use tessera_kernel_math::{Aabb3, Point3};
use tessera_kernel_mesh::MeshData;
use tracing::debug;

use crate::triangle::{closest_point_on_triangle, ray_triangle_intersect};
use crate::Ray;

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestHit {
    /// Closest point on the mesh surface.
    pub point: Point3,
    /// Triangle containing the closest point; `None` for an empty mesh.
    pub triangle: Option<usize>,
    /// Unsigned distance to `point`; NaN for an empty mesh.
    pub distance: f64,
}

impl ClosestHit {
    fn miss() -> Self {
        Self {
            point: Point3::origin(),
            triangle: None,
            distance: f64::NAN,
        }
    }

    /// True if a triangle was found.
    pub fn is_hit(&self) -> bool {
        self.triangle.is_some()
    }
}

/// A KD-tree node.
#[derive(Debug, Clone)]
enum KdNode {
    Leaf {
        aabb: Aabb3,
        triangle: usize,
    },
    Internal {
        aabb: Aabb3,
        axis: usize,
        split: f64,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

impl KdNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            KdNode::Leaf { aabb, .. } | KdNode::Internal { aabb, .. } => aabb,
        }
    }
}

struct BuildItem {
    triangle: usize,
    aabb: Aabb3,
    centroid: Point3,
}

/// Spatial index over the triangles of a borrowed mesh.
#[derive(Debug, Clone)]
pub struct KdTree<'a> {
    mesh: &'a MeshData,
    root: Option<KdNode>,
    node_count: usize,
    depth: usize,
}

impl<'a> KdTree<'a> {
    /// Build a tree over every triangle of `mesh`.
    pub fn build(mesh: &'a MeshData) -> Self {
        let mut items: Vec<BuildItem> = (0..mesh.triangle_count())
            .map(|t| {
                let [a, b, c] = mesh.triangle(t);
                let aabb = Aabb3::from_points([&a, &b, &c]);
                let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
                BuildItem {
                    triangle: t,
                    aabb,
                    centroid,
                }
            })
            .collect();

        let mut node_count = 0;
        let mut depth = 0;
        let root = if items.is_empty() {
            None
        } else {
            Some(build_node(&mut items, 0, &mut node_count, &mut depth))
        };

        debug!(
            triangles = mesh.triangle_count(),
            nodes = node_count,
            depth,
            "built kd-tree"
        );

        Self {
            mesh,
            root,
            node_count,
            depth,
        }
    }

    /// The mesh this tree indexes.
    pub fn mesh(&self) -> &'a MeshData {
        self.mesh
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bounding box of all indexed triangles.
    pub fn bounds(&self) -> Aabb3 {
        self.root
            .as_ref()
            .map_or_else(Aabb3::empty, |root| *root.aabb())
    }

    /// Find the closest point on the mesh surface to `p`.
    pub fn find_closest_point(&self, p: &Point3) -> ClosestHit {
        let mut best = ClosestHit::miss();
        let mut best_d2 = f64::INFINITY;
        if let Some(root) = &self.root {
            self.closest_in_node(root, p, &mut best, &mut best_d2);
        }
        if best.is_hit() {
            best.distance = best_d2.sqrt();
        }
        best
    }

    fn closest_in_node(&self, node: &KdNode, p: &Point3, best: &mut ClosestHit, best_d2: &mut f64) {
        if node.aabb().distance_squared(p) > *best_d2 {
            return;
        }
        match node {
            KdNode::Leaf { triangle, .. } => {
                let [a, b, c] = self.mesh.triangle(*triangle);
                let q = closest_point_on_triangle(p, &a, &b, &c);
                let d2 = (q - p).norm_squared();
                if d2 < *best_d2 {
                    *best_d2 = d2;
                    best.point = q;
                    best.triangle = Some(*triangle);
                }
            }
            KdNode::Internal { left, right, .. } => {
                // Visit the child whose box center is nearer first
                let dl = (left.aabb().center() - p).norm_squared();
                let dr = (right.aabb().center() - p).norm_squared();
                let (first, second) = if dl <= dr {
                    (left, right)
                } else {
                    (right, left)
                };
                self.closest_in_node(first, p, best, best_d2);
                self.closest_in_node(second, p, best, best_d2);
            }
        }
    }

    /// Count triangles crossed by `ray` in front of its origin.
    pub fn count_ray_crossings(&self, ray: &Ray) -> usize {
        let mut count = 0;
        if let Some(root) = &self.root {
            self.crossings_in_node(root, ray, &mut count);
        }
        count
    }

    fn crossings_in_node(&self, node: &KdNode, ray: &Ray, count: &mut usize) {
        if ray.intersect_aabb(node.aabb()).is_none() {
            return;
        }
        match node {
            KdNode::Leaf { triangle, .. } => {
                let [a, b, c] = self.mesh.triangle(*triangle);
                if ray_triangle_intersect(ray, &a, &b, &c).is_some() {
                    *count += 1;
                }
            }
            KdNode::Internal { left, right, .. } => {
                self.crossings_in_node(left, ray, count);
                self.crossings_in_node(right, ray, count);
            }
        }
    }

    /// Split axis and position of the root node, if it is internal.
    pub fn root_split(&self) -> Option<(usize, f64)> {
        match &self.root {
            Some(KdNode::Internal { axis, split, .. }) => Some((*axis, *split)),
            _ => None,
        }
    }
}

fn build_node(
    items: &mut [BuildItem],
    depth: usize,
    node_count: &mut usize,
    max_depth: &mut usize,
) -> KdNode {
    *node_count += 1;
    *max_depth = (*max_depth).max(depth);

    if items.len() == 1 {
        return KdNode::Leaf {
            aabb: items[0].aabb,
            triangle: items[0].triangle,
        };
    }

    let mut aabb = Aabb3::empty();
    for item in items.iter() {
        aabb.include_aabb(&item.aabb);
    }

    let axis = depth % 3;
    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    let split = items[mid].centroid[axis];

    let (left_items, right_items) = items.split_at_mut(mid);
    let left = build_node(left_items, depth + 1, node_count, max_depth);
    let right = build_node(right_items, depth + 1, node_count, max_depth);

    KdNode::Internal {
        aabb,
        axis,
        split,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Reference nearest-point query that tests every triangle.
pub fn closest_point_brute_force(mesh: &MeshData, p: &Point3) -> ClosestHit {
    let mut best = ClosestHit::miss();
    let mut best_d2 = f64::INFINITY;
    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        let q = closest_point_on_triangle(p, &a, &b, &c);
        let d2 = (q - p).norm_squared();
        if d2 < best_d2 {
            best_d2 = d2;
            best.point = q;
            best.triangle = Some(t);
        }
    }
    if best.is_hit() {
        best.distance = best_d2.sqrt();
    }
    best
}

/// Reference ray crossing count that tests every triangle.
pub fn count_ray_crossings_brute_force(mesh: &MeshData, ray: &Ray) -> usize {
    (0..mesh.triangle_count())
        .filter(|&t| {
            let [a, b, c] = mesh.triangle(t);
            ray_triangle_intersect(ray, &a, &b, &c).is_some()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tessera_kernel_math::Vec3;
    use tessera_kernel_mesh::{unit_cube, uv_sphere};

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::new();
        let tree = KdTree::build(&mesh);
        assert!(tree.is_empty());
        let hit = tree.find_closest_point(&Point3::origin());
        assert!(hit.triangle.is_none());
        assert!(hit.distance.is_nan());
    }

    #[test]
    fn test_structure() {
        let cube = unit_cube();
        let tree = KdTree::build(&cube);
        // 12 leaves, 11 internal nodes
        assert_eq!(tree.node_count(), 23);
        assert!(tree.depth() >= 3 && tree.depth() <= 4);
        assert_eq!(tree.root_split().map(|(axis, _)| axis), Some(0));
        let b = tree.bounds();
        assert!((b.max.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_matches_brute_force() {
        let sphere = uv_sphere(1.0, 13, 24);
        let tree = KdTree::build(&sphere);
        let diag = sphere.diagonal();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = Point3::new(
                rng.random::<f64>() * 4.0 - 2.0,
                rng.random::<f64>() * 4.0 - 2.0,
                rng.random::<f64>() * 4.0 - 2.0,
            );
            let fast = tree.find_closest_point(&p);
            let slow = closest_point_brute_force(&sphere, &p);
            assert!((fast.distance - slow.distance).abs() < 1e-5 * diag);
            assert!(fast.triangle.is_some());
        }
    }

    #[test]
    fn test_point_on_surface_has_zero_distance() {
        let cube = unit_cube();
        let tree = KdTree::build(&cube);
        let hit = tree.find_closest_point(&Point3::new(0.5, 0.5, 1.0));
        assert!(hit.distance < 1e-9);
        let hit = tree.find_closest_point(&Point3::new(0.5, 0.5, 3.0));
        assert!((hit.distance - 2.0).abs() < 1e-9);
        // +Z face triangles
        assert!(matches!(hit.triangle, Some(2) | Some(3)));
    }

    #[test]
    fn test_ray_crossings() {
        let cube = unit_cube();
        let tree = KdTree::build(&cube);
        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(0.3, 0.7, 0.2));
        assert_eq!(tree.count_ray_crossings(&inside), 1);
        let outside = Ray::new(Point3::new(-1.0, 0.31, 0.47), Vec3::new(1.0, 0.01, 0.02));
        assert_eq!(tree.count_ray_crossings(&outside), 2);
        assert_eq!(
            tree.count_ray_crossings(&outside),
            count_ray_crossings_brute_force(&cube, &outside)
        );
    }
}

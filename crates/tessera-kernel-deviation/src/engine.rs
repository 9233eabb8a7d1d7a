//! Per-vertex distance from one mesh to the surface of another.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Point3, Progress, ProgressFn, Vec3};
use tessera_kernel_mesh::MeshData;
use tessera_kernel_spatial::{
    closest_point_brute_force, count_ray_crossings_brute_force, KdTree, Ray,
};
use tracing::{debug, info};

use crate::error::{DeviationError, Result};

/// Number of rays cast per vertex to classify inside/outside.
pub const NUM_SIGN_RAYS: usize = 5;

/// Seed for the sign-test ray directions.
pub const SIGN_RAY_SEED: u64 = 42;

/// Settings for [`compute_deviation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationConfig {
    /// Accelerate nearest-point queries with a KD-tree over the target.
    pub use_kd_tree: bool,
    /// Report negative distances for vertices inside the target.
    pub compute_signed: bool,
    /// Distance considered acceptable in statistics.
    pub tolerance: f64,
    /// Default histogram bin count.
    pub histogram_bins: usize,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            use_kd_tree: true,
            compute_signed: false,
            tolerance: 0.1,
            histogram_bins: 32,
        }
    }
}

impl DeviationConfig {
    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(DeviationError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.histogram_bins == 0 {
            return Err(DeviationError::InvalidConfig(
                "histogram_bins must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output of [`compute_deviation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviationResult {
    /// One distance per source vertex, in vertex order. Shorter than the
    /// source vertex count only when cancelled.
    pub distances: Vec<f32>,
    /// Distances carry an inside/outside sign.
    pub signed: bool,
    /// The progress callback requested cancellation.
    pub cancelled: bool,
}

impl DeviationResult {
    /// Largest absolute distance, or 0 when empty.
    pub fn max_abs(&self) -> f32 {
        self.distances.iter().fold(0.0f32, |m, d| m.max(d.abs()))
    }
}

/// Unit directions used by the inside/outside vote.
///
/// Drawn uniformly on the sphere from a fixed seed so results are
/// reproducible run to run.
pub fn sign_ray_directions() -> [Vec3; NUM_SIGN_RAYS] {
    let mut rng = StdRng::seed_from_u64(SIGN_RAY_SEED);
    std::array::from_fn(|_| {
        let z = 2.0 * rng.random::<f64>() - 1.0;
        let phi = std::f64::consts::TAU * rng.random::<f64>();
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    })
}

/// Nearest-point and crossing queries, with or without a tree.
enum Target<'a> {
    Tree(KdTree<'a>),
    Brute(&'a MeshData),
}

impl Target<'_> {
    fn distance(&self, p: &Point3) -> f64 {
        match self {
            Target::Tree(tree) => tree.find_closest_point(p).distance,
            Target::Brute(mesh) => closest_point_brute_force(mesh, p).distance,
        }
    }

    fn crossings(&self, ray: &Ray) -> usize {
        match self {
            Target::Tree(tree) => tree.count_ray_crossings(ray),
            Target::Brute(mesh) => count_ray_crossings_brute_force(mesh, ray),
        }
    }

    fn is_inside(&self, p: &Point3, directions: &[Vec3]) -> bool {
        let odd = directions
            .iter()
            .filter(|d| self.crossings(&Ray::new(*p, **d)) % 2 == 1)
            .count();
        odd * 2 > directions.len()
    }
}

/// Distance from every vertex of `source` to the surface of `target`.
///
/// Either mesh being empty yields an empty result. When signed, the sign
/// is only meaningful for a watertight `target`; the magnitude is always
/// the unsigned surface distance.
pub fn compute_deviation(
    source: &MeshData,
    target: &MeshData,
    config: &DeviationConfig,
    progress: Option<ProgressFn<'_>>,
) -> DeviationResult {
    let mut progress = Progress::new(progress);
    let mut result = DeviationResult {
        distances: Vec::new(),
        signed: config.compute_signed,
        cancelled: false,
    };
    if source.vertex_count() == 0 || target.is_empty() {
        progress.report(1.0);
        return result;
    }

    let query = if config.use_kd_tree {
        Target::Tree(KdTree::build(target))
    } else {
        Target::Brute(target)
    };
    let directions = sign_ray_directions();

    let n = source.vertex_count();
    let step = (n / 100).max(1);
    result.distances.reserve(n);

    for i in 0..n {
        let p = source.vertex(i);
        let mut d = query.distance(&p);
        if !d.is_finite() {
            d = 0.0;
        }
        if config.compute_signed && query.is_inside(&p, &directions) {
            d = -d;
        }
        result.distances.push(d as f32);

        if (i + 1) % step == 0 && !progress.report((i + 1) as f64 / n as f64) {
            debug!(processed = i + 1, total = n, "deviation cancelled");
            result.cancelled = true;
            return result;
        }
    }
    progress.report(1.0);

    info!(
        vertices = n,
        target_triangles = target.triangle_count(),
        signed = config.compute_signed,
        max = result.max_abs(),
        "deviation computed"
    );
    result
}

/// Largest vertex-to-surface distance from `source` to `target`.
fn one_sided_max(source: &MeshData, target: &MeshData) -> f64 {
    let tree = KdTree::build(target);
    (0..source.vertex_count())
        .map(|i| tree.find_closest_point(&source.vertex(i)).distance)
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max)
}

/// Symmetric Hausdorff distance measured from vertices to surfaces.
///
/// Returns 0 when either mesh is empty.
pub fn hausdorff_distance(a: &MeshData, b: &MeshData) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    one_sided_max(a, b).max(one_sided_max(b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_kernel_math::Transform;
    use tessera_kernel_mesh::{unit_cube, uv_sphere};

    #[test]
    fn test_sign_directions_are_unit_and_stable() {
        let a = sign_ray_directions();
        let b = sign_ray_directions();
        assert_eq!(a, b);
        for d in &a {
            assert!((d.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_identical_meshes_zero() {
        let cube = unit_cube();
        let result = compute_deviation(&cube, &cube, &DeviationConfig::default(), None);
        assert_eq!(result.distances.len(), 8);
        assert!(result.distances.iter().all(|d| d.abs() < 1e-6));
        assert!(!result.cancelled);
    }

    #[test]
    fn test_offset_cube_distance() {
        let cube = unit_cube();
        let moved = cube.transformed(&Transform::translation(Vec3::new(0.0, 0.0, 0.25)));
        let result = compute_deviation(&moved, &cube, &DeviationConfig::default(), None);
        // Bottom corners sit inside the reference, top corners 0.25 above it
        for (i, d) in result.distances.iter().enumerate() {
            let z = moved.vertex(i).z;
            if z > 1.0 {
                assert!((d - 0.25).abs() < 1e-5, "vertex {i}: {d}");
            }
        }
    }

    #[test]
    fn test_signed_inside_outside() {
        let sphere = uv_sphere(1.0, 15, 32);
        let inner = uv_sphere(0.5, 7, 12);
        let outer = uv_sphere(2.0, 7, 12);
        let config = DeviationConfig {
            compute_signed: true,
            ..DeviationConfig::default()
        };
        let inside = compute_deviation(&inner, &sphere, &config, None);
        assert!(inside.signed);
        assert!(inside.distances.iter().all(|&d| d < 0.0));
        let outside = compute_deviation(&outer, &sphere, &config, None);
        assert!(outside.distances.iter().all(|&d| d > 0.0));
    }

    #[test]
    fn test_brute_force_matches_tree() {
        let sphere = uv_sphere(1.0, 11, 20);
        let probe = uv_sphere(1.3, 5, 9);
        let tree = compute_deviation(&probe, &sphere, &DeviationConfig::default(), None);
        let brute = compute_deviation(
            &probe,
            &sphere,
            &DeviationConfig {
                use_kd_tree: false,
                ..DeviationConfig::default()
            },
            None,
        );
        for (a, b) in tree.distances.iter().zip(&brute.distances) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let cube = unit_cube();
        let empty = MeshData::new();
        let config = DeviationConfig::default();
        assert!(compute_deviation(&empty, &cube, &config, None).distances.is_empty());
        assert!(compute_deviation(&cube, &empty, &config, None).distances.is_empty());
        assert_eq!(hausdorff_distance(&cube, &empty), 0.0);
    }

    #[test]
    fn test_bounded_by_hausdorff() {
        let a = uv_sphere(1.0, 9, 16);
        let b = unit_cube().transformed(&Transform::translation(Vec3::new(-0.5, -0.5, -0.5)));
        let result = compute_deviation(&a, &b, &DeviationConfig::default(), None);
        let h = hausdorff_distance(&a, &b);
        assert!(result.max_abs() as f64 <= h + 1e-6);
    }

    #[test]
    fn test_cancellation_returns_partial() {
        let probe = uv_sphere(1.5, 21, 40);
        let target = uv_sphere(1.0, 9, 16);
        let mut cb = |f: f64| f < 0.5;
        let result = compute_deviation(&probe, &target, &DeviationConfig::default(), Some(&mut cb));
        assert!(result.cancelled);
        assert!(!result.distances.is_empty());
        assert!(result.distances.len() < probe.vertex_count());
    }

    #[test]
    fn test_config_validate() {
        assert!(DeviationConfig::default().validate().is_ok());
        let bad = DeviationConfig {
            tolerance: f64::NAN,
            ..DeviationConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}

//! Clamped uniform B-spline curves in the sketch plane.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb2, Point2, Vec2};

use crate::curve::{unit_or_x, Curve2d};
use crate::error::{Result, SketchError};

/// Simpson subintervals used by [`BSpline::length`].
const LENGTH_INTERVALS: usize = 64;

/// Samples used to seed the closest-point search.
const SEED_SAMPLES: usize = 11;

const NEWTON_MAX_ITERATIONS: usize = 32;
const NEWTON_MAX_STEP: f64 = 0.25;
const GOLDEN_ITERATIONS: usize = 60;

/// Consecutive revisiting steps that count as oscillation.
const OSCILLATION_REVISITS: usize = 3;

enum Newton {
    Converged(f64),
    /// Iterates keep cycling inside `[lo, hi]`.
    Oscillating { lo: f64, hi: f64 },
}

/// Watches Newton iterates for cycling.
///
/// A step revisits when it lands closer to one of the three iterates before
/// the current one than the length of the step itself. Monotone convergence
/// never does that; a 2- or 3-cycle does on every step.
#[derive(Debug, Default)]
struct OscillationGuard {
    recent: Vec<f64>,
    revisits: usize,
}

impl OscillationGuard {
    /// Record the step `t → next`; returns the bracket spanned by the recent
    /// iterates once enough consecutive steps have revisited.
    fn observe(&mut self, t: f64, next: f64) -> Option<(f64, f64)> {
        let step = (next - t).abs();
        if self.recent.iter().any(|r| (next - r).abs() < step) {
            self.revisits += 1;
        } else {
            self.revisits = 0;
        }
        if self.recent.len() == OSCILLATION_REVISITS {
            self.recent.remove(0);
        }
        self.recent.push(t);
        if self.revisits < OSCILLATION_REVISITS {
            return None;
        }
        let lo = self.recent.iter().fold(next, |m, &r| m.min(r));
        let hi = self.recent.iter().fold(next, |m, &r| m.max(r));
        Some((lo, hi))
    }
}

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to the valid
/// range `[degree, n]` where `n` is the last control point index.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// The `degree + 1` non-zero basis values `N[span-degree..=span]` at `t`,
/// from the triangular Cox–de Boor table.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                n[r] = saved;
                saved = 0.0;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Clamped uniform knots: `degree + 1` zeros, uniform interior, `degree + 1` ones.
fn clamped_uniform_knots(count: usize, degree: usize) -> Vec<f64> {
    let m = count + degree + 1;
    let mut knots = vec![0.0; m];
    let interior = m - 2 * (degree + 1);
    for i in 0..=degree {
        knots[m - 1 - i] = 1.0;
    }
    for i in 1..=interior {
        knots[degree + i] = i as f64 / (interior + 1) as f64;
    }
    knots
}

/// Evaluate a vector-valued B-spline with explicit knots.
fn eval_vectors(ctrl: &[Vec2], knots: &[f64], degree: usize, t: f64) -> Vec2 {
    if ctrl.is_empty() {
        return Vec2::zeros();
    }
    let n = ctrl.len() - 1;
    let t = t.clamp(knots[degree], knots[n + 1]);
    let span = find_span(knots, n, degree, t);
    let basis = basis_functions(knots, span, degree, t);
    basis
        .iter()
        .enumerate()
        .fold(Vec2::zeros(), |acc, (i, &b)| acc + ctrl[span - degree + i] * b)
}

/// Control points and knots of the derivative curve (one degree lower).
fn derivative_curve(ctrl: &[Vec2], knots: &[f64], degree: usize) -> (Vec<Vec2>, Vec<f64>) {
    if degree == 0 || ctrl.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    let p = degree as f64;
    let points = (0..ctrl.len() - 1)
        .map(|i| {
            let span = knots[i + degree + 1] - knots[i + 1];
            if span.abs() < 1e-30 {
                Vec2::zeros()
            } else {
                (ctrl[i + 1] - ctrl[i]) * (p / span)
            }
        })
        .collect();
    (points, knots[1..knots.len() - 1].to_vec())
}

/// Non-rational B-spline over `t ∈ [0, 1]` with clamped uniform knots.
///
/// The effective degree is the requested degree clamped to
/// `1 ≤ d ≤ n − 1`; knots are regenerated whenever the control polygon or
/// degree changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSpline {
    control_points: Vec<Point2>,
    requested_degree: usize,
    degree: usize,
    knots: Vec<f64>,
}

impl BSpline {
    /// Create a spline through at least two control points.
    pub fn new(control_points: Vec<Point2>, degree: usize) -> Result<Self> {
        if control_points.len() < 2 {
            return Err(SketchError::TooFewControlPoints(control_points.len()));
        }
        let mut spline = Self {
            control_points,
            requested_degree: degree,
            degree: 0,
            knots: Vec::new(),
        };
        spline.regenerate_knots();
        Ok(spline)
    }

    fn regenerate_knots(&mut self) {
        let n = self.control_points.len();
        self.degree = self.requested_degree.clamp(1, n - 1);
        self.knots = clamped_uniform_knots(n, self.degree);
    }

    /// Control polygon.
    pub fn control_points(&self) -> &[Point2] {
        &self.control_points
    }

    /// Effective polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Knot vector (`n + degree + 1` entries).
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// True if the first and last control points coincide within `1e-5`.
    pub fn is_closed(&self) -> bool {
        let n = self.control_points.len();
        n >= 3 && (self.control_points[0] - self.control_points[n - 1]).norm() <= 1e-5
    }

    /// Move control point `index`.
    pub fn set_control_point(&mut self, index: usize, p: Point2) -> Result<()> {
        let len = self.control_points.len();
        let slot = self
            .control_points
            .get_mut(index)
            .ok_or(SketchError::ControlPointOutOfRange { index, len })?;
        *slot = p;
        Ok(())
    }

    /// Insert a control point before `index` (`index == len` appends).
    pub fn insert_control_point(&mut self, index: usize, p: Point2) -> Result<()> {
        let len = self.control_points.len();
        if index > len {
            return Err(SketchError::ControlPointOutOfRange { index, len });
        }
        self.control_points.insert(index, p);
        self.regenerate_knots();
        Ok(())
    }

    /// Remove control point `index`; at least two must remain.
    pub fn remove_control_point(&mut self, index: usize) -> Result<Point2> {
        let len = self.control_points.len();
        if index >= len {
            return Err(SketchError::ControlPointOutOfRange { index, len });
        }
        if len <= 2 {
            return Err(SketchError::TooFewControlPoints(len - 1));
        }
        let removed = self.control_points.remove(index);
        self.regenerate_knots();
        Ok(removed)
    }

    /// Request a new degree; the effective degree is clamped to `[1, n − 1]`.
    pub fn set_degree(&mut self, degree: usize) {
        self.requested_degree = degree;
        self.regenerate_knots();
    }

    fn control_vectors(&self) -> Vec<Vec2> {
        self.control_points.iter().map(|p| p.coords).collect()
    }

    /// Values of all `n` basis functions at `t`.
    pub fn basis(&self, t: f64) -> Vec<f64> {
        let count = self.control_points.len();
        let n = count - 1;
        let t = t.clamp(0.0, 1.0);
        let span = find_span(&self.knots, n, self.degree, t);
        let local = basis_functions(&self.knots, span, self.degree, t);
        let mut all = vec![0.0; count];
        for (i, b) in local.into_iter().enumerate() {
            all[span - self.degree + i] = b;
        }
        all
    }

    /// First derivative `C′(t)`.
    pub fn derivative(&self, t: f64) -> Vec2 {
        let (d_ctrl, d_knots) = derivative_curve(&self.control_vectors(), &self.knots, self.degree);
        eval_vectors(&d_ctrl, &d_knots, self.degree - 1, t)
    }

    /// Second derivative `C″(t)`; zero for linear splines.
    pub fn second_derivative(&self, t: f64) -> Vec2 {
        if self.degree < 2 {
            return Vec2::zeros();
        }
        let (d1, k1) = derivative_curve(&self.control_vectors(), &self.knots, self.degree);
        let (d2, k2) = derivative_curve(&d1, &k1, self.degree - 1);
        eval_vectors(&d2, &k2, self.degree - 2, t)
    }

    fn squared_distance(&self, t: f64, q: &Point2) -> f64 {
        (self.evaluate(t) - q).norm_squared()
    }

    /// Damped Newton on `f(t) = (C(t) − q)·C′(t)`.
    ///
    /// Gives up with the cycling bracket when iterates keep revisiting the
    /// same neighborhood.
    fn newton(&self, q: &Point2, mut t: f64) -> Newton {
        let mut guard = OscillationGuard::default();
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let diff = self.evaluate(t) - q;
            let d1 = self.derivative(t);
            let d2 = self.second_derivative(t);
            let f = diff.dot(&d1);
            let df = d1.dot(&d1) + diff.dot(&d2);
            if df.abs() < 1e-14 {
                return Newton::Converged(t);
            }
            let step = (f / df).clamp(-NEWTON_MAX_STEP, NEWTON_MAX_STEP);
            let next = (t - step).clamp(0.0, 1.0);
            if (next - t).abs() < 1e-12 {
                return Newton::Converged(next);
            }
            if let Some((lo, hi)) = guard.observe(t, next) {
                return Newton::Oscillating { lo, hi };
            }
            t = next;
        }
        Newton::Converged(t)
    }

    /// Golden-section minimization of the distance to `q` over `[lo, hi]`.
    fn golden_section(&self, q: &Point2, mut lo: f64, mut hi: f64) -> f64 {
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let mut a = hi - ratio * (hi - lo);
        let mut b = lo + ratio * (hi - lo);
        let mut fa = self.squared_distance(a, q);
        let mut fb = self.squared_distance(b, q);
        for _ in 0..GOLDEN_ITERATIONS {
            if hi - lo < 1e-12 {
                break;
            }
            if fa < fb {
                hi = b;
                b = a;
                fb = fa;
                a = hi - ratio * (hi - lo);
                fa = self.squared_distance(a, q);
            } else {
                lo = a;
                a = b;
                fa = fb;
                b = lo + ratio * (hi - lo);
                fb = self.squared_distance(b, q);
            }
        }
        0.5 * (lo + hi)
    }
}

impl Curve2d for BSpline {
    fn evaluate(&self, t: f64) -> Point2 {
        // Clamped knots interpolate the end control points
        if t <= 0.0 {
            return self.control_points[0];
        }
        if t >= 1.0 {
            return self.control_points[self.control_points.len() - 1];
        }
        Point2::from(eval_vectors(
            &self.control_vectors(),
            &self.knots,
            self.degree,
            t,
        ))
    }

    fn tangent(&self, t: f64) -> Vec2 {
        unit_or_x(self.derivative(t))
    }

    /// Control polygon box; encloses the curve by the convex hull property.
    fn bounding_box(&self) -> Aabb2 {
        let mut bb = Aabb2::empty();
        for p in &self.control_points {
            bb.include_point(p);
        }
        bb
    }

    /// Composite Simpson integration of `|C′(t)|`.
    fn length(&self) -> f64 {
        let n = LENGTH_INTERVALS;
        let h = 1.0 / n as f64;
        let speed = |t: f64| self.derivative(t).norm();
        let mut sum = speed(0.0) + speed(1.0);
        for i in 1..n {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += w * speed(i as f64 * h);
        }
        sum * h / 3.0
    }

    fn closest_parameter(&self, p: &Point2) -> f64 {
        let step = 1.0 / (SEED_SAMPLES - 1) as f64;
        let (seed, _) = (0..SEED_SAMPLES)
            .map(|i| {
                let t = i as f64 * step;
                (t, self.squared_distance(t, p))
            })
            .fold((0.0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

        let refined = match self.newton(p, seed) {
            Newton::Converged(t) => t,
            Newton::Oscillating { lo, hi } => self.golden_section(p, lo, hi),
        };
        if self.squared_distance(refined, p) <= self.squared_distance(seed, p) {
            refined
        } else {
            seed
        }
    }
}

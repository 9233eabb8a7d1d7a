//! Damped Gauss-Newton solver over the packed sketch variables.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Progress, ProgressFn};
use tessera_kernel_sketch::{EntityId, Sketch};
use tracing::{debug, info, trace};

use crate::constraint::Constraint;
use crate::error::{ConstraintError, Result};
use crate::residual::System;

/// Smallest backtracking step, as a power of one half.
const MAX_HALVINGS: u32 = 9;

/// Pivots below this magnitude leave their variable untouched.
const PIVOT_EPSILON: f64 = 1e-12;

/// Relative residual decrease that counts as progress.
const STALL_IMPROVEMENT: f64 = 1e-6;

/// Settings for [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Converged once the residual norm drops below this.
    pub tolerance: f64,
    /// Newton iterations before giving up.
    pub max_iterations: usize,
    /// Forward-difference step for the Jacobian.
    pub fd_step: f64,
    /// Diagonal damping added to the normal equations.
    pub regularization: f64,
    /// Iterations without progress before the system is declared
    /// over-constrained.
    pub stall_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            fd_step: 1e-7,
            regularization: 1e-8,
            stall_iterations: 8,
        }
    }
}

impl SolverConfig {
    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConstraintError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {v}"
                )))
            }
        };
        positive("tolerance", self.tolerance)?;
        positive("fd_step", self.fd_step)?;
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(ConstraintError::InvalidConfig(format!(
                "regularization must be finite and non-negative, got {}",
                self.regularization
            )));
        }
        if self.max_iterations == 0 {
            return Err(ConstraintError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.stall_iterations == 0 {
            return Err(ConstraintError::InvalidConfig(
                "stall_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Every constraint is satisfied and no freedom remains.
    Success,
    /// Every constraint is satisfied but the sketch can still move.
    UnderConstrained,
    /// Residuals stalled above tolerance; constraints contradict each other.
    OverConstrained,
    /// Ran out of iterations while still improving.
    NotConverged,
    /// The progress callback requested cancellation.
    Cancelled,
}

impl SolveStatus {
    /// True when the constraints ended up satisfied.
    pub fn is_converged(self) -> bool {
        matches!(self, SolveStatus::Success | SolveStatus::UnderConstrained)
    }
}

/// Output of [`solve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// How the solve ended.
    pub status: SolveStatus,
    /// Solver passes, counting the one that found the residuals satisfied.
    pub iterations: usize,
    /// Residual norm of the variables written back to the sketch.
    pub final_error: f64,
    /// Variables minus residual rows, floored at zero.
    pub dof: usize,
    /// Constraints whose rows stayed above tolerance, for
    /// [`SolveStatus::OverConstrained`].
    pub conflicting: Vec<EntityId>,
}

/// Move the sketch geometry until `constraints` hold.
///
/// Every constraint is validated against the sketch first; a bad reference
/// is an error and leaves the sketch untouched. Otherwise the best variable
/// vector seen is always written back, whatever the status. Progress is
/// reported once per iteration as a fraction of `max_iterations`.
pub fn solve(
    sketch: &mut Sketch,
    constraints: &[Constraint],
    config: &SolverConfig,
    progress: Option<ProgressFn<'_>>,
) -> Result<SolveResult> {
    config.validate()?;
    for c in constraints {
        c.validate(sketch)?;
    }

    let mut progress = Progress::new(progress);
    let mut system = System::new(sketch, constraints);
    let rows = system.rows();
    let mut x = sketch.variables();
    let n = x.len();
    let dof = n.saturating_sub(rows);

    let mut r = Vec::with_capacity(rows);
    system.evaluate(&x, &mut r);
    let mut error = norm(&r);
    let mut best_x = x.clone();
    let mut best_error = error;

    let mut jacobian = vec![0.0; rows * n];
    let mut probe = Vec::with_capacity(rows);
    let mut trial = vec![0.0; n];
    let mut iterations = 0;
    let mut stalled = 0;
    let mut status = SolveStatus::NotConverged;
    let converged = if dof == 0 {
        SolveStatus::Success
    } else {
        SolveStatus::UnderConstrained
    };

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        if error < config.tolerance {
            status = converged;
            break;
        }
        if stalled >= config.stall_iterations {
            status = SolveStatus::OverConstrained;
            break;
        }
        if !progress.report((iteration - 1) as f64 / config.max_iterations as f64) {
            status = SolveStatus::Cancelled;
            break;
        }

        // Forward differences, one column per variable
        for j in 0..n {
            let saved = x[j];
            x[j] = saved + config.fd_step;
            system.evaluate(&x, &mut probe);
            x[j] = saved;
            for i in 0..rows {
                jacobian[i * n + j] = (probe[i] - r[i]) / config.fd_step;
            }
        }
        let dx = normal_step(&jacobian, &r, rows, n, config.regularization);

        let mut alpha = 2.0;
        let mut accepted = false;
        for _ in 0..=MAX_HALVINGS {
            alpha *= 0.5;
            for k in 0..n {
                trial[k] = x[k] - alpha * dx[k];
            }
            system.evaluate(&trial, &mut probe);
            if norm(&probe) < error {
                accepted = true;
                break;
            }
        }
        // No decrease: keep the smallest step evaluated last
        x.copy_from_slice(&trial);
        std::mem::swap(&mut r, &mut probe);
        let previous = error;
        error = norm(&r);

        if error < best_error {
            best_error = error;
            best_x.copy_from_slice(&x);
        }
        if previous - error > STALL_IMPROVEMENT * previous {
            stalled = 0;
        } else {
            stalled += 1;
        }
        trace!(iteration, error, alpha, accepted, "solver step");
    }
    if status == SolveStatus::NotConverged && best_error < config.tolerance {
        status = converged;
    }

    let mut conflicting = Vec::new();
    if status == SolveStatus::OverConstrained {
        system.evaluate(&best_x, &mut r);
        for (i, value) in r.iter().enumerate() {
            if value.abs() > config.tolerance {
                if let Some(c) = system.constraint_for_row(i) {
                    if !conflicting.contains(&c.id) {
                        conflicting.push(c.id);
                    }
                }
            }
        }
    }

    sketch.set_variables(&best_x)?;
    progress.report(1.0);

    debug!(
        variables = n,
        rows,
        dof,
        conflicting = conflicting.len(),
        "solver finished"
    );
    info!(?status, iterations, error = best_error, "sketch solve");

    Ok(SolveResult {
        status,
        iterations,
        final_error: best_error,
        dof,
        conflicting,
    })
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Solve `(JᵀJ + λI) dx = Jᵀr` for the Gauss-Newton step.
///
/// `jacobian` is row-major `rows × n`.
fn normal_step(jacobian: &[f64], r: &[f64], rows: usize, n: usize, lambda: f64) -> Vec<f64> {
    let mut a = vec![0.0; n * n];
    let mut b = vec![0.0; n];
    for i in 0..rows {
        let row = &jacobian[i * n..(i + 1) * n];
        for p in 0..n {
            if row[p] == 0.0 {
                continue;
            }
            b[p] += row[p] * r[i];
            for q in 0..n {
                a[p * n + q] += row[p] * row[q];
            }
        }
    }
    for p in 0..n {
        a[p * n + p] += lambda;
    }
    gaussian_elimination(&mut a, &mut b, n)
}

/// Solve the dense `n × n` system `a x = b` in place with partial pivoting.
///
/// Columns whose best pivot is below [`PIVOT_EPSILON`] get a zero
/// component instead of failing.
fn gaussian_elimination(a: &mut [f64], b: &mut [f64], n: usize) -> Vec<f64> {
    let mut singular = vec![false; n];
    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row * n + col].abs() > a[pivot * n + col].abs() {
                pivot = row;
            }
        }
        if a[pivot * n + col].abs() < PIVOT_EPSILON {
            singular[col] = true;
            continue;
        }
        if pivot != col {
            for k in 0..n {
                a.swap(col * n + k, pivot * n + k);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[row * n + col] / a[col * n + col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        if singular[col] {
            continue;
        }
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[col * n + k] * x[k];
        }
        x[col] = sum / a[col * n + col];
    }
    x
}

//! Residual evaluation over a working copy of the sketch geometry.

use std::collections::HashMap;

use tessera_kernel_math::{cross2, wrap_angle, Point2, Vec2};
use tessera_kernel_sketch::{Curve2d, EntityGeometry, EntityId, Line, Sketch};

use crate::constraint::{Constraint, ConstraintKind, ConstraintRef};

/// Entity geometry detached from the sketch, reloaded from a variable vector
/// before every evaluation.
pub(crate) struct System<'a> {
    constraints: &'a [Constraint],
    work: Vec<EntityGeometry>,
    index: HashMap<EntityId, usize>,
    rows: usize,
}

impl<'a> System<'a> {
    pub(crate) fn new(sketch: &Sketch, constraints: &'a [Constraint]) -> Self {
        let work: Vec<EntityGeometry> = sketch
            .entities()
            .iter()
            .map(|e| e.geometry.clone())
            .collect();
        let index = sketch
            .entities()
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        let rows = constraints.iter().map(Constraint::row_count).sum();
        Self {
            constraints,
            work,
            index,
            rows,
        }
    }

    /// Total residual rows.
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// Load `x` and write every residual row into `out`.
    pub(crate) fn evaluate(&mut self, x: &[f64], out: &mut Vec<f64>) {
        let mut offset = 0;
        for g in &mut self.work {
            offset += g.read_parameters(&x[offset..]);
        }
        out.clear();
        for c in self.constraints {
            let before = out.len();
            self.push_rows(c, out);
            // Keep the row layout stable even if a reference cannot be read
            out.resize(before + c.row_count(), 0.0);
        }
    }

    /// Index of the constraint owning residual row `row`.
    pub(crate) fn constraint_for_row(&self, row: usize) -> Option<&Constraint> {
        let mut start = 0;
        for c in self.constraints {
            let end = start + c.row_count();
            if row < end {
                return Some(c);
            }
            start = end;
        }
        None
    }

    fn geometry(&self, id: EntityId) -> Option<&EntityGeometry> {
        self.index.get(&id).map(|&i| &self.work[i])
    }

    fn point(&self, r: &ConstraintRef) -> Option<Point2> {
        self.geometry(r.entity)?.point(r.point)
    }

    fn line(&self, r: &ConstraintRef) -> Option<Line> {
        match self.geometry(r.entity)? {
            EntityGeometry::Line(l) => Some(*l),
            _ => None,
        }
    }

    /// Center and radius of a circle or arc.
    fn round(&self, r: &ConstraintRef) -> Option<(Point2, f64)> {
        match self.geometry(r.entity)? {
            EntityGeometry::Circle(c) => Some((c.center, c.radius)),
            EntityGeometry::Arc(a) => Some((a.center, a.radius)),
            _ => None,
        }
    }

    fn is_whole_line(&self, r: &ConstraintRef) -> bool {
        r.is_whole() && self.line(r).is_some()
    }

    fn push_rows(&self, c: &Constraint, out: &mut Vec<f64>) {
        let refs = &c.refs;
        let value = c.value.unwrap_or(0.0);
        match c.kind {
            ConstraintKind::Coincident => {
                if let (Some(a), Some(b)) = (self.point(&refs[0]), self.point(&refs[1])) {
                    out.extend_from_slice(&[a.x - b.x, a.y - b.y]);
                }
            }
            ConstraintKind::Horizontal => {
                if let Some(l) = self.line(&refs[0]) {
                    out.push(l.end.y - l.start.y);
                }
            }
            ConstraintKind::Vertical => {
                if let Some(l) = self.line(&refs[0]) {
                    out.push(l.end.x - l.start.x);
                }
            }
            ConstraintKind::Parallel => {
                if let (Some(a), Some(b)) = (self.line(&refs[0]), self.line(&refs[1])) {
                    out.push(cross2(&unit(a.direction()), &unit(b.direction())));
                }
            }
            ConstraintKind::Perpendicular => {
                if let (Some(a), Some(b)) = (self.line(&refs[0]), self.line(&refs[1])) {
                    out.push(unit(a.direction()).dot(&unit(b.direction())));
                }
            }
            ConstraintKind::Tangent => {
                if let Some(r) = self.tangent_residual(&refs[0], &refs[1]) {
                    out.push(r);
                }
            }
            ConstraintKind::Distance => {
                if let Some(d) = self.distance(&refs[0], &refs[1]) {
                    out.push(d - value);
                }
            }
            ConstraintKind::Angle => {
                if let (Some(a), Some(b)) = (self.line(&refs[0]), self.line(&refs[1])) {
                    out.push(wrap_angle(direction_angle(&b) - direction_angle(&a)) - value);
                }
            }
            ConstraintKind::FixedAngle => {
                if let Some(l) = self.line(&refs[0]) {
                    out.push(wrap_angle(direction_angle(&l) - value));
                }
            }
            ConstraintKind::Radius => {
                if let Some((_, r)) = self.round(&refs[0]) {
                    out.push(r - value);
                }
            }
            ConstraintKind::Equal => {
                if let (Some(a), Some(b)) = (self.line(&refs[0]), self.line(&refs[1])) {
                    out.push(a.length() - b.length());
                } else if let (Some((_, ra)), Some((_, rb))) =
                    (self.round(&refs[0]), self.round(&refs[1]))
                {
                    out.push(ra - rb);
                }
            }
            ConstraintKind::Concentric => {
                if let (Some((a, _)), Some((b, _))) = (self.round(&refs[0]), self.round(&refs[1])) {
                    out.extend_from_slice(&[a.x - b.x, a.y - b.y]);
                }
            }
            ConstraintKind::Midpoint => {
                if let (Some(p), Some(l)) = (self.point(&refs[0]), self.line(&refs[1])) {
                    let m = l.mid_point();
                    out.extend_from_slice(&[p.x - m.x, p.y - m.y]);
                }
            }
            ConstraintKind::Symmetric => {
                if let (Some(a), Some(b), Some(axis)) = (
                    self.point(&refs[0]),
                    self.point(&refs[1]),
                    self.line(&refs[2]),
                ) {
                    let dir = unit(axis.direction());
                    let mid = Point2::from((a.coords + b.coords) * 0.5);
                    // Midpoint on the axis, and the chord across it
                    out.push(cross2(&dir, &(mid - axis.start)));
                    out.push((b - a).dot(&dir));
                }
            }
            ConstraintKind::FixedPoint => {
                if let (Some(p), Some(t)) = (self.point(&refs[0]), c.target) {
                    out.extend_from_slice(&[p.x - t.x, p.y - t.y]);
                }
            }
            ConstraintKind::PointOnCurve => {
                if let (Some(p), Some(g)) = (self.point(&refs[0]), self.geometry(refs[1].entity)) {
                    out.push(point_on_curve_residual(&p, g));
                }
            }
        }
    }

    /// Point–point distance, or perpendicular point–line distance.
    fn distance(&self, a: &ConstraintRef, b: &ConstraintRef) -> Option<f64> {
        if self.is_whole_line(b) {
            return Some(line_distance(&self.point(a)?, &self.line(b)?));
        }
        if self.is_whole_line(a) {
            return Some(line_distance(&self.point(b)?, &self.line(a)?));
        }
        Some((self.point(b)? - self.point(a)?).norm())
    }

    fn tangent_residual(&self, a: &ConstraintRef, b: &ConstraintRef) -> Option<f64> {
        if let (Some(l), Some((c, r))) = (self.line(a), self.round(b)) {
            return Some(line_distance(&c, &l) - r);
        }
        if let (Some((c, r)), Some(l)) = (self.round(a), self.line(b)) {
            return Some(line_distance(&c, &l) - r);
        }
        let (c1, r1) = self.round(a)?;
        let (c2, r2) = self.round(b)?;
        let d = (c2 - c1).norm();
        // Whichever of external or internal contact is nearer
        let external = d - (r1 + r2);
        let internal = d - (r1 - r2).abs();
        Some(if external.abs() <= internal.abs() {
            external
        } else {
            internal
        })
    }
}

fn unit(v: Vec2) -> Vec2 {
    let len = v.norm();
    if len < 1e-15 {
        v
    } else {
        v / len
    }
}

fn direction_angle(l: &Line) -> f64 {
    let d = l.direction();
    d.y.atan2(d.x)
}

/// Distance from `p` to the infinite line through `l`.
fn line_distance(p: &Point2, l: &Line) -> f64 {
    let d = l.direction();
    let len = d.norm();
    if len < 1e-15 {
        return (p - l.start).norm();
    }
    cross2(&d, &(p - l.start)).abs() / len
}

fn point_on_curve_residual(p: &Point2, curve: &EntityGeometry) -> f64 {
    match curve {
        EntityGeometry::Line(l) => {
            let d = l.direction();
            let len = d.norm();
            if len < 1e-15 {
                (p - l.start).norm()
            } else {
                cross2(&d, &(p - l.start)) / len
            }
        }
        EntityGeometry::Circle(c) => (p - c.center).norm() - c.radius,
        EntityGeometry::Arc(a) => (p - a.center).norm() - a.radius,
        other => other.distance_to(p),
    }
}

//! Geometric and dimensional constraints between sketch entities.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::Point2;
use tessera_kernel_sketch::{
    EntityGeometry, EntityId, EntityKind, Sketch, POINT_CENTER, POINT_END, POINT_START,
    WHOLE_ENTITY,
};

use crate::error::{ConstraintError, Result};

/// What a constraint enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Two points coincide.
    Coincident,
    /// A line is parallel to X.
    Horizontal,
    /// A line is parallel to Y.
    Vertical,
    /// Two lines are parallel.
    Parallel,
    /// Two lines are perpendicular.
    Perpendicular,
    /// A line touches a circle/arc, or two circles/arcs touch.
    Tangent,
    /// Point–point or point–line distance.
    Distance,
    /// Signed angle from the first line to the second.
    Angle,
    /// Radius of a circle or arc.
    Radius,
    /// Equal line lengths or equal radii.
    Equal,
    /// Two circles/arcs share a center.
    Concentric,
    /// A point sits at the middle of a line.
    Midpoint,
    /// Two points mirror each other across a line.
    Symmetric,
    /// A point is pinned to a target position.
    FixedPoint,
    /// A line keeps a fixed absolute direction.
    FixedAngle,
    /// A point lies on a curve.
    PointOnCurve,
}

impl ConstraintKind {
    /// Residual rows this kind contributes to the system.
    pub fn row_count(self) -> usize {
        match self {
            ConstraintKind::Coincident
            | ConstraintKind::FixedPoint
            | ConstraintKind::Concentric
            | ConstraintKind::Midpoint
            | ConstraintKind::Symmetric => 2,
            _ => 1,
        }
    }
}

/// One end of a constraint: an entity, or one of its characteristic points.
///
/// `point` uses the sketch selectors: `0` start, `1` end, `2` center, and a
/// negative value for the whole entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintRef {
    /// Referenced entity.
    pub entity: EntityId,
    /// Point selector.
    pub point: i32,
}

impl ConstraintRef {
    /// The whole entity.
    pub fn whole(entity: EntityId) -> Self {
        Self {
            entity,
            point: WHOLE_ENTITY,
        }
    }

    /// The start point (`t = 0`).
    pub fn start(entity: EntityId) -> Self {
        Self {
            entity,
            point: POINT_START,
        }
    }

    /// The end point (`t = 1`).
    pub fn end(entity: EntityId) -> Self {
        Self {
            entity,
            point: POINT_END,
        }
    }

    /// The center of an arc or circle.
    pub fn center(entity: EntityId) -> Self {
        Self {
            entity,
            point: POINT_CENTER,
        }
    }

    /// True if this refers to the whole entity.
    pub fn is_whole(&self) -> bool {
        self.point < 0
    }
}

/// A constraint instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Unique id, drawn from the entity id counter.
    pub id: EntityId,
    /// What is enforced.
    pub kind: ConstraintKind,
    /// Referenced entities and points, in kind-specific order.
    pub refs: Vec<ConstraintRef>,
    /// Dimension for distance, angle, radius and fixed-angle constraints.
    pub value: Option<f64>,
    /// Target position for fixed-point constraints.
    pub target: Option<Point2>,
}

impl Constraint {
    fn build(kind: ConstraintKind, refs: Vec<ConstraintRef>) -> Self {
        Self {
            id: EntityId::next(),
            kind,
            refs,
            value: None,
            target: None,
        }
    }

    fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Two points coincide.
    pub fn coincident(a: ConstraintRef, b: ConstraintRef) -> Self {
        Self::build(ConstraintKind::Coincident, vec![a, b])
    }

    /// A line is horizontal.
    pub fn horizontal(line: EntityId) -> Self {
        Self::build(ConstraintKind::Horizontal, vec![ConstraintRef::whole(line)])
    }

    /// A line is vertical.
    pub fn vertical(line: EntityId) -> Self {
        Self::build(ConstraintKind::Vertical, vec![ConstraintRef::whole(line)])
    }

    /// Two lines are parallel.
    pub fn parallel(a: EntityId, b: EntityId) -> Self {
        Self::build(
            ConstraintKind::Parallel,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
    }

    /// Two lines are perpendicular.
    pub fn perpendicular(a: EntityId, b: EntityId) -> Self {
        Self::build(
            ConstraintKind::Perpendicular,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
    }

    /// Two curves are tangent.
    pub fn tangent(a: EntityId, b: EntityId) -> Self {
        Self::build(
            ConstraintKind::Tangent,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
    }

    /// Distance between two points, or between a point and a line.
    pub fn distance(a: ConstraintRef, b: ConstraintRef, distance: f64) -> Self {
        Self::build(ConstraintKind::Distance, vec![a, b]).with_value(distance)
    }

    /// Signed angle (radians) from line `a` to line `b`.
    pub fn angle(a: EntityId, b: EntityId, radians: f64) -> Self {
        Self::build(
            ConstraintKind::Angle,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
        .with_value(radians)
    }

    /// Radius of a circle or arc.
    pub fn radius(entity: EntityId, radius: f64) -> Self {
        Self::build(ConstraintKind::Radius, vec![ConstraintRef::whole(entity)]).with_value(radius)
    }

    /// Equal lengths (lines) or equal radii (circles/arcs).
    pub fn equal(a: EntityId, b: EntityId) -> Self {
        Self::build(
            ConstraintKind::Equal,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
    }

    /// Two circles/arcs share a center.
    pub fn concentric(a: EntityId, b: EntityId) -> Self {
        Self::build(
            ConstraintKind::Concentric,
            vec![ConstraintRef::whole(a), ConstraintRef::whole(b)],
        )
    }

    /// `point` sits at the middle of `line`.
    pub fn midpoint(point: ConstraintRef, line: EntityId) -> Self {
        Self::build(
            ConstraintKind::Midpoint,
            vec![point, ConstraintRef::whole(line)],
        )
    }

    /// `a` and `b` mirror each other across `axis`.
    pub fn symmetric(a: ConstraintRef, b: ConstraintRef, axis: EntityId) -> Self {
        Self::build(
            ConstraintKind::Symmetric,
            vec![a, b, ConstraintRef::whole(axis)],
        )
    }

    /// Pin a point to `target`.
    pub fn fixed_point(point: ConstraintRef, target: Point2) -> Self {
        let mut c = Self::build(ConstraintKind::FixedPoint, vec![point]);
        c.target = Some(target);
        c
    }

    /// Keep a line at absolute direction `radians` from +X.
    pub fn fixed_angle(line: EntityId, radians: f64) -> Self {
        Self::build(ConstraintKind::FixedAngle, vec![ConstraintRef::whole(line)])
            .with_value(radians)
    }

    /// `point` lies on `curve`.
    pub fn point_on_curve(point: ConstraintRef, curve: EntityId) -> Self {
        Self::build(
            ConstraintKind::PointOnCurve,
            vec![point, ConstraintRef::whole(curve)],
        )
    }

    /// Residual rows contributed to the system.
    pub fn row_count(&self) -> usize {
        self.kind.row_count()
    }

    /// Check the references against `sketch`.
    pub fn validate(&self, sketch: &Sketch) -> Result<()> {
        let expected = match self.kind {
            ConstraintKind::Horizontal
            | ConstraintKind::Vertical
            | ConstraintKind::Radius
            | ConstraintKind::FixedPoint
            | ConstraintKind::FixedAngle => 1,
            ConstraintKind::Symmetric => 3,
            _ => 2,
        };
        if self.refs.len() != expected {
            return Err(self.invalid(format!(
                "expected {expected} references, got {}",
                self.refs.len()
            )));
        }

        let mut geometries = Vec::with_capacity(self.refs.len());
        for r in &self.refs {
            let entity = sketch
                .get(r.entity)
                .ok_or(ConstraintError::UnknownEntity {
                    constraint: self.id,
                    entity: r.entity,
                })?;
            geometries.push(&entity.geometry);
        }

        let is_point = |i: usize| geometries[i].point(self.refs[i].point).is_some();
        let kind_of = |i: usize| geometries[i].kind();
        let is_line = |i: usize| kind_of(i) == EntityKind::Line;
        let is_round = |i: usize| matches!(kind_of(i), EntityKind::Circle | EntityKind::Arc);

        let ok = match self.kind {
            ConstraintKind::Coincident => is_point(0) && is_point(1),
            ConstraintKind::Horizontal | ConstraintKind::Vertical | ConstraintKind::FixedAngle => {
                is_line(0)
            }
            ConstraintKind::Parallel | ConstraintKind::Perpendicular | ConstraintKind::Angle => {
                is_line(0) && is_line(1)
            }
            ConstraintKind::Tangent => {
                (is_line(0) && is_round(1)) || (is_round(0) && (is_line(1) || is_round(1)))
            }
            ConstraintKind::Distance => {
                let whole_line = |i: usize| is_line(i) && self.refs[i].is_whole();
                (is_point(0) && is_point(1))
                    || (is_point(0) && whole_line(1))
                    || (whole_line(0) && is_point(1))
            }
            ConstraintKind::Radius => is_round(0),
            ConstraintKind::Equal => (is_line(0) && is_line(1)) || (is_round(0) && is_round(1)),
            ConstraintKind::Concentric => is_round(0) && is_round(1),
            ConstraintKind::Midpoint => is_point(0) && is_line(1),
            ConstraintKind::Symmetric => is_point(0) && is_point(1) && is_line(2),
            ConstraintKind::FixedPoint => is_point(0),
            ConstraintKind::PointOnCurve => {
                is_point(0) && !matches!(geometries[1], EntityGeometry::Point(_))
            }
        };
        if !ok {
            return Err(self.invalid("references do not fit this constraint kind".into()));
        }

        match self.kind {
            ConstraintKind::Distance
            | ConstraintKind::Angle
            | ConstraintKind::Radius
            | ConstraintKind::FixedAngle => {
                let value = match self.value {
                    Some(v) if v.is_finite() => v,
                    _ => return Err(self.missing("finite value")),
                };
                let in_range = match self.kind {
                    ConstraintKind::Radius => value > 0.0,
                    ConstraintKind::Distance => value >= 0.0,
                    _ => true,
                };
                if !in_range {
                    return Err(ConstraintError::ValueOutOfRange {
                        constraint: self.id,
                        kind: self.kind,
                        value,
                    });
                }
            }
            ConstraintKind::FixedPoint => {
                if self.target.is_none() {
                    return Err(self.missing("target point"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> ConstraintError {
        ConstraintError::InvalidReference {
            constraint: self.id,
            kind: self.kind,
            reason,
        }
    }

    fn missing(&self, what: &'static str) -> ConstraintError {
        ConstraintError::MissingValue {
            constraint: self.id,
            kind: self.kind,
            what,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_kernel_sketch::{Circle, Line, SketchPlane};

    fn sample() -> (Sketch, EntityId, EntityId, EntityId) {
        let mut sketch = Sketch::new("c", SketchPlane::xy());
        let line = sketch.add(Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)));
        let circle = sketch.add(Circle::new(Point2::new(3.0, 0.0), 1.0).unwrap());
        let point = sketch.add(Point2::new(5.0, 5.0));
        (sketch, line, circle, point)
    }

    #[test]
    fn test_row_counts() {
        assert_eq!(ConstraintKind::Coincident.row_count(), 2);
        assert_eq!(ConstraintKind::FixedPoint.row_count(), 2);
        assert_eq!(ConstraintKind::Symmetric.row_count(), 2);
        assert_eq!(ConstraintKind::Distance.row_count(), 1);
        assert_eq!(ConstraintKind::Tangent.row_count(), 1);
    }

    #[test]
    fn test_valid_constraints() {
        let (sketch, line, circle, point) = sample();
        let all = [
            Constraint::horizontal(line),
            Constraint::tangent(line, circle),
            Constraint::tangent(circle, line),
            Constraint::distance(ConstraintRef::center(circle), ConstraintRef::whole(line), 2.0),
            Constraint::distance(ConstraintRef::whole(point), ConstraintRef::start(line), 1.0),
            Constraint::radius(circle, 2.0),
            Constraint::midpoint(ConstraintRef::whole(point), line),
            Constraint::fixed_point(ConstraintRef::end(line), Point2::origin()),
            Constraint::point_on_curve(ConstraintRef::whole(point), circle),
        ];
        for c in &all {
            assert!(c.validate(&sketch).is_ok(), "{c:?}");
        }
    }

    #[test]
    fn test_invalid_constraints() {
        let (sketch, line, circle, point) = sample();
        assert!(matches!(
            Constraint::horizontal(circle).validate(&sketch),
            Err(ConstraintError::InvalidReference { .. })
        ));
        assert!(matches!(
            Constraint::coincident(ConstraintRef::whole(line), ConstraintRef::whole(point))
                .validate(&sketch),
            Err(ConstraintError::InvalidReference { .. })
        ));
        assert!(matches!(
            Constraint::tangent(line, line).validate(&sketch),
            Err(ConstraintError::InvalidReference { .. })
        ));
        let missing = EntityId(u64::MAX);
        let c = Constraint::vertical(missing);
        assert_eq!(
            c.validate(&sketch),
            Err(ConstraintError::UnknownEntity {
                constraint: c.id,
                entity: missing,
            })
        );

        let mut no_value = Constraint::radius(circle, 1.0);
        no_value.value = None;
        assert!(matches!(
            no_value.validate(&sketch),
            Err(ConstraintError::MissingValue { .. })
        ));
        let mut no_target = Constraint::fixed_point(ConstraintRef::whole(point), Point2::origin());
        no_target.target = None;
        assert!(no_target.validate(&sketch).is_err());
    }

    #[test]
    fn test_dimension_ranges() {
        let (sketch, line, circle, _) = sample();
        for radius in [-2.0, 0.0] {
            let c = Constraint::radius(circle, radius);
            assert_eq!(
                c.validate(&sketch),
                Err(ConstraintError::ValueOutOfRange {
                    constraint: c.id,
                    kind: ConstraintKind::Radius,
                    value: radius,
                })
            );
        }
        let span = |d: f64| {
            Constraint::distance(ConstraintRef::start(line), ConstraintRef::end(line), d)
        };
        assert!(matches!(
            span(-1.0).validate(&sketch),
            Err(ConstraintError::ValueOutOfRange { .. })
        ));
        assert!(span(0.0).validate(&sketch).is_ok());
        assert!(Constraint::angle(line, line, -1.0).validate(&sketch).is_ok());
    }
}

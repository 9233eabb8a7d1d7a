//! Sketch entities: a closed sum over the curve primitives plus flags.

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb2, Point2, Vec2};

use crate::arc::Arc;
use crate::bspline::BSpline;
use crate::curve::{Circle, Curve2d, Line};
use crate::id::EntityId;

/// Point selector for an entity's start point.
pub const POINT_START: i32 = 0;
/// Point selector for an entity's end point.
pub const POINT_END: i32 = 1;
/// Point selector for an arc or circle center.
pub const POINT_CENTER: i32 = 2;
/// Selector meaning the whole entity rather than one of its points.
pub const WHOLE_ENTITY: i32 = -1;

/// Discriminant of [`EntityGeometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A free point.
    Point,
    /// A line segment.
    Line,
    /// A circular arc.
    Arc,
    /// A full circle.
    Circle,
    /// A B-spline curve.
    Spline,
}

/// Geometry of a sketch entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityGeometry {
    /// A free point.
    Point(Point2),
    /// A line segment.
    Line(Line),
    /// A circular arc.
    Arc(Arc),
    /// A full circle.
    Circle(Circle),
    /// A B-spline curve.
    Spline(BSpline),
}

impl EntityGeometry {
    /// The variant tag.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityGeometry::Point(_) => EntityKind::Point,
            EntityGeometry::Line(_) => EntityKind::Line,
            EntityGeometry::Arc(_) => EntityKind::Arc,
            EntityGeometry::Circle(_) => EntityKind::Circle,
            EntityGeometry::Spline(_) => EntityKind::Spline,
        }
    }

    /// A characteristic point: start/end at `t = 0`/`t = 1`, or the center.
    ///
    /// Free points answer every selector with their position. Splines have
    /// no center.
    pub fn point(&self, selector: i32) -> Option<Point2> {
        match (self, selector) {
            (EntityGeometry::Point(p), _) => Some(*p),
            (EntityGeometry::Arc(a), POINT_CENTER) => Some(a.center),
            (EntityGeometry::Circle(c), POINT_CENTER) => Some(c.center),
            (EntityGeometry::Spline(_), POINT_CENTER) => None,
            (EntityGeometry::Line(l), POINT_CENTER) => Some(l.mid_point()),
            (g, POINT_START) => Some(g.evaluate(0.0)),
            (g, POINT_END) => Some(g.evaluate(1.0)),
            _ => None,
        }
    }

    /// Radius of an arc or circle.
    pub fn radius(&self) -> Option<f64> {
        match self {
            EntityGeometry::Arc(a) => Some(a.radius),
            EntityGeometry::Circle(c) => Some(c.radius),
            _ => None,
        }
    }

    /// True for curves whose end returns to their start.
    pub fn is_closed(&self) -> bool {
        match self {
            EntityGeometry::Circle(_) => true,
            EntityGeometry::Spline(s) => s.is_closed(),
            EntityGeometry::Arc(a) => a.sweep_angle().abs() >= std::f64::consts::TAU - 1e-12,
            _ => false,
        }
    }

    /// Number of solver variables this geometry contributes.
    pub fn parameter_count(&self) -> usize {
        match self {
            EntityGeometry::Point(_) => 2,
            EntityGeometry::Line(_) => 4,
            EntityGeometry::Circle(_) => 3,
            EntityGeometry::Arc(_) => 5,
            EntityGeometry::Spline(s) => 2 * s.control_points().len(),
        }
    }

    /// Append this geometry's solver variables to `out`.
    ///
    /// Layouts: point `x y`; line `x0 y0 x1 y1`; circle `cx cy r`;
    /// arc `cx cy r start end`; spline `x0 y0 x1 y1 …`.
    pub fn write_parameters(&self, out: &mut Vec<f64>) {
        match self {
            EntityGeometry::Point(p) => out.extend_from_slice(&[p.x, p.y]),
            EntityGeometry::Line(l) => {
                out.extend_from_slice(&[l.start.x, l.start.y, l.end.x, l.end.y])
            }
            EntityGeometry::Circle(c) => out.extend_from_slice(&[c.center.x, c.center.y, c.radius]),
            EntityGeometry::Arc(a) => out.extend_from_slice(&[
                a.center.x,
                a.center.y,
                a.radius,
                a.start_angle,
                a.end_angle,
            ]),
            EntityGeometry::Spline(s) => {
                for p in s.control_points() {
                    out.extend_from_slice(&[p.x, p.y]);
                }
            }
        }
    }

    /// Overwrite this geometry from the front of `values`.
    ///
    /// `values` must hold at least [`parameter_count`](Self::parameter_count)
    /// entries. Returns the number consumed.
    pub fn read_parameters(&mut self, values: &[f64]) -> usize {
        let count = self.parameter_count();
        let v = &values[..count];
        match self {
            EntityGeometry::Point(p) => *p = Point2::new(v[0], v[1]),
            EntityGeometry::Line(l) => {
                l.start = Point2::new(v[0], v[1]);
                l.end = Point2::new(v[2], v[3]);
            }
            EntityGeometry::Circle(c) => {
                c.center = Point2::new(v[0], v[1]);
                c.radius = v[2];
            }
            EntityGeometry::Arc(a) => {
                a.center = Point2::new(v[0], v[1]);
                a.radius = v[2];
                a.start_angle = v[3];
                a.end_angle = v[4];
            }
            EntityGeometry::Spline(s) => {
                for (i, xy) in v.chunks_exact(2).enumerate() {
                    // Same control point count, so the index is always valid
                    let _ = s.set_control_point(i, Point2::new(xy[0], xy[1]));
                }
            }
        }
        count
    }
}

impl Curve2d for EntityGeometry {
    fn evaluate(&self, t: f64) -> Point2 {
        match self {
            EntityGeometry::Point(p) => *p,
            EntityGeometry::Line(l) => l.evaluate(t),
            EntityGeometry::Arc(a) => a.evaluate(t),
            EntityGeometry::Circle(c) => c.evaluate(t),
            EntityGeometry::Spline(s) => s.evaluate(t),
        }
    }

    fn tangent(&self, t: f64) -> Vec2 {
        match self {
            EntityGeometry::Point(_) => Vec2::zeros(),
            EntityGeometry::Line(l) => l.tangent(t),
            EntityGeometry::Arc(a) => a.tangent(t),
            EntityGeometry::Circle(c) => c.tangent(t),
            EntityGeometry::Spline(s) => s.tangent(t),
        }
    }

    fn bounding_box(&self) -> Aabb2 {
        match self {
            EntityGeometry::Point(p) => Aabb2::point(*p),
            EntityGeometry::Line(l) => l.bounding_box(),
            EntityGeometry::Arc(a) => a.bounding_box(),
            EntityGeometry::Circle(c) => c.bounding_box(),
            EntityGeometry::Spline(s) => s.bounding_box(),
        }
    }

    fn length(&self) -> f64 {
        match self {
            EntityGeometry::Point(_) => 0.0,
            EntityGeometry::Line(l) => l.length(),
            EntityGeometry::Arc(a) => a.length(),
            EntityGeometry::Circle(c) => c.length(),
            EntityGeometry::Spline(s) => s.length(),
        }
    }

    fn closest_parameter(&self, p: &Point2) -> f64 {
        match self {
            EntityGeometry::Point(_) => 0.0,
            EntityGeometry::Line(l) => l.closest_parameter(p),
            EntityGeometry::Arc(a) => a.closest_parameter(p),
            EntityGeometry::Circle(c) => c.closest_parameter(p),
            EntityGeometry::Spline(s) => s.closest_parameter(p),
        }
    }

    fn tessellate(&self, segments: usize) -> Vec<Point2> {
        match self {
            EntityGeometry::Point(p) => vec![*p],
            EntityGeometry::Line(l) => l.tessellate(segments),
            EntityGeometry::Arc(a) => a.tessellate(segments),
            EntityGeometry::Circle(c) => c.tessellate(segments),
            EntityGeometry::Spline(s) => s.tessellate(segments),
        }
    }
}

impl From<Line> for EntityGeometry {
    fn from(l: Line) -> Self {
        EntityGeometry::Line(l)
    }
}

impl From<Arc> for EntityGeometry {
    fn from(a: Arc) -> Self {
        EntityGeometry::Arc(a)
    }
}

impl From<Circle> for EntityGeometry {
    fn from(c: Circle) -> Self {
        EntityGeometry::Circle(c)
    }
}

impl From<BSpline> for EntityGeometry {
    fn from(s: BSpline) -> Self {
        EntityGeometry::Spline(s)
    }
}

impl From<Point2> for EntityGeometry {
    fn from(p: Point2) -> Self {
        EntityGeometry::Point(p)
    }
}

/// A geometry with identity and editing flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchEntity {
    /// Unique id.
    pub id: EntityId,
    /// Reference geometry excluded from profiles and loops.
    pub construction: bool,
    /// Current selection state.
    pub selected: bool,
    /// The curve itself.
    pub geometry: EntityGeometry,
}

impl SketchEntity {
    /// Wrap `geometry` with a freshly allocated id.
    pub fn new(geometry: impl Into<EntityGeometry>) -> Self {
        Self {
            id: EntityId::next(),
            construction: false,
            selected: false,
            geometry: geometry.into(),
        }
    }

    /// Same as [`new`](Self::new) but flagged as construction geometry.
    pub fn construction(geometry: impl Into<EntityGeometry>) -> Self {
        Self {
            construction: true,
            ..Self::new(geometry)
        }
    }

    /// The geometry's variant tag.
    pub fn kind(&self) -> EntityKind {
        self.geometry.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_selectors() {
        let line = EntityGeometry::from(Line::new(Point2::new(0.0, 0.0), Point2::new(2.0, 4.0)));
        assert_eq!(line.point(POINT_START), Some(Point2::new(0.0, 0.0)));
        assert_eq!(line.point(POINT_END), Some(Point2::new(2.0, 4.0)));
        assert_eq!(line.point(POINT_CENTER), Some(Point2::new(1.0, 2.0)));
        assert_eq!(line.point(WHOLE_ENTITY), None);

        let circle = EntityGeometry::from(Circle::new(Point2::new(1.0, 1.0), 2.0).unwrap());
        assert_eq!(circle.point(POINT_CENTER), Some(Point2::new(1.0, 1.0)));
        assert_eq!(circle.radius(), Some(2.0));
        assert!(circle.is_closed());

        let p = EntityGeometry::from(Point2::new(3.0, 4.0));
        assert_eq!(p.point(POINT_END), Some(Point2::new(3.0, 4.0)));
        assert_eq!(p.tessellate(8).len(), 1);
        assert_eq!(p.tangent(0.5), Vec2::zeros());
        assert_eq!(p.length(), 0.0);
    }

    #[test]
    fn test_parameter_roundtrip() {
        let arc = Arc::new(Point2::new(1.0, 2.0), 3.0, 0.5, 2.0, false).unwrap();
        let mut g = EntityGeometry::from(arc);
        let mut params = Vec::new();
        g.write_parameters(&mut params);
        assert_eq!(params, vec![1.0, 2.0, 3.0, 0.5, 2.0]);
        assert_eq!(params.len(), g.parameter_count());

        params[2] = 4.0;
        assert_eq!(g.read_parameters(&params), 5);
        assert_eq!(g.radius(), Some(4.0));
        match &g {
            EntityGeometry::Arc(a) => assert!(!a.ccw),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_spline_parameters() {
        let spline = BSpline::new(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 0.0)],
            2,
        )
        .unwrap();
        let mut g = EntityGeometry::from(spline);
        assert_eq!(g.parameter_count(), 6);
        g.read_parameters(&[0.0, 0.0, 1.0, 3.0, 2.0, 0.0]);
        let mid = g.evaluate(0.5);
        assert_relative_eq!(mid.y, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_entity_flags() {
        let e = SketchEntity::construction(Line::new(Point2::origin(), Point2::new(1.0, 0.0)));
        assert!(e.construction);
        assert!(!e.selected);
        assert_eq!(e.kind(), EntityKind::Line);
        assert_ne!(e.id, EntityId::NONE);
    }
}

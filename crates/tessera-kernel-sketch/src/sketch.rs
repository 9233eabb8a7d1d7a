//! The sketch container: ordered entities on a plane.

use std::collections::HashMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tessera_kernel_math::{Aabb2, Point2, Point3, Vec2};
use tracing::debug;

use crate::curve::{Circle, Curve2d, Line};
use crate::entity::{EntityGeometry, EntityKind, SketchEntity};
use crate::error::{Result, SketchError};
use crate::id::{next_id, EntityId};
use crate::plane::SketchPlane;

/// Entities on a [`SketchPlane`], kept in insertion order.
///
/// An id → position index mirrors the entity list after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SketchRepr")]
pub struct Sketch {
    /// Process-unique sketch id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// The plane the 2D coordinates live in.
    pub plane: SketchPlane,
    entities: Vec<SketchEntity>,
    #[serde(skip)]
    index: HashMap<EntityId, usize>,
}

#[derive(Deserialize)]
struct SketchRepr {
    id: u64,
    name: String,
    plane: SketchPlane,
    entities: Vec<SketchEntity>,
}

impl From<SketchRepr> for Sketch {
    fn from(raw: SketchRepr) -> Self {
        let mut sketch = Sketch {
            id: raw.id,
            name: raw.name,
            plane: raw.plane,
            entities: raw.entities,
            index: HashMap::new(),
        };
        sketch.reindex();
        sketch
    }
}

impl Sketch {
    /// Create an empty sketch.
    pub fn new(name: impl Into<String>, plane: SketchPlane) -> Self {
        Self {
            id: next_id(),
            name: name.into(),
            plane,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the sketch has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> &[SketchEntity] {
        &self.entities
    }

    /// Add geometry as a new entity and return its id.
    pub fn add(&mut self, geometry: impl Into<EntityGeometry>) -> EntityId {
        let entity = SketchEntity::new(geometry);
        let id = entity.id;
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        id
    }

    /// Add construction geometry and return its id.
    pub fn add_construction(&mut self, geometry: impl Into<EntityGeometry>) -> EntityId {
        let id = self.add(geometry);
        if let Some(e) = self.get_mut(id) {
            e.construction = true;
        }
        id
    }

    /// Insert a prebuilt entity, keeping its id.
    pub fn insert(&mut self, entity: SketchEntity) -> Result<EntityId> {
        if self.index.contains_key(&entity.id) {
            return Err(SketchError::DuplicateEntity(entity.id));
        }
        let id = entity.id;
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        Ok(id)
    }

    /// Remove an entity, returning it if it existed.
    pub fn remove(&mut self, id: EntityId) -> Option<SketchEntity> {
        let pos = self.index.get(&id).copied()?;
        let entity = self.entities.remove(pos);
        self.reindex();
        Some(entity)
    }

    /// Look up an entity.
    pub fn get(&self, id: EntityId) -> Option<&SketchEntity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    /// Look up an entity for editing.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SketchEntity> {
        let i = *self.index.get(&id)?;
        self.entities.get_mut(i)
    }

    /// Position of an entity in insertion order.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Entities of one kind, in insertion order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &SketchEntity> + '_ {
        self.entities.iter().filter(move |e| e.kind() == kind)
    }

    /// Add four lines around the box spanned by two opposite corners.
    ///
    /// Lines run counter-clockwise from the minimum corner.
    pub fn add_rectangle(&mut self, a: Point2, b: Point2) -> [EntityId; 4] {
        let bb = Aabb2::from_corners(a, b);
        let corners = [
            bb.min,
            Point2::new(bb.max.x, bb.min.y),
            bb.max,
            Point2::new(bb.min.x, bb.max.y),
        ];
        std::array::from_fn(|i| self.add(Line::new(corners[i], corners[(i + 1) % 4])))
    }

    /// Add a closed regular polygon with its first vertex at angle 0.
    pub fn add_regular_polygon(
        &mut self,
        center: Point2,
        radius: f64,
        sides: usize,
    ) -> Result<Vec<EntityId>> {
        if sides < 3 {
            return Err(SketchError::TooFewSides(sides));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SketchError::NonPositiveRadius(radius));
        }
        let vertices: Vec<Point2> = (0..sides)
            .map(|i| {
                let a = TAU * i as f64 / sides as f64;
                center + Vec2::new(a.cos(), a.sin()) * radius
            })
            .collect();
        Ok((0..sides)
            .map(|i| self.add(Line::new(vertices[i], vertices[(i + 1) % sides])))
            .collect())
    }

    /// Add a circle.
    pub fn add_circle(&mut self, center: Point2, radius: f64) -> Result<EntityId> {
        Ok(self.add(Circle::new(center, radius)?))
    }

    /// Mark an entity selected. Returns false if it does not exist.
    pub fn select(&mut self, id: EntityId) -> bool {
        self.set_selected(id, |_| true)
    }

    /// Clear an entity's selection. Returns false if it does not exist.
    pub fn deselect(&mut self, id: EntityId) -> bool {
        self.set_selected(id, |_| false)
    }

    /// Flip an entity's selection. Returns false if it does not exist.
    pub fn toggle_selection(&mut self, id: EntityId) -> bool {
        self.set_selected(id, |s| !s)
    }

    fn set_selected(&mut self, id: EntityId, f: impl FnOnce(bool) -> bool) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.selected = f(e.selected);
                true
            }
            None => false,
        }
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        for e in &mut self.entities {
            e.selected = false;
        }
    }

    /// Ids of the selected entities, in insertion order.
    pub fn selected(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.id)
            .collect()
    }

    /// Entity nearest to `p` within `max_distance`, with its distance.
    ///
    /// Ties go to the earlier entity.
    pub fn nearest_entity(&self, p: &Point2, max_distance: f64) -> Option<(EntityId, f64)> {
        self.entities
            .iter()
            .map(|e| (e.id, e.geometry.distance_to(p)))
            .filter(|&(_, d)| d <= max_distance)
            .fold(None, |best: Option<(EntityId, f64)>, cur| match best {
                Some(b) if b.1 <= cur.1 => Some(b),
                _ => Some(cur),
            })
    }

    /// Select every entity whose bounding box lies inside `region`.
    ///
    /// Returns the ids that were selected; other selections are kept.
    pub fn select_in_box(&mut self, region: &Aabb2) -> Vec<EntityId> {
        let mut hits = Vec::new();
        for e in &mut self.entities {
            if region.contains_aabb(&e.geometry.bounding_box()) {
                e.selected = true;
                hits.push(e.id);
            }
        }
        debug!(count = hits.len(), "box selection");
        hits
    }

    /// Map a sketch point into world space.
    pub fn to_world(&self, p: &Point2) -> Point3 {
        self.plane.to_world(p)
    }

    /// Project a world point into sketch coordinates.
    pub fn to_local(&self, p: &Point3) -> Point2 {
        self.plane.to_local(p)
    }

    /// Box around every entity (empty for an empty sketch).
    pub fn bounding_box(&self) -> Aabb2 {
        let mut bb = Aabb2::empty();
        for e in &self.entities {
            bb.include_aabb(&e.geometry.bounding_box());
        }
        bb
    }

    /// Total number of solver variables.
    pub fn variable_count(&self) -> usize {
        self.entities
            .iter()
            .map(|e| e.geometry.parameter_count())
            .sum()
    }

    /// Offset of an entity's first variable in [`variables`](Self::variables).
    pub fn variable_offset(&self, id: EntityId) -> Option<usize> {
        let pos = self.position(id)?;
        Some(
            self.entities[..pos]
                .iter()
                .map(|e| e.geometry.parameter_count())
                .sum(),
        )
    }

    /// All entity parameters concatenated in insertion order.
    pub fn variables(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.variable_count());
        for e in &self.entities {
            e.geometry.write_parameters(&mut out);
        }
        out
    }

    /// Overwrite all entity parameters from a vector laid out like
    /// [`variables`](Self::variables).
    ///
    /// Nothing is written when any circle or arc would get a radius that is
    /// not finite and positive.
    pub fn set_variables(&mut self, values: &[f64]) -> Result<()> {
        let expected = self.variable_count();
        if values.len() != expected {
            return Err(SketchError::VariableCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        let mut offset = 0;
        for e in &self.entities {
            // Radius is the third slot of both circle and arc layouts
            if e.geometry.radius().is_some() {
                let solved = values[offset + 2];
                if !solved.is_finite() || solved <= 0.0 {
                    return Err(SketchError::NonPositiveRadius(solved));
                }
            }
            offset += e.geometry.parameter_count();
        }
        let mut offset = 0;
        for e in &mut self.entities {
            offset += e.geometry.read_parameters(&values[offset..]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::Arc;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_get_remove() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let a = sketch.add(Point2::new(1.0, 1.0));
        let b = sketch.add(Line::new(Point2::origin(), Point2::new(1.0, 0.0)));
        let c = sketch.add_circle(Point2::origin(), 1.0).unwrap();
        assert_eq!(sketch.len(), 3);
        assert_eq!(sketch.get(b).map(|e| e.kind()), Some(EntityKind::Line));

        let removed = sketch.remove(a).unwrap();
        assert_eq!(removed.id, a);
        assert!(sketch.get(a).is_none());
        assert_eq!(sketch.position(b), Some(0));
        assert_eq!(sketch.position(c), Some(1));
        assert!(sketch.remove(a).is_none());
        assert!(sketch.add_circle(Point2::origin(), -1.0).is_err());
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let e = SketchEntity::new(Point2::origin());
        sketch.insert(e.clone()).unwrap();
        assert_eq!(sketch.insert(e.clone()), Err(SketchError::DuplicateEntity(e.id)));
    }

    #[test]
    fn test_entities_of_kind() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        sketch.add_rectangle(Point2::origin(), Point2::new(2.0, 1.0));
        sketch.add_circle(Point2::new(5.0, 5.0), 1.0).unwrap();
        assert_eq!(sketch.entities_of_kind(EntityKind::Line).count(), 4);
        assert_eq!(sketch.entities_of_kind(EntityKind::Circle).count(), 1);
        assert_eq!(sketch.entities_of_kind(EntityKind::Arc).count(), 0);
    }

    #[test]
    fn test_rectangle_corners() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let ids = sketch.add_rectangle(Point2::new(10.0, 5.0), Point2::origin());
        let first = sketch.get(ids[0]).unwrap();
        assert_eq!(first.geometry.point(crate::POINT_START), Some(Point2::origin()));
        let last = sketch.get(ids[3]).unwrap();
        assert_eq!(last.geometry.point(crate::POINT_END), Some(Point2::origin()));
        let bb = sketch.bounding_box();
        assert_eq!(bb.max, Point2::new(10.0, 5.0));
    }

    #[test]
    fn test_regular_polygon() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let ids = sketch.add_regular_polygon(Point2::origin(), 2.0, 6).unwrap();
        assert_eq!(ids.len(), 6);
        let perimeter: f64 = ids
            .iter()
            .map(|&id| sketch.get(id).unwrap().geometry.length())
            .sum();
        assert_relative_eq!(perimeter, 12.0, epsilon = 1e-12);
        assert_eq!(
            sketch.add_regular_polygon(Point2::origin(), 1.0, 2),
            Err(SketchError::TooFewSides(2))
        );
    }

    #[test]
    fn test_selection() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let a = sketch.add(Point2::new(0.0, 0.0));
        let b = sketch.add(Point2::new(5.0, 0.0));
        assert!(sketch.select(a));
        assert!(sketch.toggle_selection(b));
        assert_eq!(sketch.selected(), vec![a, b]);
        assert!(sketch.toggle_selection(b));
        assert!(sketch.deselect(a));
        assert!(sketch.selected().is_empty());
        assert!(!sketch.select(EntityId::NONE));

        sketch.select(a);
        sketch.clear_selection();
        assert!(sketch.selected().is_empty());
    }

    #[test]
    fn test_nearest_entity() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let line = sketch.add(Line::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)));
        let circle = sketch.add_circle(Point2::new(5.0, 5.0), 1.0).unwrap();
        let (id, d) = sketch.nearest_entity(&Point2::new(3.0, 0.5), 2.0).unwrap();
        assert_eq!(id, line);
        assert_relative_eq!(d, 0.5, epsilon = 1e-12);
        let (id, d) = sketch.nearest_entity(&Point2::new(5.0, 7.0), 2.0).unwrap();
        assert_eq!(id, circle);
        assert_relative_eq!(d, 1.0, epsilon = 1e-12);
        assert!(sketch.nearest_entity(&Point2::new(50.0, 50.0), 2.0).is_none());
    }

    #[test]
    fn test_select_in_box() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let inside = sketch.add(Line::new(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)));
        let straddling = sketch.add(Line::new(Point2::new(1.0, 1.0), Point2::new(20.0, 2.0)));
        let arc = sketch.add(Arc::new(Point2::new(5.0, 5.0), 1.0, 0.0, 3.0, true).unwrap());
        let region = Aabb2::from_corners(Point2::origin(), Point2::new(6.5, 6.5));
        let hits = sketch.select_in_box(&region);
        assert_eq!(hits, vec![inside, arc]);
        assert!(!sketch.get(straddling).unwrap().selected);
    }

    #[test]
    fn test_variables_roundtrip() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        sketch.add(Point2::new(1.0, 2.0));
        let line = sketch.add(Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)));
        sketch.add_circle(Point2::new(7.0, 7.0), 2.0).unwrap();
        sketch.add(Arc::new(Point2::origin(), 1.0, 0.0, 1.0, true).unwrap());

        assert_eq!(sketch.variable_count(), 2 + 4 + 3 + 5);
        assert_eq!(sketch.variable_offset(line), Some(2));
        let mut vars = sketch.variables();
        assert_eq!(vars.len(), 14);
        assert_eq!(&vars[2..6], &[0.0, 0.0, 3.0, 4.0]);

        vars[8] = 5.0;
        sketch.set_variables(&vars).unwrap();
        assert_eq!(sketch.variables(), vars);
        assert!(matches!(
            sketch.set_variables(&vars[1..]),
            Err(SketchError::VariableCountMismatch { expected: 14, actual: 13 })
        ));
    }

    #[test]
    fn test_set_variables_rejects_bad_radius() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        sketch.add(Line::new(Point2::origin(), Point2::new(1.0, 0.0)));
        sketch.add_circle(Point2::new(2.0, 0.0), 1.0).unwrap();
        let before = sketch.variables();

        let mut vars = before.clone();
        vars[0] = 9.0;
        vars[6] = -2.0;
        assert_eq!(
            sketch.set_variables(&vars),
            Err(SketchError::NonPositiveRadius(-2.0))
        );
        vars[6] = 0.0;
        assert!(sketch.set_variables(&vars).is_err());
        assert_eq!(sketch.variables(), before);
    }

    #[test]
    fn test_serde_round_trip_keeps_index() {
        let mut sketch = Sketch::new("s", SketchPlane::xy());
        let a = sketch.add(Point2::new(1.0, 2.0));
        let line = sketch.add(Line::new(Point2::origin(), Point2::new(3.0, 4.0)));

        let text = toml::to_string(&sketch).unwrap();
        let mut back: Sketch = toml::from_str(&text).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.position(line), Some(1));
        assert_eq!(back.get(line).map(|e| e.kind()), Some(EntityKind::Line));
        assert_eq!(back.variable_offset(line), Some(2));

        assert!(back.remove(a).is_some());
        assert_eq!(back.position(line), Some(0));
    }

    #[test]
    fn test_world_local() {
        let plane = SketchPlane::xz();
        let sketch = Sketch::new("s", plane);
        let w = sketch.to_world(&Point2::new(2.0, 3.0));
        assert_relative_eq!(w.x, 2.0);
        assert_relative_eq!(w.z, 3.0);
        let back = sketch.to_local(&w);
        assert_relative_eq!(back.y, 3.0);
    }
}

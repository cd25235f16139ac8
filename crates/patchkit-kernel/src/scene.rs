//! Scenes: placed entities, control-point editing and picking.

use std::collections::HashSet;

use log::{debug, trace, warn};
use patchkit_math::{Point3, Transform, Vec3};
use patchkit_pick::{frustum_pick_points, intersect_frustum, intersect_ray, Frustum};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::config::KernelConfig;
use crate::entity::Entity;
use crate::error::{KernelError, Result};
use crate::geometry::Geometry;

new_key_type! {
    /// Handle to an entity in a [`Scene`].
    pub struct EntityId;
}

/// A control point addressed through its owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CvRef {
    /// Owning entity.
    pub entity: EntityId,
    /// Index into the entity's control points.
    pub index: usize,
}

impl CvRef {
    /// Reference control point `index` of `entity`.
    pub fn new(entity: EntityId, index: usize) -> Self {
        Self { entity, index }
    }
}

/// How a pick result combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Clear everything, then select the picked items.
    Replace,
    /// Select the picked items.
    Add,
    /// Deselect the picked items.
    Remove,
    /// Flip the picked items.
    Toggle,
}

impl SelectMode {
    fn apply(self, current: bool) -> bool {
        match self {
            SelectMode::Replace | SelectMode::Add => true,
            SelectMode::Remove => false,
            SelectMode::Toggle => !current,
        }
    }
}

/// An entity placed in the scene.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    world: Transform,
    visible: bool,
    selected: bool,
    entity: Entity,
}

impl Node {
    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local-to-world matrix.
    pub fn world(&self) -> &Transform {
        &self.world
    }

    /// Whether picks consider this node.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the node itself is selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The entity.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }
}

/// All entities being edited, keyed by [`EntityId`].
#[derive(Debug, Clone)]
pub struct Scene {
    config: KernelConfig,
    nodes: SlotMap<EntityId, Node>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            config: KernelConfig::default(),
            nodes: SlotMap::with_key(),
        }
    }
}

impl Scene {
    /// Empty scene with validated settings.
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: SlotMap::with_key(),
        })
    }

    /// Settings.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the scene holds no entities.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Live entity handles.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.keys()
    }

    /// Add geometry at the origin.
    pub fn insert(&mut self, name: impl Into<String>, geometry: impl Into<Geometry>) -> EntityId {
        self.insert_with_transform(name, geometry, Transform::identity())
    }

    /// Add geometry placed by `world`.
    pub fn insert_with_transform(
        &mut self,
        name: impl Into<String>,
        geometry: impl Into<Geometry>,
        world: Transform,
    ) -> EntityId {
        let node = Node {
            name: name.into(),
            world,
            visible: true,
            selected: false,
            entity: Entity::new(geometry),
        };
        let id = self.nodes.insert(node);
        debug!("inserted {id:?} ({})", self.nodes[id].entity.geometry().kind());
        id
    }

    /// Remove an entity, returning it.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity> {
        self.nodes
            .remove(id)
            .map(|node| node.entity)
            .ok_or(KernelError::StaleEntity(id))
    }

    /// Node for a handle.
    pub fn node(&self, id: EntityId) -> Result<&Node> {
        self.nodes.get(id).ok_or(KernelError::StaleEntity(id))
    }

    fn node_mut(&mut self, id: EntityId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(KernelError::StaleEntity(id))
    }

    /// Entity for a handle.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.node(id).map(Node::entity)
    }

    /// Entity for a handle, for edits that manage their own dirty flags.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.node_mut(id).map(|node| &mut node.entity)
    }

    /// Move an entity. Buffers are in local space and stay valid.
    pub fn set_world(&mut self, id: EntityId, world: Transform) -> Result<()> {
        self.node_mut(id)?.world = world;
        Ok(())
    }

    /// Show or hide an entity for picking.
    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    // =========================================================================
    // Control point editing
    // =========================================================================

    /// Select or deselect one control point.
    pub fn set_cv_selected(&mut self, cv: CvRef, selected: bool) -> Result<()> {
        self.entity_mut(cv.entity)?.set_cv_selected(cv.index, selected)?;
        Ok(())
    }

    /// Move one control point to a local-space position.
    pub fn set_cv_position(&mut self, cv: CvRef, position: Point3) -> Result<()> {
        self.entity_mut(cv.entity)?.set_cv_position(cv.index, position)
    }

    /// Apply a world-space transform to control points.
    ///
    /// Each point is moved by `inverse(G) * delta * G` where `G` is its
    /// entity's world matrix, so the edit looks the same from every entity.
    /// Every reference is checked before anything moves.
    pub fn move_control_points(&mut self, cvs: &[CvRef], world_delta: &Transform) -> Result<()> {
        let mut local: SecondaryMap<EntityId, (Transform, Vec<usize>)> = SecondaryMap::new();
        for cv in cvs {
            let node = self.node(cv.entity)?;
            let count = node.entity.control_points().len();
            if cv.index >= count {
                return Err(KernelError::CvIndexOutOfRange {
                    index: cv.index,
                    count,
                });
            }
            if !local.contains_key(cv.entity) {
                let delta = node
                    .world
                    .conjugate(world_delta)
                    .ok_or(KernelError::SingularTransform(cv.entity))?;
                local.insert(cv.entity, (delta, Vec::new()));
            }
            if let Some((_, indices)) = local.get_mut(cv.entity) {
                indices.push(cv.index);
            }
        }
        for (id, (delta, indices)) in &local {
            self.nodes[id].entity.transform_cvs(indices, delta)?;
        }
        Ok(())
    }

    /// Deselect every control point in the scene.
    pub fn clear_selection(&mut self) {
        for node in self.nodes.values_mut() {
            node.entity.clear_selection();
        }
    }

    /// Every selected control point.
    pub fn selected_cvs(&self) -> Vec<CvRef> {
        self.nodes
            .iter()
            .flat_map(|(id, node)| {
                node.entity
                    .control_points()
                    .iter()
                    .enumerate()
                    .filter(|(_, cv)| cv.selected)
                    .map(move |(index, _)| CvRef::new(id, index))
            })
            .collect()
    }

    /// Combine picked control points with the selection. Repeated
    /// references count once.
    pub fn select_cvs(&mut self, cvs: &[CvRef], mode: SelectMode) -> Result<()> {
        for cv in cvs {
            let count = self.node(cv.entity)?.entity.control_points().len();
            if cv.index >= count {
                return Err(KernelError::CvIndexOutOfRange {
                    index: cv.index,
                    count,
                });
            }
        }
        if mode == SelectMode::Replace {
            self.clear_selection();
        }
        let mut seen = HashSet::with_capacity(cvs.len());
        for cv in cvs.iter().filter(|&&cv| seen.insert(cv)) {
            let entity = &mut self.nodes[cv.entity].entity;
            let current = entity.control_points()[cv.index].selected;
            entity.set_cv_selected(cv.index, mode.apply(current))?;
        }
        Ok(())
    }

    /// Combine picked entities with the entity selection. Repeated handles
    /// count once.
    pub fn select_entities(&mut self, ids: &[EntityId], mode: SelectMode) -> Result<()> {
        if let Some(&stale) = ids.iter().find(|&&id| !self.nodes.contains_key(id)) {
            return Err(KernelError::StaleEntity(stale));
        }
        if mode == SelectMode::Replace {
            for node in self.nodes.values_mut() {
                node.selected = false;
            }
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids.iter().filter(|&&id| seen.insert(id)) {
            let node = &mut self.nodes[id];
            node.selected = mode.apply(node.selected);
        }
        Ok(())
    }

    /// Selected entities.
    pub fn selected_entities(&self) -> Vec<EntityId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.selected)
            .map(|(id, _)| id)
            .collect()
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Update one entity.
    pub fn update(&mut self, id: EntityId) -> Result<()> {
        let config = &self.config;
        let node = self.nodes.get_mut(id).ok_or(KernelError::StaleEntity(id))?;
        node.entity.update(config)
    }

    /// Update every dirty entity.
    ///
    /// A failing entity does not stop the others; the first error is
    /// returned after all have run.
    pub fn update_all(&mut self) -> Result<()> {
        let config = &self.config;
        let mut first_error = None;
        for (id, node) in self.nodes.iter_mut() {
            if let Err(e) = node.entity.update(config) {
                warn!("{id:?} ({}) stays dirty: {e}", node.name);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Picking
    // =========================================================================

    fn update_visible(&mut self) -> Result<()> {
        let config = &self.config;
        for node in self.nodes.values_mut().filter(|n| n.visible) {
            node.entity.update(config)?;
        }
        Ok(())
    }

    /// Closest visible entity hit by the world-space ray
    /// `origin + t * direction`, with its `t`.
    ///
    /// Every dirty visible entity is updated first. If any of those updates
    /// fails the whole pick returns that error, even when the ray would
    /// only have reached healthy entities; hide the failing entity to pick
    /// around it.
    pub fn ray_pick(
        &mut self,
        origin: &Point3,
        direction: &Vec3,
    ) -> Result<Option<(EntityId, f64)>> {
        self.update_visible()?;
        let mut best: Option<(EntityId, f64)> = None;
        for (id, node) in self.nodes.iter().filter(|(_, n)| n.visible) {
            let Some(mesh) = node.entity.pick_mesh() else {
                continue;
            };
            let pick = intersect_ray(mesh, &node.world, origin, direction);
            if let Some(t) = pick.hit {
                if best.map_or(true, |(_, b)| t < b) {
                    best = Some((id, t));
                }
            }
        }
        trace!("ray pick: {best:?}");
        Ok(best)
    }

    /// Visible entities whose pick mesh reaches into `frustum`.
    ///
    /// Fails like [`Scene::ray_pick`] when a visible entity cannot update.
    pub fn frustum_pick(&mut self, frustum: &Frustum) -> Result<Vec<EntityId>> {
        self.update_visible()?;
        let picked: Vec<EntityId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.visible)
            .filter(|(_, n)| {
                n.entity
                    .pick_mesh()
                    .is_some_and(|mesh| intersect_frustum(mesh, &n.world, frustum))
            })
            .map(|(id, _)| id)
            .collect();
        trace!("frustum pick: {} entities", picked.len());
        Ok(picked)
    }

    /// Control points of visible entities inside `frustum`.
    pub fn frustum_pick_cvs(&self, frustum: &Frustum) -> Vec<CvRef> {
        let mut picked = Vec::new();
        for (id, node) in self.nodes.iter().filter(|(_, n)| n.visible) {
            let points = node.entity.control_points().iter().map(|cv| cv.cartesian());
            picked.extend(
                frustum_pick_points(points, &node.world, frustum)
                    .into_iter()
                    .map(|index| CvRef::new(id, index)),
            );
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BezierPatch, Curve};
    use patchkit_nurbs::ControlPoint;

    #[test]
    fn test_stale_handle() {
        let mut scene = Scene::default();
        let id = scene.insert("patch", BezierPatch::flat(1.0, 0.0));
        scene.remove(id).unwrap();
        assert!(matches!(scene.entity(id), Err(KernelError::StaleEntity(_))));
        assert!(matches!(
            scene.set_cv_selected(CvRef::new(id, 0), true),
            Err(KernelError::StaleEntity(_))
        ));
    }

    #[test]
    fn test_select_modes() {
        let mut scene = Scene::default();
        let id = scene.insert("patch", BezierPatch::flat(1.0, 0.0));
        let a = CvRef::new(id, 0);
        let b = CvRef::new(id, 5);

        scene.select_cvs(&[a, b], SelectMode::Add).unwrap();
        assert_eq!(scene.selected_cvs(), vec![a, b]);
        scene.select_cvs(&[a], SelectMode::Toggle).unwrap();
        assert_eq!(scene.selected_cvs(), vec![b]);
        scene.select_cvs(&[a], SelectMode::Replace).unwrap();
        assert_eq!(scene.selected_cvs(), vec![a]);
        scene.select_cvs(&[a], SelectMode::Remove).unwrap();
        assert!(scene.selected_cvs().is_empty());

        scene.select_cvs(&[a, b, a], SelectMode::Toggle).unwrap();
        assert_eq!(scene.selected_cvs(), vec![a, b]);

        let err = scene.select_cvs(&[CvRef::new(id, 16)], SelectMode::Add).unwrap_err();
        assert!(matches!(err, KernelError::CvIndexOutOfRange { index: 16, count: 16 }));
    }

    #[test]
    fn test_entity_selection() {
        let mut scene = Scene::default();
        let a = scene.insert("a", BezierPatch::flat(1.0, 0.0));
        let b = scene.insert("b", BezierPatch::flat(1.0, 0.0));
        scene.select_entities(&[a, b], SelectMode::Add).unwrap();
        scene.select_entities(&[b], SelectMode::Toggle).unwrap();
        assert_eq!(scene.selected_entities(), vec![a]);
        scene.select_entities(&[b], SelectMode::Replace).unwrap();
        assert_eq!(scene.selected_entities(), vec![b]);
        assert!(scene.node(b).unwrap().is_selected());
        assert_eq!(scene.node(b).unwrap().name(), "b");

        scene.select_entities(&[a, a], SelectMode::Toggle).unwrap();
        assert!(scene.node(a).unwrap().is_selected());
    }

    #[test]
    fn test_move_in_entity_frame() {
        let mut scene = Scene::default();
        let points = (0..4).map(|i| ControlPoint::new(i as f64, 0.0, 0.0)).collect();
        let id = scene.insert_with_transform(
            "curve",
            Curve::clamped(3, points).unwrap(),
            Transform::scale(2.0, 2.0, 2.0),
        );
        scene.update_all().unwrap();

        let delta = Transform::translation(0.0, 4.0, 0.0);
        scene.move_control_points(&[CvRef::new(id, 1)], &delta).unwrap();
        let entity = scene.entity(id).unwrap();
        assert!(entity.is_dirty());
        let p = entity.control_points()[1].cartesian();
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_move_under_rotated_world() {
        let mut scene = Scene::default();
        let id = scene.insert_with_transform(
            "patch",
            BezierPatch::flat(3.0, 0.0),
            Transform::rotation_z(std::f64::consts::FRAC_PI_2),
        );
        // World +x is local -y under a quarter turn about z.
        let delta = Transform::translation(1.0, 0.0, 0.0);
        scene.move_control_points(&[CvRef::new(id, 5)], &delta).unwrap();
        let p = scene.entity(id).unwrap().control_points()[5].cartesian();
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn test_move_checks_before_editing() {
        let mut scene = Scene::default();
        let id = scene.insert("patch", BezierPatch::flat(1.0, 0.0));
        scene.update_all().unwrap();
        let delta = Transform::translation(1.0, 0.0, 0.0);
        let err = scene
            .move_control_points(&[CvRef::new(id, 0), CvRef::new(id, 99)], &delta)
            .unwrap_err();
        assert!(matches!(err, KernelError::CvIndexOutOfRange { index: 99, .. }));
        assert!(!scene.entity(id).unwrap().is_dirty());

        scene.set_world(id, Transform::scale(1.0, 0.0, 1.0)).unwrap();
        let err = scene
            .move_control_points(&[CvRef::new(id, 0)], &delta)
            .unwrap_err();
        assert!(matches!(err, KernelError::SingularTransform(_)));
    }

    #[test]
    fn test_invisible_entities_are_not_picked() {
        let mut scene = Scene::default();
        let id = scene.insert("patch", BezierPatch::flat(1.0, 0.0));
        scene.set_visible(id, false).unwrap();
        let hit = scene
            .ray_pick(&Point3::new(0.47, 0.52, 1.0), &Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert!(hit.is_none());
        let all = Frustum::from_box(&Point3::new(-5.0, -5.0, -5.0), &Point3::new(5.0, 5.0, 5.0));
        assert!(scene.frustum_pick_cvs(&all).is_empty());
        // Hidden entities are not updated by picks either.
        assert!(scene.entity(id).unwrap().is_dirty());
    }
}

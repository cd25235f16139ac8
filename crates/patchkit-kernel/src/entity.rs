//! Entities: geometry plus the render buffers derived from it.
//!
//! An update pass runs four stages in order: tessellation, control hull,
//! wire (curve polyline, isoparms or edge wireframe), then control-point
//! markers. Pending dirty flags are cleared only when every stage succeeds,
//! so a failed pass is retried in full next time.

use log::{debug, warn};
use patchkit_math::{Point3, Transform};
use patchkit_nurbs::ControlPoint;
use patchkit_tessellate::{
    curve_knot_markers, update_curve_wire, update_grid_wire, update_hull, update_isoparms,
    update_polygon_mesh, update_polygon_wire, update_surface_mesh, HullLayout, IsoparmLayout,
    KnotMarker, MarkerBuffer, MarkerIcon, MaterialId, MeshBuffer, SampleAxis, ShadeColor,
};

use crate::config::KernelConfig;
use crate::dirty::{DirtyFlags, UpdatePhase};
use crate::error::{KernelError, Result};
use crate::geometry::{BezierPatch, Curve, Geometry, PolygonMesh, Surface, BEZIER_ORDER};

/// Buffers owned by one entity.
#[derive(Debug, Clone, Default)]
struct Buffers {
    shaded: Option<MeshBuffer>,
    wire: Option<MeshBuffer>,
    hull: Option<MeshBuffer>,
    markers: MarkerBuffer,
}

/// What a pass has to redo.
#[derive(Debug, Clone, Copy)]
struct Pass {
    positions: bool,
    selection: bool,
}

impl Pass {
    fn from_flags(flags: DirtyFlags) -> Self {
        Self {
            positions: flags.contains(DirtyFlags::POSITION),
            selection: flags.contains(DirtyFlags::SELECTION),
        }
    }
}

/// Geometry with its cached meshes and update state.
#[derive(Debug, Clone)]
pub struct Entity {
    geometry: Geometry,
    phase: UpdatePhase,
    buffers: Buffers,
}

impl Entity {
    /// New entity; everything is dirty until the first update.
    pub fn new(geometry: impl Into<Geometry>) -> Self {
        Self {
            geometry: geometry.into(),
            phase: UpdatePhase::Dirty(DirtyFlags::POSITION | DirtyFlags::SELECTION),
            buffers: Buffers::default(),
        }
    }

    /// The geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Edit the geometry freely. The cached buffers are dropped and rebuilt
    /// with fresh topology on the next update.
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        self.buffers = Buffers::default();
        self.mark_dirty(DirtyFlags::POSITION | DirtyFlags::SELECTION);
        &mut self.geometry
    }

    /// Current update state.
    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    /// Whether an update is pending.
    pub fn is_dirty(&self) -> bool {
        self.phase != UpdatePhase::Clean
    }

    /// Queue `flags` for the next update.
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.phase = self.phase.mark(flags);
    }

    /// Shaded triangle mesh (surfaces, patches, polygon meshes).
    pub fn shaded_mesh(&self) -> Option<&MeshBuffer> {
        self.buffers.shaded.as_ref()
    }

    /// Wire line mesh: curve polyline, isoparm network, Bezier sample grid
    /// or polygon edge wireframe.
    pub fn wire_mesh(&self) -> Option<&MeshBuffer> {
        self.buffers.wire.as_ref()
    }

    /// Control hull line mesh. Polygon meshes have none.
    pub fn hull_mesh(&self) -> Option<&MeshBuffer> {
        self.buffers.hull.as_ref()
    }

    /// Control point and knot markers.
    pub fn markers(&self) -> &MarkerBuffer {
        &self.buffers.markers
    }

    /// Mesh used for ray and frustum picks: the polyline for curves, the
    /// shaded mesh for everything else.
    pub fn pick_mesh(&self) -> Option<&MeshBuffer> {
        match self.geometry {
            Geometry::Curve(_) => self.wire_mesh(),
            _ => self.shaded_mesh(),
        }
    }

    /// Control points.
    pub fn control_points(&self) -> &[ControlPoint] {
        self.geometry.control_points()
    }

    fn control_point_mut(&mut self, index: usize) -> Result<&mut ControlPoint> {
        let points = self.geometry.control_points_mut();
        let count = points.len();
        points
            .get_mut(index)
            .ok_or(KernelError::CvIndexOutOfRange { index, count })
    }

    /// Select or deselect a control point. Returns whether it changed.
    pub fn set_cv_selected(&mut self, index: usize, selected: bool) -> Result<bool> {
        let cv = self.control_point_mut(index)?;
        if cv.selected == selected {
            return Ok(false);
        }
        cv.selected = selected;
        self.mark_dirty(DirtyFlags::SELECTION);
        Ok(true)
    }

    /// Move a control point, keeping its weight.
    pub fn set_cv_position(&mut self, index: usize, position: Point3) -> Result<()> {
        self.control_point_mut(index)?.set_cartesian(position);
        self.mark_dirty(DirtyFlags::POSITION);
        Ok(())
    }

    /// Apply a local-space transform to the given control points.
    pub fn transform_cvs(&mut self, indices: &[usize], local: &Transform) -> Result<()> {
        let count = self.control_points().len();
        if let Some(&index) = indices.iter().find(|&&i| i >= count) {
            return Err(KernelError::CvIndexOutOfRange { index, count });
        }
        let points = self.geometry.control_points_mut();
        for &i in indices {
            points[i].transform(local);
        }
        self.mark_dirty(DirtyFlags::POSITION);
        Ok(())
    }

    /// Deselect every control point. Returns whether anything changed.
    pub fn clear_selection(&mut self) -> bool {
        let mut changed = false;
        for cv in self.geometry.control_points_mut() {
            changed |= cv.selected;
            cv.selected = false;
        }
        if changed {
            self.mark_dirty(DirtyFlags::SELECTION);
        }
        changed
    }

    /// Bring every buffer up to date with the geometry.
    ///
    /// A clean entity returns at once. On error the entity keeps the flags
    /// it started with.
    pub fn update(&mut self, config: &KernelConfig) -> Result<()> {
        let flags = self.phase.flags();
        if flags.is_empty() {
            return Ok(());
        }
        self.phase = UpdatePhase::Updating(flags);
        debug!("updating {} entity: {flags:?}", self.geometry.kind());

        let pass = Pass::from_flags(flags);
        let result = match &self.geometry {
            Geometry::Bezier(g) => update_bezier(g, &mut self.buffers, pass, config),
            Geometry::Curve(g) => update_curve(g, &mut self.buffers, pass, config),
            Geometry::Surface(g) => update_surface(g, &mut self.buffers, pass, config),
            Geometry::Polygons(g) => update_polygons(g, &mut self.buffers, pass, config),
        };

        match result {
            Ok(()) => {
                self.phase = UpdatePhase::Clean;
                Ok(())
            }
            Err(e) => {
                warn!("{} entity update failed: {e}", self.geometry.kind());
                self.phase = UpdatePhase::Dirty(flags);
                Err(e)
            }
        }
    }
}

// =============================================================================
// Per-geometry stages
// =============================================================================

fn update_bezier(
    patch: &BezierPatch,
    buffers: &mut Buffers,
    pass: Pass,
    config: &KernelConfig,
) -> Result<()> {
    let materials = &config.materials;
    let n = config.bezier_samples;
    let axis = SampleAxis::unit(n, config.bezier_normal_step);
    let view = patch.view();

    if pass.positions || buffers.shaded.is_none() {
        update_surface_mesh(
            &mut buffers.shaded,
            &view,
            &axis,
            &axis,
            ShadeColor::FromNormal,
            MaterialId(materials.shaded),
        )?;
    }

    let layout = HullLayout::Grid {
        num_u: BEZIER_ORDER,
        num_v: BEZIER_ORDER,
    };
    update_hull(
        &mut buffers.hull,
        patch.points(),
        layout,
        pass.positions,
        pass.selection,
        materials.hull_highlight(),
    )?;

    if pass.positions || buffers.wire.is_none() {
        if let Some(shaded) = &buffers.shaded {
            update_grid_wire(&mut buffers.wire, shaded, n, n, MaterialId(materials.wire))?;
        }
    }

    write_markers(&mut buffers.markers, patch.points(), Some(BEZIER_ORDER), None, pass, &[]);
    Ok(())
}

fn update_curve(
    curve: &Curve,
    buffers: &mut Buffers,
    pass: Pass,
    config: &KernelConfig,
) -> Result<()> {
    let view = curve.view();
    let spans = curve.active_spans();

    update_hull(
        &mut buffers.hull,
        curve.points(),
        HullLayout::Polyline,
        pass.positions,
        pass.selection,
        config.materials.hull_highlight(),
    )?;

    update_curve_wire(
        &mut buffers.wire,
        &view,
        &curve.sample_axis(config),
        curve.knots(),
        &spans,
        pass.positions,
        pass.selection,
        config.materials.wire_highlight(),
    )?;

    let knots = curve_knot_markers(&view, curve.knots(), &spans);
    write_markers(&mut buffers.markers, curve.points(), None, None, pass, &knots);
    Ok(())
}

fn update_surface(
    surface: &Surface,
    buffers: &mut Buffers,
    pass: Pass,
    config: &KernelConfig,
) -> Result<()> {
    let view = surface.view();
    let (num_u, num_v) = surface.dims();
    let (us, vs) = surface.sample_axes(config);

    if pass.positions || buffers.shaded.is_none() {
        update_surface_mesh(
            &mut buffers.shaded,
            &view,
            &us,
            &vs,
            ShadeColor::Black,
            MaterialId(config.materials.shaded),
        )?;
    }

    update_hull(
        &mut buffers.hull,
        surface.points(),
        HullLayout::Grid { num_u, num_v },
        pass.positions,
        pass.selection,
        config.materials.hull_highlight(),
    )?;

    let layout = IsoparmLayout::new(surface.knots_u(), surface.knots_v(), us, vs);
    update_isoparms(
        &mut buffers.wire,
        &view,
        &layout,
        (surface.knots_u(), surface.knots_v()),
        &surface.active_spans(),
        pass.positions,
        pass.selection,
        config.materials.wire_highlight(),
    )?;

    write_markers(&mut buffers.markers, surface.points(), Some(num_u), None, pass, &[]);
    Ok(())
}

fn update_polygons(
    mesh: &PolygonMesh,
    buffers: &mut Buffers,
    pass: Pass,
    config: &KernelConfig,
) -> Result<()> {
    let src = mesh.source();
    if pass.positions || buffers.shaded.is_none() {
        update_polygon_mesh(&mut buffers.shaded, &src)?;
    }
    update_polygon_wire(
        &mut buffers.wire,
        &src,
        pass.positions,
        pass.selection,
        config.materials.wire_highlight(),
    )?;
    write_markers(
        &mut buffers.markers,
        mesh.points(),
        None,
        Some(MarkerIcon::Dot),
        pass,
        &[],
    );
    Ok(())
}

fn write_markers(
    markers: &mut MarkerBuffer,
    points: &[ControlPoint],
    row_len: Option<usize>,
    uniform: Option<MarkerIcon>,
    pass: Pass,
    knots: &[KnotMarker],
) {
    let stale = markers.instances().len() != points.len() + knots.len();
    if pass.positions || stale {
        markers.write(points, row_len, uniform, knots);
    } else if pass.selection {
        markers.write_flags(points, knots.iter().map(|k| k.active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_math::Vec3;

    fn curve_entity() -> Entity {
        let points = (0..6)
            .map(|i| ControlPoint::new(i as f64, (i % 2) as f64, 0.0))
            .collect();
        Entity::new(Curve::clamped(3, points).unwrap())
    }

    #[test]
    fn test_first_update_builds_everything() {
        let mut e = Entity::new(BezierPatch::flat(1.0, 0.0));
        assert!(e.is_dirty());
        e.update(&KernelConfig::default()).unwrap();
        assert_eq!(e.phase(), UpdatePhase::Clean);
        assert_eq!(e.shaded_mesh().unwrap().vertex_count(), 100);
        assert_eq!(e.hull_mesh().unwrap().index_count(), 2 * 24);
        assert_eq!(e.wire_mesh().unwrap().index_count(), 2 * 10 * 18);
        assert_eq!(e.markers().instances().len(), 16);
    }

    #[test]
    fn test_clean_update_is_noop() {
        let mut e = curve_entity();
        let config = KernelConfig::default();
        e.update(&config).unwrap();
        let v = e.wire_mesh().unwrap().vertex_version();
        let m = e.markers().version();
        e.update(&config).unwrap();
        assert_eq!(e.wire_mesh().unwrap().vertex_version(), v);
        assert_eq!(e.markers().version(), m);
    }

    #[test]
    fn test_selection_pass_keeps_vertices() {
        let mut e = curve_entity();
        let config = KernelConfig::default();
        e.update(&config).unwrap();
        let wire_v = e.wire_mesh().unwrap().vertex_version();
        let hull_v = e.hull_mesh().unwrap().vertex_version();
        let wire_i = e.wire_mesh().unwrap().index_version();

        assert!(e.set_cv_selected(0, true).unwrap());
        assert!(!e.set_cv_selected(0, true).unwrap());
        assert_eq!(e.phase(), UpdatePhase::Dirty(DirtyFlags::SELECTION));
        e.update(&config).unwrap();

        let wire = e.wire_mesh().unwrap();
        assert_eq!(wire.vertex_version(), wire_v);
        assert_eq!(wire.index_version(), wire_i + 1);
        assert_eq!(wire.submeshes()[1].count, 10);
        let hull = e.hull_mesh().unwrap();
        assert_eq!(hull.vertex_version(), hull_v);
        assert_eq!(hull.submeshes()[1].count, 2);
        assert_eq!(e.markers().instances()[0].pos_sel[3], 1.0);
    }

    #[test]
    fn test_position_pass_patches_in_place() {
        let mut e = Entity::new(BezierPatch::flat(1.0, 0.0));
        let config = KernelConfig::default();
        e.update(&config).unwrap();
        let iv = e.shaded_mesh().unwrap().index_version();

        let lift = Transform::translation(0.0, 0.0, 2.0);
        e.transform_cvs(&(0..16).collect::<Vec<_>>(), &lift).unwrap();
        e.update(&config).unwrap();
        let shaded = e.shaded_mesh().unwrap();
        assert_eq!(shaded.index_version(), iv);
        assert!((shaded.bounds().aabb.min.z - 2.0).abs() < 1e-6);
        let wire = e.wire_mesh().unwrap();
        assert!((wire.vertices()[0].position[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_index() {
        let mut e = curve_entity();
        let err = e.set_cv_position(6, Point3::origin()).unwrap_err();
        assert!(matches!(err, KernelError::CvIndexOutOfRange { index: 6, count: 6 }));
        let err = e.transform_cvs(&[0, 9], &Transform::identity()).unwrap_err();
        assert!(matches!(err, KernelError::CvIndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn test_collapsed_patch_edge_normal() {
        let mut points = *BezierPatch::flat(1.0, 0.0).points();
        // Collapse the v = 0 row onto one point.
        for cv in &mut points[..4] {
            *cv = ControlPoint::new(0.5, 0.0, 0.0);
        }
        let mut e = Entity::new(BezierPatch::new(points));
        e.update(&KernelConfig::default()).unwrap();
        let mesh = e.shaded_mesh().unwrap();
        for v in mesh.vertices() {
            let n = Vec3::new(v.normal[0] as f64, v.normal[1] as f64, v.normal[2] as f64);
            assert!(n.iter().all(|c| c.is_finite()));
            assert!((n.norm() - 1.0).abs() < 1e-4);
        }
    }
}

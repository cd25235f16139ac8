//! Picking queries against mesh buffers and raw control points.

use log::{trace, warn};
use patchkit_math::{Point3, Transform, Vec3};
use patchkit_tessellate::{MeshBuffer, Primitive};

use crate::clip::Clipper;
use crate::frustum::Frustum;
use crate::ray::Ray;

/// Outcome of a ray query against one mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPick {
    /// World-space ray parameter of the closest hit.
    pub hit: Option<f64>,
    /// Triangles tested; zero when the bounding sphere rejected the ray.
    pub triangles_tested: usize,
}

impl RayPick {
    fn miss() -> Self {
        Self {
            hit: None,
            triangles_tested: 0,
        }
    }
}

/// Cast the world-space ray `origin + t * direction` at `mesh` placed by `world`.
///
/// The returned parameter satisfies `hit = origin + t * direction` in world
/// space. Line meshes never report a hit.
pub fn intersect_ray(
    mesh: &MeshBuffer,
    world: &Transform,
    origin: &Point3,
    direction: &Vec3,
) -> RayPick {
    if mesh.primitive() != Primitive::Triangles {
        return RayPick::miss();
    }
    let Some(inverse) = world.inverse() else {
        warn!("ray pick skipped: singular world matrix");
        return RayPick::miss();
    };

    let world_ray = Ray::new(*origin, *direction);
    let local = world_ray.transformed(&inverse);
    if !mesh.bounds().sphere.hit_by_ray(&local.origin, &local.direction) {
        trace!("ray pick rejected by bounding sphere");
        return RayPick::miss();
    }

    let mut closest = f64::INFINITY;
    let mut tested = 0;
    for tri in mesh.primitives() {
        tested += 1;
        let v0 = mesh.position(tri[0] as usize);
        let v1 = mesh.position(tri[1] as usize);
        let v2 = mesh.position(tri[2] as usize);
        if let Some(t) = local.intersect_triangle(&v0, &v1, &v2) {
            closest = closest.min(t);
        }
    }

    let hit = closest.is_finite().then(|| {
        let world_hit = world.apply_point(&local.at(closest));
        world_ray.param_of(&world_hit)
    });
    trace!("ray pick: {tested} triangles tested, hit {hit:?}");
    RayPick {
        hit,
        triangles_tested: tested,
    }
}

/// Whether any primitive of `mesh` placed by `world` reaches into `frustum`.
///
/// Accepts at once when a referenced vertex is inside; otherwise clips every
/// triangle (or line segment) against all six planes.
pub fn intersect_frustum(mesh: &MeshBuffer, world: &Transform, frustum: &Frustum) -> bool {
    let local = frustum.to_local(world);

    if mesh
        .indices()
        .iter()
        .any(|&i| local.contains_point(&mesh.position(i as usize)))
    {
        trace!("frustum pick: vertex inside");
        return true;
    }

    let mut clipper = Clipper::new();
    let mut polygon = Vec::with_capacity(3);
    for prim in mesh.primitives() {
        polygon.clear();
        polygon.extend(prim.iter().map(|&i| mesh.position(i as usize)));
        if clipper.intersects(&polygon, &local) {
            trace!("frustum pick: clipped primitive survives");
            return true;
        }
    }
    false
}

/// Indices of the points (in the local space of `world`) inside `frustum`.
pub fn frustum_pick_points<I>(points: I, world: &Transform, frustum: &Frustum) -> Vec<usize>
where
    I: IntoIterator<Item = Point3>,
{
    let local = frustum.to_local(world);
    let picked: Vec<usize> = points
        .into_iter()
        .enumerate()
        .filter(|(_, p)| local.contains_point(p))
        .map(|(i, _)| i)
        .collect();
    trace!("frustum pick: {} points inside", picked.len());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchkit_nurbs::{ActiveSpans, BezierView, ControlPoint, CurveView, KnotVector};
    use patchkit_tessellate::{
        update_curve_wire, update_surface_mesh, Highlight, MaterialId, SampleAxis, ShadeColor,
    };

    fn flat_patch(z: f64) -> MeshBuffer {
        let mut grid = [ControlPoint::new(0.0, 0.0, 0.0); 16];
        for iv in 0..4 {
            for iu in 0..4 {
                grid[iv * 4 + iu] = ControlPoint::new(iu as f64 / 3.0, iv as f64 / 3.0, z);
            }
        }
        let axis = SampleAxis::unit(10, 1e-3);
        let mut slot = None;
        update_surface_mesh(
            &mut slot,
            &BezierView::new(&grid),
            &axis,
            &axis,
            ShadeColor::FromNormal,
            MaterialId(0),
        )
        .unwrap();
        slot.unwrap()
    }

    #[test]
    fn test_ray_hits_patch_center() {
        let mesh = flat_patch(1.0);
        let pick = intersect_ray(
            &mesh,
            &Transform::identity(),
            &Point3::new(0.47, 0.52, 2.0),
            &Vec3::new(0.0, 0.0, -1.0),
        );
        assert!((pick.hit.unwrap() - 1.0).abs() < 1e-5);
        assert_eq!(pick.triangles_tested, 162);
    }

    #[test]
    fn test_far_ray_tests_nothing() {
        let mesh = flat_patch(1.0);
        let pick = intersect_ray(
            &mesh,
            &Transform::identity(),
            &Point3::new(50.0, 50.0, 2.0),
            &Vec3::new(0.0, 0.0, -1.0),
        );
        assert_eq!(pick, RayPick::miss());
    }

    #[test]
    fn test_ray_through_world_transform() {
        let mesh = flat_patch(0.0);
        let world = Transform::translation(10.0, 0.0, 0.0).then(&Transform::scale(2.0, 2.0, 2.0));
        // Patch now spans x in [10, 12], y in [0, 2] at z = 0.
        let pick = intersect_ray(
            &mesh,
            &world,
            &Point3::new(11.06, 0.9, 4.0),
            &Vec3::new(0.0, 0.0, -2.0),
        );
        assert!((pick.hit.unwrap() - 2.0).abs() < 1e-5);
        let miss = intersect_ray(
            &mesh,
            &world,
            &Point3::new(0.5, 0.5, 4.0),
            &Vec3::new(0.0, 0.0, -1.0),
        );
        assert!(miss.hit.is_none());
    }

    #[test]
    fn test_ray_singular_world() {
        let mesh = flat_patch(0.0);
        let pick = intersect_ray(
            &mesh,
            &Transform::scale(1.0, 1.0, 0.0),
            &Point3::new(0.5, 0.5, 1.0),
            &Vec3::new(0.0, 0.0, -1.0),
        );
        assert!(pick.hit.is_none());
    }

    #[test]
    fn test_frustum_vertex_inside_and_idempotent() {
        let mesh = flat_patch(0.0);
        let f = Frustum::from_box(&Point3::new(0.4, 0.4, -1.0), &Point3::new(0.6, 0.6, 1.0));
        let world = Transform::identity();
        assert!(intersect_frustum(&mesh, &world, &f));
        assert!(intersect_frustum(&mesh, &world, &f));
        assert_eq!(mesh.vertex_version(), 1);
    }

    #[test]
    fn test_frustum_inside_one_triangle() {
        // Tiny box strictly inside the first grid cell; no vertex falls in it.
        let mesh = flat_patch(0.0);
        let f = Frustum::from_box(&Point3::new(0.02, 0.02, -1.0), &Point3::new(0.04, 0.04, 1.0));
        assert!(intersect_frustum(&mesh, &Transform::identity(), &f));
    }

    #[test]
    fn test_frustum_misses() {
        let mesh = flat_patch(0.0);
        let f = Frustum::from_box(&Point3::new(0.2, 0.2, 0.5), &Point3::new(0.8, 0.8, 1.0));
        assert!(!intersect_frustum(&mesh, &Transform::identity(), &f));
    }

    #[test]
    fn test_line_mesh_frustum_and_ray() {
        let points: Vec<ControlPoint> =
            (0..4).map(|i| ControlPoint::new(i as f64, 0.0, 0.0)).collect();
        let knots = KnotVector::clamped_uniform(4, 1).unwrap();
        let curve = CurveView::new(1, &points, &knots);
        let axis = SampleAxis::over_knots(&knots, 2, 1e-4, 1e-4);
        let spans = ActiveSpans::new(knots.interval_count());
        let hl = Highlight {
            normal: MaterialId(0),
            active: MaterialId(1),
        };
        let mut slot = None;
        update_curve_wire(&mut slot, &curve, &axis, &knots, &spans, true, true, hl).unwrap();
        let mesh = slot.unwrap();

        // One long segment from x = 0 to x ~ 3 crossing a box with no vertex in it.
        let f = Frustum::from_box(&Point3::new(1.0, -0.5, -0.5), &Point3::new(2.0, 0.5, 0.5));
        assert!(intersect_frustum(&mesh, &Transform::identity(), &f));

        let pick = intersect_ray(
            &mesh,
            &Transform::identity(),
            &Point3::new(1.5, 0.0, 1.0),
            &Vec3::new(0.0, 0.0, -1.0),
        );
        assert!(pick.hit.is_none());
    }

    #[test]
    fn test_points_in_moved_frustum() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let world = Transform::translation(5.0, 0.0, 0.0);
        let f = Frustum::from_box(&Point3::new(5.5, -1.0, -1.0), &Point3::new(7.5, 1.0, 1.0));
        assert_eq!(frustum_pick_points(points, &world, &f), vec![1, 2]);
    }
}

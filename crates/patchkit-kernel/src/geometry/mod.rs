//! The geometry an entity carries.

mod bezier;
mod curve;
mod polymesh;
mod surface;

pub use bezier::{BezierPatch, BEZIER_ORDER};
pub use curve::Curve;
pub use polymesh::PolygonMesh;
pub use surface::Surface;

use patchkit_nurbs::ControlPoint;

/// Closed set of editable geometry kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Bicubic Bezier patch.
    Bezier(BezierPatch),
    /// NURBS curve.
    Curve(Curve),
    /// NURBS surface.
    Surface(Surface),
    /// Polygon mesh.
    Polygons(PolygonMesh),
}

impl Geometry {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Bezier(_) => "bezier",
            Geometry::Curve(_) => "curve",
            Geometry::Surface(_) => "surface",
            Geometry::Polygons(_) => "polygons",
        }
    }

    /// Control points (vertices, for polygon meshes).
    pub fn control_points(&self) -> &[ControlPoint] {
        match self {
            Geometry::Bezier(g) => &g.points()[..],
            Geometry::Curve(g) => g.points(),
            Geometry::Surface(g) => g.points(),
            Geometry::Polygons(g) => g.points(),
        }
    }

    pub(crate) fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        match self {
            Geometry::Bezier(g) => &mut g.points_mut()[..],
            Geometry::Curve(g) => g.points_mut(),
            Geometry::Surface(g) => g.points_mut(),
            Geometry::Polygons(g) => g.points_mut(),
        }
    }
}

impl From<BezierPatch> for Geometry {
    fn from(g: BezierPatch) -> Self {
        Geometry::Bezier(g)
    }
}

impl From<Curve> for Geometry {
    fn from(g: Curve) -> Self {
        Geometry::Curve(g)
    }
}

impl From<Surface> for Geometry {
    fn from(g: Surface) -> Self {
        Geometry::Surface(g)
    }
}

impl From<PolygonMesh> for Geometry {
    fn from(g: PolygonMesh) -> Self {
        Geometry::Polygons(g)
    }
}

//! Polygon meshes and Wavefront OBJ import.

use std::collections::HashMap;

use patchkit_math::Vec3;
use patchkit_nurbs::ControlPoint;
use patchkit_tessellate::{Corner, MaterialId, Polygon, PolygonSource};

use crate::error::{KernelError, Result};

/// A polygon mesh whose vertices are editable control points.
///
/// Corners pair a vertex with optional normal and uv pool entries; each
/// distinct corner becomes one shaded vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonMesh {
    points: Vec<ControlPoint>,
    normals: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    corners: Vec<Corner>,
    polygons: Vec<Polygon>,
}

impl PolygonMesh {
    /// Validate and build a mesh. Every corner must reference existing pool
    /// entries and every polygon needs at least three valid corners.
    pub fn new(
        points: Vec<ControlPoint>,
        normals: Vec<Vec3>,
        uvs: Vec<[f32; 2]>,
        corners: Vec<Corner>,
        polygons: Vec<Polygon>,
    ) -> Result<Self> {
        for (i, c) in corners.iter().enumerate() {
            if c.position >= points.len() {
                return Err(KernelError::InvalidPolygon(format!(
                    "corner {i} references vertex {} of {}",
                    c.position,
                    points.len()
                )));
            }
            if c.normal.is_some_and(|n| n >= normals.len()) {
                return Err(KernelError::InvalidPolygon(format!(
                    "corner {i} references a missing normal"
                )));
            }
            if c.uv.is_some_and(|t| t >= uvs.len()) {
                return Err(KernelError::InvalidPolygon(format!(
                    "corner {i} references a missing uv"
                )));
            }
        }
        for (i, poly) in polygons.iter().enumerate() {
            if poly.corners.len() < 3 {
                return Err(KernelError::InvalidPolygon(format!(
                    "polygon {i} has {} corners",
                    poly.corners.len()
                )));
            }
            if let Some(&bad) = poly.corners.iter().find(|&&c| c >= corners.len()) {
                return Err(KernelError::InvalidPolygon(format!(
                    "polygon {i} references corner {bad} of {}",
                    corners.len()
                )));
            }
        }
        Ok(Self {
            points,
            normals,
            uvs,
            corners,
            polygons,
        })
    }

    /// Parse the `v`, `vt`, `vn` and `f` records of a Wavefront OBJ file.
    ///
    /// Face indices may be `v`, `v/vt`, `v//vn` or `v/vt/vn`, 1-based.
    /// Identical corners are shared. Every face gets `material`. Other
    /// records are ignored.
    pub fn from_obj_str(text: &str, material: MaterialId) -> Result<Self> {
        let mut points = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut corners = Vec::new();
        let mut corner_ids: HashMap<Corner, usize> = HashMap::new();
        let mut polygons = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(tag) = fields.next() else {
                continue;
            };
            let bad = |what: &str| {
                KernelError::InvalidPolygon(format!("line {}: bad {what}", line_no + 1))
            };
            match tag {
                "v" => {
                    let v = parse_floats::<3>(fields).ok_or_else(|| bad("vertex"))?;
                    points.push(ControlPoint::new(v[0], v[1], v[2]));
                }
                "vn" => {
                    let n = parse_floats::<3>(fields).ok_or_else(|| bad("normal"))?;
                    normals.push(Vec3::new(n[0], n[1], n[2]));
                }
                "vt" => {
                    let t = parse_floats::<2>(fields).ok_or_else(|| bad("uv"))?;
                    uvs.push([t[0] as f32, t[1] as f32]);
                }
                "f" => {
                    let mut face = Vec::new();
                    for field in fields {
                        let corner = parse_corner(field).ok_or_else(|| bad("face index"))?;
                        let next = corners.len();
                        let id = *corner_ids.entry(corner).or_insert(next);
                        if id == next {
                            corners.push(corner);
                        }
                        face.push(id);
                    }
                    polygons.push(Polygon {
                        corners: face,
                        material,
                    });
                }
                _ => {}
            }
        }
        Self::new(points, normals, uvs, corners, polygons)
    }

    /// Vertices.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.points
    }

    /// Corner table.
    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    /// Polygons.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Borrowed view for the mesh builders.
    pub fn source(&self) -> PolygonSource<'_> {
        PolygonSource {
            points: &self.points,
            normals: &self.normals,
            uvs: &self.uvs,
            corners: &self.corners,
            polygons: &self.polygons,
        }
    }
}

fn parse_floats<'a, const N: usize>(mut fields: impl Iterator<Item = &'a str>) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = fields.next()?.parse().ok()?;
    }
    Some(out)
}

fn parse_corner(field: &str) -> Option<Corner> {
    let mut parts = field.split('/');
    let index = |s: &str| -> Option<usize> { s.parse::<usize>().ok()?.checked_sub(1) };
    let position = index(parts.next()?)?;
    let uv = match parts.next() {
        None | Some("") => None,
        Some(s) => Some(index(s)?),
    };
    let normal = match parts.next() {
        None | Some("") => None,
        Some(s) => Some(index(s)?),
    };
    Some(Corner {
        position,
        normal,
        uv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE: &str = "
# two quads sharing an edge
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
v 2 1 0
vn 0 0 1
vt 0 0
vt 1 1
f 1//1 2//1 3//1 4//1
f 2/1/1 5/2/1 6/2/1 3//1
";

    #[test]
    fn test_obj_import() {
        let mesh = PolygonMesh::from_obj_str(CUBE_FACE, MaterialId(3)).unwrap();
        assert_eq!(mesh.points().len(), 6);
        assert_eq!(mesh.polygons().len(), 2);
        // 2//1 and 2/1/1 differ by uv; 3//1 is shared.
        assert_eq!(mesh.corners().len(), 7);
        assert_eq!(mesh.polygons()[1].corners[3], 2);
        assert_eq!(mesh.polygons()[1].material, MaterialId(3));
        assert_eq!(mesh.source().unique_edges().len(), 7);
    }

    #[test]
    fn test_obj_bad_index() {
        let err = PolygonMesh::from_obj_str("v 0 0 0\nf 1 2 0\n", MaterialId(0)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        let err = PolygonMesh::from_obj_str("v 0 0 0\nf 1 2 3\n", MaterialId(0)).unwrap_err();
        assert!(matches!(err, KernelError::InvalidPolygon(_)));
    }

    #[test]
    fn test_rejects_degenerate_polygon() {
        let points = vec![ControlPoint::new(0.0, 0.0, 0.0), ControlPoint::new(1.0, 0.0, 0.0)];
        let corners = (0..2)
            .map(|position| Corner {
                position,
                normal: None,
                uv: None,
            })
            .collect();
        let polygons = vec![Polygon {
            corners: vec![0, 1],
            material: MaterialId(0),
        }];
        let err = PolygonMesh::new(points, vec![], vec![], corners, polygons).unwrap_err();
        assert!(err.to_string().contains("2 corners"));
    }
}

mod cdt;

pub use cdt::{triangulate_polygon, PlanarTriangulation};

use crate::math::{Point2, Point3, Vector3};

/// Per-vertex tangent frame hint: the texture X axis plus whether the
/// binormal should be flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tangent {
    pub x: Vector3,
    pub flip_y: bool,
}

impl Tangent {
    #[must_use]
    pub fn new(x: Vector3, flip_y: bool) -> Self {
        Self { x, flip_y }
    }
}

/// Triangle mesh buffers for one layer.
///
/// All per-vertex buffers have the same length. Every triangle is
/// counter-clockwise when seen from the side its vertex normals point to.
#[derive(Debug, Clone, Default)]
pub struct LayerMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<[u32; 3]>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Texture coordinates.
    pub uvs: Vec<Point2>,
    /// Texture tangents.
    pub tangents: Vec<Tangent>,
}

impl LayerMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Appends a flat-shaded group of triangles.
    ///
    /// `triangles` index into `points`. Every new vertex gets `normal` and
    /// `tangent`, and a uv from `uv_of`.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn append_flat(
        &mut self,
        points: &[Point3],
        triangles: impl IntoIterator<Item = [u32; 3]>,
        normal: Vector3,
        tangent: Tangent,
        uv_of: impl Fn(&Point3) -> Point2,
    ) {
        let base = self.vertices.len() as u32;
        for point in points {
            self.vertices.push(*point);
            self.normals.push(normal);
            self.uvs.push(uv_of(point));
            self.tangents.push(tangent);
        }
        self.indices
            .extend(triangles.into_iter().map(|[a, b, c]| [base + a, base + b, base + c]));
    }

    /// Whether every per-vertex buffer matches the vertex count and every
    /// index is in range.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let n = self.vertices.len();
        self.normals.len() == n
            && self.uvs.len() == n
            && self.tangents.len() == n
            && self
                .indices
                .iter()
                .flatten()
                .all(|&i| (i as usize) < n)
    }

    /// Geometric normal of triangle `index`, from its winding.
    #[must_use]
    pub fn face_normal(&self, index: usize) -> Option<Vector3> {
        let [a, b, c] = *self.indices.get(index)?;
        let (a, b, c) = (
            self.vertices.get(a as usize)?,
            self.vertices.get(b as usize)?,
            self.vertices.get(c as usize)?,
        );
        (b - a).cross(&(c - a)).try_normalize(crate::math::TOLERANCE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn append_offsets_indices() {
        let mut mesh = LayerMesh::default();
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let tangent = Tangent::new(Vector3::x(), false);
        mesh.append_flat(&tri, [[0, 1, 2]], Vector3::z(), tangent, |p| Point2::new(p.x, p.y));
        mesh.append_flat(&tri, [[0, 1, 2]], Vector3::z(), tangent, |p| Point2::new(p.x, p.y));

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices[1], [3, 4, 5]);
        assert!(mesh.is_consistent());
        assert_relative_eq!(mesh.face_normal(1).unwrap(), Vector3::z());
    }

    #[test]
    fn out_of_range_index_is_inconsistent() {
        let mesh = LayerMesh {
            indices: vec![[0, 1, 2]],
            ..LayerMesh::default()
        };
        assert!(!mesh.is_consistent());
        assert!(mesh.face_normal(0).is_none());
    }
}

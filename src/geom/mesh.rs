//! Triangle meshes loaded from solid-model files.

use crate::Point;
use crate::geom::bboxes::bounding_box;
use std::collections::HashMap;

/// Vertex indices of one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleIndex(pub usize, pub usize, pub usize);

/// A triangle mesh defined by vertices and face indices.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub faces: Vec<TriangleIndex>,
}

/// Vertices are merged when they quantize to the same key at this scale.
const DEDUP_SCALE: f64 = 1e9;

impl Mesh {
    /// Builds a mesh from a triangle soup, merging coincident vertices.
    pub fn from_triangles(triangles: &[[Point; 3]]) -> Self {
        let mut vertices: Vec<Point> = Vec::with_capacity(triangles.len() * 3);
        let mut faces: Vec<TriangleIndex> = Vec::with_capacity(triangles.len());
        let mut key_map: HashMap<(i64, i64, i64), usize> = HashMap::new();

        for tri in triangles {
            let [i0, i1, i2] =
                tri.map(|p| *key_map.entry(vertex_key(p)).or_insert_with(|| {
                    vertices.push(p);
                    vertices.len() - 1
                }));
            faces.push(TriangleIndex(i0, i1, i2));
        }

        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the three corner points of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.faces
            .iter()
            .map(|t| [self.vertices[t.0], self.vertices[t.1], self.vertices[t.2]])
    }

    /// Axis-aligned extents of the mesh, None if it has no vertices.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        bounding_box(&self.vertices)
    }
}

fn vertex_key(p: Point) -> (i64, i64, i64) {
    (
        (p.x * DEDUP_SCALE).round() as i64,
        (p.y * DEDUP_SCALE).round() as i64,
        (p.z * DEDUP_SCALE).round() as i64,
    )
}

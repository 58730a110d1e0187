//! Mesh and material data
//!
//! Read-only snapshots of the meshes delivered by the scene file. The level
//! loader copies these into world space; nothing keeps a reference back
//! into the scene once a room is built.

use serde::{Deserialize, Serialize};

use crate::geom::Triangle;
use crate::math::{Aabb, Mat4, Vec2, Vec3};

/// Surface description attached to a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Diffuse color
    pub diffuse: Vec3,
    /// Texture name, resolved against the level's texture path
    pub texture: Option<String>,
    /// Rendered fullbright
    pub emissive: bool,
    /// Texture coordinate scroll speed (units per second)
    pub uv_velocity: Vec2,
    /// Constant texture coordinate offset
    pub uv_offset: Vec2,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Vec3::ONE,
            texture: None,
            emissive: false,
            uv_velocity: Vec2::ZERO,
            uv_offset: Vec2::ZERO,
        }
    }
}

/// Triangle mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangle indices. `None` means consecutive vertex triples.
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
    /// Surface material
    #[serde(default)]
    pub material: Material,
}

impl Mesh {
    /// Create an unindexed mesh
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices: None,
            material: Material::default(),
        }
    }

    /// Create an indexed mesh
    pub fn indexed(name: impl Into<String>, vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            indices: Some(indices),
            ..Self::new(name, vertices)
        }
    }

    /// Number of triangles described by the mesh
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertices.len() / 3,
        }
    }

    /// Bounding box of the vertex array
    pub fn bounds(&self) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        Aabb::new(min, max)
    }

    /// Flatten the (possibly indexed) data into tagged triangles. Index
    /// triples that reference missing vertices are skipped.
    pub fn triangles(&self, tag: u32) -> impl Iterator<Item = Triangle> + '_ {
        let count = self.triangle_count();
        (0..count).filter_map(move |i| {
            let idx = match &self.indices {
                Some(indices) => [
                    indices[i * 3] as usize,
                    indices[i * 3 + 1] as usize,
                    indices[i * 3 + 2] as usize,
                ],
                None => [i * 3, i * 3 + 1, i * 3 + 2],
            };
            let a = *self.vertices.get(idx[0])?;
            let b = *self.vertices.get(idx[1])?;
            let c = *self.vertices.get(idx[2])?;
            Some(Triangle::with_tag(a, b, c, tag))
        })
    }

    /// Copy with every vertex transformed by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Mesh {
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|v| matrix.transform_point3(*v))
                .collect(),
            ..self.clone()
        }
    }

    /// Transform the vertices in place
    pub fn apply_transform(&mut self, matrix: &Mat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
    }
}

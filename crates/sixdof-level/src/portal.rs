//! Portals between rooms

use glam::{Mat4, Vec3};
use sixdof_core::{BoundingSphere, Mesh};

use crate::room::RoomId;

/// Portal handle: owning room plus index into its portal list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortalId {
    pub room: RoomId,
    pub index: usize,
}

/// One side of an opening between two rooms. The opposite room keeps its
/// own record; linking is resolved after every room is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    /// Scene node name
    pub name: String,
    /// Room owning this record
    pub room: RoomId,
    /// Room on the other side, `None` while unlinked
    pub link: Option<RoomId>,
    /// World-space centroid of the portal mesh
    pub pos: Vec3,
    /// Farthest portal vertex from `pos`
    pub radius: f32,
}

impl Portal {
    /// Portal bounds from a mesh and its node's world matrix. `None` for a
    /// mesh without vertices.
    pub fn from_mesh(
        name: impl Into<String>,
        room: RoomId,
        mesh: &Mesh,
        xform: &Mat4,
    ) -> Option<Self> {
        if mesh.vertices.is_empty() {
            return None;
        }

        let world: Vec<Vec3> = mesh.vertices.iter().map(|v| xform.transform_point3(*v)).collect();
        let pos = world.iter().copied().sum::<Vec3>() / world.len() as f32;
        let radius = world
            .iter()
            .map(|v| v.distance(pos))
            .fold(0.0f32, f32::max);

        Some(Self {
            name: name.into(),
            room,
            link: None,
            pos,
            radius,
        })
    }

    /// Bounding sphere used for link and visibility tests
    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.pos, self.radius)
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }
}

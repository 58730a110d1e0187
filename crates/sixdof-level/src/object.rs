//! Dynamic objects
//!
//! Mesh templates are registered once per level and shared by every
//! object instance that references them.

use glam::{Mat4, Quat, Vec3};
use sixdof_core::{Aabb, Mesh};

/// Index of a dynamic mesh template in its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DynMeshId(pub usize);

/// Level-wide mesh template in object space
#[derive(Debug, Clone, PartialEq)]
pub struct DynMesh {
    pub name: String,
    pub mesh: Mesh,
    pub bounds: Aabb,
}

impl DynMesh {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        let bounds = mesh.bounds();
        Self {
            name: name.into(),
            mesh,
            bounds,
        }
    }
}

/// Placed instance of a dynamic mesh, or an empty placeholder waiting for
/// a binding from the level description
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicObject {
    /// Scene node name
    pub name: String,
    /// Local position
    pub pos: Vec3,
    /// Local rotation
    pub rot: Quat,
    /// Local scale
    pub scale: Vec3,
    /// World matrix of the node's parent
    pub parent_xform: Mat4,
    /// Current world matrix
    pub xform: Mat4,
    /// Inverse of `xform`
    pub inv_xform: Mat4,
    /// Rendered mesh
    pub mesh: Option<DynMeshId>,
    /// Separate collision mesh
    pub colmesh: Option<DynMeshId>,
    /// Constant rotation axis
    pub rot_axis: Vec3,
    /// Constant rotation speed, radians per second
    pub rot_speed: f32,
    /// Action fired when the object is touched
    pub action: Option<String>,
}

impl DynamicObject {
    pub fn new(
        name: impl Into<String>,
        pos: Vec3,
        rot: Quat,
        scale: Vec3,
        parent_xform: Mat4,
    ) -> Self {
        let mut obj = Self {
            name: name.into(),
            pos,
            rot,
            scale,
            parent_xform,
            xform: Mat4::IDENTITY,
            inv_xform: Mat4::IDENTITY,
            mesh: None,
            colmesh: None,
            rot_axis: Vec3::Y,
            rot_speed: 0.0,
            action: None,
        };
        obj.update_xform();
        obj
    }

    /// Recompute the world matrix and its inverse
    pub fn update_xform(&mut self) {
        let local = Mat4::from_scale_rotation_translation(self.scale, self.rot, self.pos);
        self.xform = self.parent_xform * local;
        self.inv_xform = self.xform.inverse();
    }

    /// Advance the constant rotation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.rot_speed == 0.0 {
            return;
        }
        let Some(axis) = self.rot_axis.try_normalize() else {
            return;
        };
        self.rot = (Quat::from_axis_angle(axis, self.rot_speed * dt) * self.rot).normalize();
        self.update_xform();
    }

    /// World-space position
    pub fn world_pos(&self) -> Vec3 {
        self.xform.transform_point3(Vec3::ZERO)
    }
}

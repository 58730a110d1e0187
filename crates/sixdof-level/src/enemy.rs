//! Enemies and missiles
//!
//! Enemies are owned by the level; rooms only list the ids of the enemies
//! currently inside them. Missiles live in their room's fixed slot table.

use glam::{Mat4, Quat, Vec3};
use sixdof_core::BoundingSphere;

use crate::room::RoomId;

/// Index of an enemy in its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(pub usize);

/// Enemy state
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub pos: Vec3,
    pub rot: Quat,
    /// Hit sphere radius
    pub radius: f32,
    pub hp: f32,
    /// Room the enemy is listed in
    pub room: RoomId,
    pub alive: bool,
}

impl Enemy {
    pub fn new(pos: Vec3, radius: f32, hp: f32, room: RoomId) -> Self {
        Self {
            pos,
            rot: Quat::IDENTITY,
            radius,
            hp,
            room,
            alive: true,
        }
    }

    /// World matrix for rendering
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rot, self.pos)
    }

    /// Hit sphere in world space
    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.pos, self.radius)
    }

    /// Apply damage; returns true when this blow killed the enemy
    pub fn damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// Who fired a missile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissileOwner {
    Player,
    Enemy(EnemyId),
}

/// Projectile in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Missile {
    pub pos: Vec3,
    /// Velocity in units per second
    pub vel: Vec3,
    pub owner: MissileOwner,
    /// Damage dealt on impact
    pub damage: f32,
    /// Remaining lifetime in seconds
    pub life: f32,
}

impl Missile {
    /// World matrix for rendering, facing along the velocity
    pub fn world_matrix(&self) -> Mat4 {
        let dir = self.vel.normalize_or_zero();
        let rot = if dir == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::NEG_Z, dir)
        };
        Mat4::from_rotation_translation(rot, self.pos)
    }
}

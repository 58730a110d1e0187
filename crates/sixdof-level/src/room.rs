//! Rooms
//!
//! A room owns its render meshes, its collision octree, its portals,
//! triggers, dynamic objects and a fixed table of missile slots. Bounds and
//! octree never change after loading; everything else is simulation state.

use sixdof_core::{Aabb, Mesh};
use sixdof_physics::Octree;

use crate::enemy::{EnemyId, Missile};
use crate::object::DynamicObject;
use crate::portal::Portal;

/// Missile slots per room
pub const MAX_ROOM_MISSILES: usize = 16;

/// Index of a room in its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub usize);

/// Box that fires a named action when entered
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub bounds: Aabb,
    pub action: String,
}

/// Room in the level graph
#[derive(Debug, Clone)]
pub struct Room {
    /// Unique name within the level
    pub name: String,
    /// World-space render meshes
    pub meshes: Vec<Mesh>,
    /// Collision geometry
    pub octree: Octree,
    /// Union of the world-space render meshes
    pub bounds: Aabb,
    pub portals: Vec<Portal>,
    pub triggers: Vec<Trigger>,
    pub objects: Vec<DynamicObject>,
    /// Enemies currently inside this room
    pub enemies: Vec<EnemyId>,
    missiles: [Option<Missile>; MAX_ROOM_MISSILES],
    num_missiles: usize,
}

impl Room {
    /// Create an empty room
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
            octree: Octree::new(),
            bounds: Aabb::EMPTY,
            portals: Vec::new(),
            triggers: Vec::new(),
            objects: Vec::new(),
            enemies: Vec::new(),
            missiles: [None; MAX_ROOM_MISSILES],
            num_missiles: 0,
        }
    }

    /// Append a world-space render mesh and grow the bounds
    pub fn add_mesh(&mut self, mesh: Mesh) {
        for v in &mesh.vertices {
            self.bounds.union_point(*v);
        }
        self.meshes.push(mesh);
    }

    /// Put a missile in the first free slot. Returns false when the table
    /// is full.
    pub fn add_missile(&mut self, missile: Missile) -> bool {
        let Some(slot) = self.missiles.iter().position(Option::is_none) else {
            log::debug!("room {}: missile table full", self.name);
            return false;
        };
        self.missiles[slot] = Some(missile);
        self.num_missiles += 1;
        true
    }

    /// Free a missile slot, returning what it held
    pub fn remove_missile(&mut self, slot: usize) -> Option<Missile> {
        let missile = self.missiles.get_mut(slot)?.take()?;
        self.num_missiles -= 1;
        Some(missile)
    }

    /// Missile in a slot
    pub fn missile(&self, slot: usize) -> Option<&Missile> {
        self.missiles.get(slot)?.as_ref()
    }

    pub(crate) fn missile_mut(&mut self, slot: usize) -> Option<&mut Missile> {
        self.missiles.get_mut(slot)?.as_mut()
    }

    /// Active missiles with their slot numbers
    pub fn missiles(&self) -> impl Iterator<Item = (usize, &Missile)> {
        self.missiles
            .iter()
            .enumerate()
            .filter_map(|(slot, m)| m.as_ref().map(|m| (slot, m)))
    }

    /// Number of active missiles
    pub fn num_missiles(&self) -> usize {
        self.num_missiles
    }

    /// Portals with a resolved link
    pub fn linked_portals(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter().filter(|p| p.link.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::MissileOwner;
    use glam::Vec3;

    fn missile(x: f32) -> Missile {
        Missile {
            pos: Vec3::new(x, 0.0, 0.0),
            vel: Vec3::Z,
            owner: MissileOwner::Player,
            damage: 1.0,
            life: 1.0,
        }
    }

    #[test]
    fn test_add_mesh_grows_bounds() {
        let mut room = Room::new("hall");
        room.add_mesh(Mesh::new("a", vec![Vec3::ZERO, Vec3::X, Vec3::Y]));
        room.add_mesh(Mesh::new("b", vec![Vec3::new(-2.0, 0.0, 4.0)]));
        assert_eq!(room.bounds.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(room.bounds.max, Vec3::new(1.0, 1.0, 4.0));
    }

    #[test]
    fn test_missile_slots() {
        let mut room = Room::new("hall");
        for i in 0..MAX_ROOM_MISSILES {
            assert!(room.add_missile(missile(i as f32)));
        }
        assert!(!room.add_missile(missile(99.0)));
        assert_eq!(room.num_missiles(), MAX_ROOM_MISSILES);

        let removed = room.remove_missile(3).unwrap();
        assert_eq!(removed.pos.x, 3.0);
        assert!(room.remove_missile(3).is_none());
        assert_eq!(room.num_missiles(), MAX_ROOM_MISSILES - 1);

        // freed slot is reused
        assert!(room.add_missile(missile(42.0)));
        assert_eq!(room.missile(3).unwrap().pos.x, 42.0);
        assert_eq!(room.missiles().count(), MAX_ROOM_MISSILES);
    }
}

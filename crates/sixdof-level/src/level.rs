//! Level: the room graph plus everything shared between rooms
//!
//! The level owns rooms, enemies, actions, dynamic mesh templates and the
//! texture cache. Rooms refer to each other, to enemies and to templates by
//! index only.

use ahash::AHashMap;
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use sixdof_core::{Aabb, BoundingSphere};

use crate::action::Action;
use crate::config::LevelConfig;
use crate::enemy::{Enemy, EnemyId, Missile, MissileOwner};
use crate::error::{LevelError, LevelResult};
use crate::object::{DynMesh, DynMeshId};
use crate::portal::{Portal, PortalId};
use crate::room::{Room, RoomId, MAX_ROOM_MISSILES};
use crate::texture::TextureCache;

/// Outcome of one missile during `update_missiles`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissileEvent {
    /// Struck an enemy; `killed` when the blow was fatal
    HitEnemy { enemy: EnemyId, pos: Vec3, killed: bool },
    /// Struck level geometry
    HitWall { room: RoomId, pos: Vec3 },
    /// Lifetime ran out
    Expired { room: RoomId },
    /// Moved into another room
    Transferred { from: RoomId, to: RoomId },
    /// Left its room with nowhere to go
    Lost { room: RoomId, pos: Vec3 },
}

/// Loaded level
#[derive(Debug, Clone)]
pub struct Level {
    pub(crate) rooms: Vec<Room>,
    pub(crate) room_names: AHashMap<String, RoomId>,
    pub(crate) actions: IndexMap<String, Action>,
    pub(crate) dynmeshes: IndexMap<String, DynMesh>,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) textures: TextureCache,
    pub(crate) bounds: Aabb,
    /// Diagonal of `bounds`. Not the largest vertex-to-vertex distance, but
    /// never shorter than it
    pub(crate) max_dist: f32,
    pub(crate) num_enemies: usize,
    pub(crate) config: LevelConfig,
    /// Player start position
    pub start_pos: Vec3,
    /// Player start orientation
    pub start_rot: Quat,
}

impl Level {
    /// Assemble a level from finished rooms: link portals and compute the
    /// level bounds. Room ids are positions in `rooms`.
    pub fn from_rooms(rooms: Vec<Room>, config: LevelConfig) -> LevelResult<Self> {
        if rooms.is_empty() {
            return Err(LevelError::NoRooms);
        }

        let mut room_names = AHashMap::with_capacity(rooms.len());
        for (i, room) in rooms.iter().enumerate() {
            if room_names.insert(room.name.clone(), RoomId(i)).is_some() {
                log::warn!("duplicate room name `{}`, lookups find the last one", room.name);
            }
        }

        let mut level = Self {
            rooms,
            room_names,
            actions: IndexMap::new(),
            dynmeshes: IndexMap::new(),
            enemies: Vec::new(),
            textures: TextureCache::default(),
            bounds: Aabb::EMPTY,
            max_dist: 0.0,
            num_enemies: 0,
            config,
            start_pos: Vec3::ZERO,
            start_rot: Quat::IDENTITY,
        };
        level.link_portals();
        level.update_bounds();
        Ok(level)
    }

    /// Connect every unlinked portal to the room of the first portal in
    /// another room whose bounding sphere overlaps it
    fn link_portals(&mut self) {
        let spheres: Vec<(RoomId, BoundingSphere)> = self
            .rooms
            .iter()
            .enumerate()
            .flat_map(|(i, room)| room.portals.iter().map(move |p| (RoomId(i), p.sphere())))
            .collect();

        for (i, room) in self.rooms.iter_mut().enumerate() {
            for portal in room.portals.iter_mut().filter(|p| p.link.is_none()) {
                let sphere = portal.sphere();
                portal.link = spheres
                    .iter()
                    .find(|(other, s)| other.0 != i && s.intersects(&sphere))
                    .map(|(other, _)| *other);

                if portal.link.is_none() {
                    log::warn!(
                        "room {}: portal {} is not linked to any room",
                        room.name,
                        portal.name
                    );
                }
            }
        }
    }

    fn update_bounds(&mut self) {
        let mut bounds = Aabb::EMPTY;
        for room in &self.rooms {
            if !room.bounds.is_empty() {
                bounds.union(&room.bounds);
            }
        }
        self.bounds = bounds;
        self.max_dist = if bounds.is_empty() { 0.0 } else { bounds.size().length() };
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id.0)
    }

    pub fn room_by_name(&self, name: &str) -> Option<RoomId> {
        self.room_names.get(name).copied()
    }

    /// Every portal of every room
    pub fn portals(&self) -> impl Iterator<Item = (PortalId, &Portal)> {
        self.rooms.iter().enumerate().flat_map(|(r, room)| {
            room.portals.iter().enumerate().map(move |(index, p)| {
                (PortalId { room: RoomId(r), index }, p)
            })
        })
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.room(id.room)?.portals.get(id.index)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> &IndexMap<String, Action> {
        &self.actions
    }

    /// Register a named action, replacing any previous definition
    pub fn add_action(&mut self, name: impl Into<String>, action: Action) {
        self.actions.insert(name.into(), action);
    }

    pub fn dynmesh(&self, id: DynMeshId) -> Option<&DynMesh> {
        self.dynmeshes.get_index(id.0).map(|(_, m)| m)
    }

    pub fn dynmesh_id(&self, name: &str) -> Option<DynMeshId> {
        self.dynmeshes.get_index_of(name).map(DynMeshId)
    }

    pub fn dynmeshes(&self) -> impl Iterator<Item = &DynMesh> {
        self.dynmeshes.values()
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id.0)
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(id.0)
    }

    /// Enemy count requested by the level description
    pub fn num_enemies(&self) -> usize {
        self.num_enemies
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Union of every room's bounds
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Length of the level bounds diagonal, an upper bound on any distance
    /// inside the level
    pub fn max_dist(&self) -> f32 {
        self.max_dist
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Total collision triangles across rooms, duplicates included
    pub fn triangle_count(&self) -> usize {
        self.rooms.iter().map(|r| r.octree.stats().triangles).sum()
    }

    /// Place `count` enemies round-robin at the centres of rooms whose
    /// centre passes the point-in-room test. Returns the number placed.
    pub fn spawn_enemies(&mut self, count: usize) -> usize {
        self.num_enemies = count;
        if count == 0 {
            return 0;
        }

        let spots: Vec<(RoomId, Vec3)> = self
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, room)| !room.bounds.is_empty())
            .map(|(i, room)| (RoomId(i), room.bounds.center()))
            .filter(|(id, center)| self.room_at(*center) == Some(*id))
            .collect();

        if spots.is_empty() {
            log::warn!("no room can hold enemies, none spawned");
            return 0;
        }

        let enemy = self.config.enemy;
        for i in 0..count {
            let (room, pos) = spots[i % spots.len()];
            self.add_enemy(Enemy::new(pos, enemy.radius, enemy.hp, room));
        }
        log::debug!("spawned {count} enemies in {} rooms", spots.len());
        count
    }

    /// Take ownership of an enemy and list it in its room. Returns `None`
    /// when the enemy's room does not exist.
    pub fn add_enemy(&mut self, enemy: Enemy) -> Option<EnemyId> {
        let room = self.rooms.get_mut(enemy.room.0)?;
        let id = EnemyId(self.enemies.len());
        room.enemies.push(id);
        self.enemies.push(enemy);
        Some(id)
    }

    /// Trigger actions whose box contains `point`
    pub fn triggers_at(
        &self,
        room: RoomId,
        point: Vec3,
    ) -> impl Iterator<Item = (&str, &Action)> + '_ {
        self.room(room)
            .into_iter()
            .flat_map(|r| r.triggers.iter())
            .filter(move |t| t.bounds.contains_point(point))
            .filter_map(move |t| self.actions.get_key_value(t.action.as_str()))
            .map(|(name, action)| (name.as_str(), action))
    }

    /// Launch a missile from `pos`. Returns false when `room` is unknown or
    /// its missile table is full.
    pub fn fire_missile(
        &mut self,
        room: RoomId,
        pos: Vec3,
        vel: Vec3,
        owner: MissileOwner,
        damage: f32,
        life: f32,
    ) -> bool {
        let Some(room) = self.rooms.get_mut(room.0) else {
            return false;
        };
        room.add_missile(Missile {
            pos,
            vel,
            owner,
            damage,
            life,
        })
    }

    /// Advance the simulation state owned by the level
    pub fn update(&mut self, dt: f32) -> Vec<MissileEvent> {
        for room in &mut self.rooms {
            for obj in &mut room.objects {
                obj.update(dt);
            }
        }
        self.update_missiles(dt)
    }

    /// Move every missile `dt` seconds along its velocity. Missiles stop at
    /// the first wall; player missiles damage the first enemy in front of
    /// the wall.
    pub fn update_missiles(&mut self, dt: f32) -> Vec<MissileEvent> {
        let mut events = Vec::new();
        let mut moved = Vec::new();

        for r in 0..self.rooms.len() {
            let room = RoomId(r);
            for slot in 0..MAX_ROOM_MISSILES {
                let Some(mut missile) = self.rooms[r].missile(slot).copied() else {
                    continue;
                };

                missile.life -= dt;
                if missile.life <= 0.0 {
                    self.rooms[r].remove_missile(slot);
                    events.push(MissileEvent::Expired { room });
                    continue;
                }

                let step = missile.vel * dt;
                let wall = self.check_collision(Some(room), missile.pos, step);
                let max_t = wall.map_or(1.0, |w| w.t);

                if missile.owner == MissileOwner::Player {
                    if let Some(hit) = self.hit_enemy(Some(room), missile.pos, step, max_t) {
                        let killed = self.damage_enemy(hit.enemy, missile.damage);
                        self.rooms[r].remove_missile(slot);
                        events.push(MissileEvent::HitEnemy {
                            enemy: hit.enemy,
                            pos: hit.pos,
                            killed,
                        });
                        continue;
                    }
                }

                if let Some(wall) = wall {
                    self.rooms[r].remove_missile(slot);
                    events.push(MissileEvent::HitWall { room: wall.room, pos: wall.pos });
                    continue;
                }

                missile.pos += step;
                if let Some(slot_ref) = self.rooms[r].missile_mut(slot) {
                    *slot_ref = missile;
                }
                if !self.rooms[r].bounds.contains_point(missile.pos) {
                    moved.push((room, slot));
                }
            }
        }

        for (from, slot) in moved {
            let Some(missile) = self.rooms[from.0].remove_missile(slot) else {
                continue;
            };
            match self.room_at(missile.pos) {
                Some(to) if self.rooms[to.0].add_missile(missile) => {
                    events.push(MissileEvent::Transferred { from, to });
                }
                _ => events.push(MissileEvent::Lost {
                    room: from,
                    pos: missile.pos,
                }),
            }
        }
        events
    }

    /// Apply damage and drop dead enemies from their room's list
    fn damage_enemy(&mut self, id: EnemyId, amount: f32) -> bool {
        let Some(enemy) = self.enemies.get_mut(id.0) else {
            return false;
        };
        let killed = enemy.damage(amount);
        if killed {
            let room = enemy.room;
            if let Some(room) = self.rooms.get_mut(room.0) {
                room.enemies.retain(|e| *e != id);
            }
        }
        killed
    }
}

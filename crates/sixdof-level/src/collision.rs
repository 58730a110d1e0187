//! Collision and hit-scan queries across the room graph
//!
//! Every query starts in one room and falls through portals into adjacent
//! rooms. A stack of visited rooms bounded by `QueryConfig::max_depth`
//! keeps cyclic portal graphs from looping; running out of depth simply
//! ends the search.

use glam::Vec3;
use smallvec::SmallVec;
use sixdof_core::{BoundingSphere, Ray, RayHit};

use crate::enemy::EnemyId;
use crate::level::Level;
use crate::portal::Portal;
use crate::room::RoomId;

/// Rooms visited by one query, in traversal order
pub type RoomPath = SmallVec<[RoomId; 4]>;

/// Probe directions of the point-in-room test
const PROBES: [Vec3; 6] = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

/// Collision against level geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    /// World-space impact point
    pub pos: Vec3,
    /// Normal of the struck triangle
    pub normal: Vec3,
    /// Signed distance of the query's start point to the struck plane
    pub depth: f32,
    /// Ray parameter of the impact, in units of the movement vector
    pub t: f32,
    /// Room owning the struck triangle
    pub room: RoomId,
}

impl CollisionHit {
    fn from_ray(ray: &Ray, hit: &RayHit) -> Self {
        Self {
            pos: hit.point,
            normal: hit.triangle.normal,
            depth: hit.triangle.plane().distance_to_point(ray.origin),
            t: hit.t,
            room: RoomId(hit.triangle.tag as usize),
        }
    }
}

/// Nearest enemy on a hit-scan ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyHit {
    pub enemy: EnemyId,
    /// Ray parameter of the hit
    pub t: f32,
    pub pos: Vec3,
}

/// Does a movement ray reach through `portal`. A segment that starts inside
/// the portal sphere counts as passing through.
fn ray_enters(ray: &Ray, portal: &Portal) -> bool {
    let sphere = portal.sphere();
    sphere.contains_point(ray.origin) || ray.intersect_sphere(&sphere).is_some()
}

impl Level {
    fn max_query_depth(&self) -> usize {
        self.config.query.max_depth.max(1)
    }

    /// Room containing `point`. Candidates are rooms whose bounds contain
    /// the point; each casts six axis probes against its collision mesh
    /// and the room struck most often wins. Ties keep the lower room id.
    pub fn room_at(&self, point: Vec3) -> Option<RoomId> {
        let len = self.max_dist.max(1.0);
        let mut best: Option<(RoomId, usize)> = None;

        for (i, room) in self.rooms.iter().enumerate() {
            if !room.bounds.contains_point(point) {
                continue;
            }
            let votes = PROBES
                .iter()
                .filter(|dir| room.octree.raytest(&Ray::new(point, **dir * len), 1.0).is_some())
                .count();
            if votes > 0 && best.is_none_or(|(_, most)| votes > most) {
                best = Some((RoomId(i), votes));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Ray collision of the movement `vel` starting at `pos`. When `room`
    /// is `None` the start room is found with `room_at`.
    pub fn check_collision(
        &self,
        room: Option<RoomId>,
        pos: Vec3,
        vel: Vec3,
    ) -> Option<CollisionHit> {
        self.check_collision_traced(room, pos, vel).0
    }

    /// `check_collision` that also reports the rooms it tested
    pub fn check_collision_traced(
        &self,
        room: Option<RoomId>,
        pos: Vec3,
        vel: Vec3,
    ) -> (Option<CollisionHit>, RoomPath) {
        let mut path = RoomPath::new();
        let Some(start) = room.or_else(|| self.room_at(pos)) else {
            return (None, path);
        };
        let hit = self.collide_ray(start, &Ray::new(pos, vel), &mut path);
        (hit, path)
    }

    fn collide_ray(&self, id: RoomId, ray: &Ray, path: &mut RoomPath) -> Option<CollisionHit> {
        let room = self.room(id)?;
        path.push(id);

        if let Some(hit) = room.octree.raytest(ray, 1.0) {
            return Some(CollisionHit::from_ray(ray, &hit));
        }
        if path.len() >= self.max_query_depth() {
            return None;
        }

        let next = room
            .linked_portals()
            .find(|p| p.link.is_some_and(|l| !path.contains(&l)) && ray_enters(ray, p))?;
        let link = next.link?;
        self.collide_ray(link, ray, path)
    }

    /// Sphere collision: the sphere of `radius` moved by `vel` from `pos`
    /// is tested at its destination. The reported `depth` is the signed
    /// distance of the destination centre to the touched plane, so the
    /// penetration is `radius - depth`.
    pub fn check_collision_sphere(
        &self,
        room: Option<RoomId>,
        pos: Vec3,
        vel: Vec3,
        radius: f32,
    ) -> Option<CollisionHit> {
        let start = room.or_else(|| self.room_at(pos))?;
        let mut path = RoomPath::new();
        self.collide_sphere(start, &Ray::new(pos, vel), radius, &mut path)
    }

    fn collide_sphere(
        &self,
        id: RoomId,
        ray: &Ray,
        radius: f32,
        path: &mut RoomPath,
    ) -> Option<CollisionHit> {
        let room = self.room(id)?;
        path.push(id);

        let target = ray.at(1.0);
        if let Some(hit) = room.octree.sphtest(target, radius) {
            return Some(CollisionHit {
                pos: hit.point,
                normal: hit.triangle.normal,
                depth: hit.triangle.plane().distance_to_point(target),
                t: 1.0,
                room: RoomId(hit.triangle.tag as usize),
            });
        }
        if path.len() >= self.max_query_depth() {
            return None;
        }

        let body = BoundingSphere::new(target, radius);
        let next = room.linked_portals().find(|p| {
            p.link.is_some_and(|l| !path.contains(&l))
                && (ray_enters(ray, p) || p.sphere().intersects(&body))
        })?;
        let link = next.link?;
        self.collide_sphere(link, ray, radius, path)
    }

    /// Nearest live enemy struck by the ray `origin + dir * t` with
    /// `t <= max_t`. Every portal the ray passes is followed, and the
    /// closest hit over all reached rooms wins.
    pub fn hit_enemy(
        &self,
        room: Option<RoomId>,
        origin: Vec3,
        dir: Vec3,
        max_t: f32,
    ) -> Option<EnemyHit> {
        let start = room.or_else(|| self.room_at(origin))?;
        let mut path = RoomPath::new();
        self.nearest_enemy(start, &Ray::new(origin, dir), max_t, &mut path)
    }

    fn nearest_enemy(
        &self,
        id: RoomId,
        ray: &Ray,
        max_t: f32,
        path: &mut RoomPath,
    ) -> Option<EnemyHit> {
        let room = self.room(id)?;
        path.push(id);

        let mut best: Option<EnemyHit> = None;
        for &eid in &room.enemies {
            let Some(enemy) = self.enemy(eid).filter(|e| e.alive) else {
                continue;
            };
            let Some(t) = ray.intersect_sphere(&enemy.sphere()) else {
                continue;
            };
            if t <= max_t && best.is_none_or(|b| t < b.t) {
                best = Some(EnemyHit {
                    enemy: eid,
                    t,
                    pos: ray.at(t),
                });
            }
        }

        if path.len() < self.max_query_depth() {
            for portal in room.linked_portals() {
                let Some(link) = portal.link.filter(|l| !path.contains(l)) else {
                    continue;
                };
                if !ray_enters(ray, portal) {
                    continue;
                }
                if let Some(hit) = self.nearest_enemy(link, ray, max_t, path) {
                    if best.is_none_or(|b| hit.t < b.t) {
                        best = Some(hit);
                    }
                }
            }
        }

        path.pop();
        best
    }
}

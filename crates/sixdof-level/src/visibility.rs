//! Portal visibility
//!
//! `update` walks the room graph from the camera's room, narrowing the view
//! frustum at every portal it passes and marking each reached room with the
//! current frame number. `render` then walks the marked rooms depth-first
//! and hands their contents to a [`RenderSink`], each room exactly once.

use glam::Vec3;
use sixdof_core::{BoundingSphere, Frustum, Mesh, Plane};

use crate::enemy::{Enemy, EnemyId, Missile};
use crate::level::Level;
use crate::object::{DynMesh, DynamicObject};
use crate::room::{Room, RoomId};

/// Receiver of the draw list produced by [`Visibility::render`]
pub trait RenderSink {
    /// A room is about to be drawn
    fn begin_room(&mut self, _id: RoomId, _room: &Room) {}

    /// Static world-space mesh
    fn mesh(&mut self, room: RoomId, mesh: &Mesh);

    /// Dynamic object with its template
    fn object(&mut self, _room: RoomId, _object: &DynamicObject, _mesh: Option<&DynMesh>) {}

    fn enemy(&mut self, _id: EnemyId, _enemy: &Enemy) {}

    fn missile(&mut self, _room: RoomId, _missile: &Missile) {}
}

/// Narrow the four side planes of `frustum` to the opening of a portal
/// seen from `viewpoint`. A side plane the portal sphere already touches
/// is kept; any other is swung about the viewpoint until it is tangent to
/// the sphere on its own side. Near and far are unchanged.
pub fn reduce_frustum(frustum: &Frustum, portal: &BoundingSphere, viewpoint: Vec3) -> Frustum {
    let mut reduced = *frustum;
    let to_portal = portal.center - viewpoint;
    let dist = to_portal.length();
    if dist <= portal.radius {
        return reduced;
    }
    let axis = to_portal / dist;
    let sin = portal.radius / dist;
    let cos = (1.0 - sin * sin).sqrt();

    for plane in reduced.planes.iter_mut().take(4) {
        if plane.distance_to_point(portal.center) <= portal.radius {
            continue;
        }
        let Some(side) = (plane.normal - axis * plane.normal.dot(axis)).try_normalize() else {
            continue;
        };
        *plane = Plane::from_point_normal(viewpoint, axis * sin + side * cos);
    }
    reduced
}

/// Per-frame room marks
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    frame: u64,
    vis_frame: Vec<u64>,
    rendered_frame: Vec<u64>,
}

impl Visibility {
    pub fn new(level: &Level) -> Self {
        let rooms = level.rooms().len();
        Self {
            frame: 0,
            vis_frame: vec![0; rooms],
            rendered_frame: vec![0; rooms],
        }
    }

    /// Current frame number; zero before the first update
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Start a new frame and mark every room visible from `room` through
    /// `frustum`
    pub fn update(&mut self, level: &Level, room: RoomId, frustum: &Frustum, viewpoint: Vec3) {
        self.frame += 1;
        let rooms = level.rooms().len();
        if self.vis_frame.len() != rooms {
            self.vis_frame.resize(rooms, 0);
            self.rendered_frame.resize(rooms, 0);
        }
        if room.0 < rooms {
            self.update_room(level, room, frustum, viewpoint);
        }
    }

    fn update_room(&mut self, level: &Level, id: RoomId, frustum: &Frustum, viewpoint: Vec3) {
        self.vis_frame[id.0] = self.frame;
        let Some(room) = level.room(id) else {
            return;
        };

        for portal in room.linked_portals() {
            let Some(link) = portal.link else {
                continue;
            };
            if self.vis_frame.get(link.0).is_none_or(|&f| f == self.frame) {
                continue;
            }
            let sphere = portal.sphere();
            if !frustum.intersects_sphere(&sphere) {
                continue;
            }
            let reduced = reduce_frustum(frustum, &sphere, viewpoint);
            self.update_room(level, link, &reduced, viewpoint);
        }
    }

    /// Marked during the current frame
    pub fn is_visible(&self, room: RoomId) -> bool {
        self.frame > 0 && self.vis_frame.get(room.0) == Some(&self.frame)
    }

    /// Rooms marked during the current frame, in id order
    pub fn visible_rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.vis_frame
            .iter()
            .enumerate()
            .filter(|(_, f)| self.frame > 0 && **f == self.frame)
            .map(|(i, _)| RoomId(i))
    }

    /// Draw the visible rooms reachable from `room`
    pub fn render<S: RenderSink + ?Sized>(&mut self, level: &Level, room: RoomId, sink: &mut S) {
        if self.is_visible(room) {
            self.render_room(level, room, sink);
        }
    }

    fn render_room<S: RenderSink + ?Sized>(&mut self, level: &Level, id: RoomId, sink: &mut S) {
        self.rendered_frame[id.0] = self.frame;
        let Some(room) = level.room(id) else {
            return;
        };

        sink.begin_room(id, room);
        for mesh in &room.meshes {
            sink.mesh(id, mesh);
        }
        for obj in &room.objects {
            sink.object(id, obj, obj.mesh.and_then(|m| level.dynmesh(m)));
        }
        for &eid in &room.enemies {
            if let Some(enemy) = level.enemy(eid).filter(|e| e.alive) {
                sink.enemy(eid, enemy);
            }
        }
        for (_, missile) in room.missiles() {
            sink.missile(id, missile);
        }

        for portal in room.linked_portals() {
            let Some(link) = portal.link else {
                continue;
            };
            if self.is_visible(link) && self.rendered_frame[link.0] != self.frame {
                self.render_room(level, link, sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn view_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_matrix(proj)
    }

    #[test]
    fn test_reduce_keeps_portal() {
        let frustum = view_frustum();
        let portal = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let reduced = reduce_frustum(&frustum, &portal, Vec3::ZERO);

        assert!(reduced.contains_point(portal.center));
        assert_eq!(reduced.planes[Frustum::NEAR], frustum.planes[Frustum::NEAR]);
        assert_eq!(reduced.planes[Frustum::FAR], frustum.planes[Frustum::FAR]);

        // inside the original view, outside the cone through the portal
        let off_axis = Vec3::new(30.0, 0.0, -50.0);
        assert!(frustum.contains_point(off_axis));
        assert!(!reduced.contains_point(off_axis));

        // straight through the portal stays visible
        assert!(reduced.contains_point(Vec3::new(0.0, 0.0, -50.0)));
    }

    fn inside_with_margin(frustum: &Frustum, point: Vec3) -> bool {
        frustum.planes.iter().all(|p| p.distance_to_point(point) >= -1e-4)
    }

    #[test]
    fn test_reduce_contains_slot_opening() {
        let frustum = view_frustum();
        let corners = [
            Vec3::new(-1.0, -0.05, -10.0),
            Vec3::new(1.0, -0.05, -10.0),
            Vec3::new(1.0, 0.05, -10.0),
            Vec3::new(-1.0, 0.05, -10.0),
        ];
        let center = Vec3::new(0.0, 0.0, -10.0);
        let radius = corners.iter().map(|c| c.distance(center)).fold(0.0, f32::max);
        let portal = BoundingSphere::new(center, radius);
        let reduced = reduce_frustum(&frustum, &portal, Vec3::ZERO);

        for corner in corners {
            assert!(inside_with_margin(&reduced, corner), "corner {corner} culled");
        }
        // seen through the left end of the slot
        assert!(reduced.contains_point(Vec3::new(-0.95, 0.0, -10.0) * 2.0));

        for plane in &reduced.planes[..4] {
            assert!((plane.distance_to_point(center) - radius).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reduced_planes_tangent_to_portal() {
        let frustum = view_frustum();
        for x in [-4.0, -1.5, 0.0, 2.5] {
            for y in [-3.0, 0.0, 3.5] {
                for radius in [0.25, 1.0, 2.0] {
                    let center = Vec3::new(x, y, -12.0);
                    let portal = BoundingSphere::new(center, radius);
                    let reduced = reduce_frustum(&frustum, &portal, Vec3::ZERO);

                    for (plane, orig) in reduced.planes.iter().zip(&frustum.planes) {
                        let d = plane.distance_to_point(center);
                        assert!(d >= radius - 1e-4, "portal at {center} r={radius} cut: {d}");
                        if plane != orig {
                            assert!((d - radius).abs() < 1e-4);
                            assert!(plane.distance_to_point(Vec3::ZERO).abs() < 1e-4);
                        }
                    }
                    for dir in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y] {
                        assert!(inside_with_margin(&reduced, center + dir * radius));
                    }
                }
            }
        }
    }

    #[test]
    fn test_reduce_keeps_touching_planes() {
        let frustum = view_frustum();
        // huge portal touching every side plane
        let portal = BoundingSphere::new(Vec3::new(0.0, 0.0, -2.0), 10.0);
        let reduced = reduce_frustum(&frustum, &portal, Vec3::ZERO);
        assert_eq!(reduced, frustum);
    }
}

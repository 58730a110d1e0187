mod common;

use common::{box_mesh, portal, quad, room_with_mesh, Face};
use glam::Vec3;
use sixdof_level::{
    Enemy, EnemyId, Level, LevelConfig, MissileEvent, MissileOwner, QueryConfig, Room, RoomId,
};

/// Two 10-unit rooms side by side along X, open towards each other and
/// joined by one portal pair on the shared x = 10 face
fn two_rooms(config: LevelConfig) -> Level {
    let mut a = room_with_mesh(
        "a",
        RoomId(0),
        box_mesh("a", Vec3::ZERO, Vec3::splat(10.0), &[Face::PosX]),
    );
    let mut b = room_with_mesh(
        "b",
        RoomId(1),
        box_mesh("b", Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0), &[Face::NegX]),
    );
    let door = Vec3::new(10.0, 5.0, 5.0);
    a.portals.push(portal("portal_ab", RoomId(0), door, 7.1));
    b.portals.push(portal("portal_ba", RoomId(1), door, 7.1));
    Level::from_rooms(vec![a, b], config).unwrap()
}

#[test]
fn floor_quad_downward_ray() {
    let floor = quad(
        "floor",
        [
            Vec3::new(-10.0, 2.0, -10.0),
            Vec3::new(-10.0, 2.0, 10.0),
            Vec3::new(10.0, 2.0, 10.0),
            Vec3::new(10.0, 2.0, -10.0),
        ],
    );
    let room = room_with_mesh("r", RoomId(0), floor);
    let level = Level::from_rooms(vec![room], LevelConfig::default()).unwrap();

    let origin = Vec3::new(1.0, 12.0, -3.0);
    let hit = level
        .check_collision(Some(RoomId(0)), origin, Vec3::new(0.0, -20.0, 0.0))
        .unwrap();
    assert!((hit.t - 0.5).abs() < 1e-5);
    assert!((hit.pos - Vec3::new(1.0, 2.0, -3.0)).length() < 1e-4);
    assert!((hit.normal - Vec3::Y).length() < 1e-5);
    assert!((hit.depth - 10.0).abs() < 1e-4);
}

#[test]
fn portals_link_both_ways() {
    let level = two_rooms(LevelConfig::default());
    assert_eq!(level.rooms()[0].portals[0].link, Some(RoomId(1)));
    assert_eq!(level.rooms()[1].portals[0].link, Some(RoomId(0)));
}

#[test]
fn ray_continues_through_portal() {
    let level = two_rooms(LevelConfig::default());
    let origin = Vec3::new(5.0, 4.0, 6.0);

    let (hit, path) =
        level.check_collision_traced(Some(RoomId(0)), origin, Vec3::new(20.0, 0.0, 0.0));
    let hit = hit.unwrap();
    assert_eq!(path.as_slice(), &[RoomId(0), RoomId(1)]);
    assert_eq!(hit.room, RoomId(1));
    assert!((hit.t - 0.75).abs() < 1e-5);
    assert!((hit.pos - Vec3::new(20.0, 4.0, 6.0)).length() < 1e-4);
    assert!((hit.depth.abs() - 15.0).abs() < 1e-4);

    // too short to reach the far wall
    assert!(level.check_collision(Some(RoomId(0)), origin, Vec3::new(10.0, 0.0, 0.0)).is_none());
}

#[test]
fn sphere_continues_through_portal() {
    let level = two_rooms(LevelConfig::default());
    let origin = Vec3::new(8.0, 4.0, 6.0);
    let vel = Vec3::new(11.5, 0.0, 0.0);

    let hit = level.check_collision_sphere(Some(RoomId(0)), origin, vel, 1.0).unwrap();
    assert_eq!(hit.room, RoomId(1));
    assert!((hit.pos - Vec3::new(20.0, 4.0, 6.0)).length() < 1e-4);
    assert!((hit.normal - Vec3::NEG_X).length() < 1e-5);
    assert!((hit.depth - 0.5).abs() < 1e-4);

    // comes to rest clear of the far wall
    let short = Vec3::new(9.0, 0.0, 0.0);
    assert!(level.check_collision_sphere(Some(RoomId(0)), origin, short, 1.0).is_none());

    // the linked room is never tested without a second level of depth
    let shallow = two_rooms(LevelConfig {
        query: QueryConfig { max_depth: 1 },
        ..LevelConfig::default()
    });
    assert!(shallow.check_collision_sphere(Some(RoomId(0)), origin, vel, 1.0).is_none());
}

#[test]
fn max_dist_covers_every_vertex_pair() {
    let level = two_rooms(LevelConfig::default());
    assert!((level.max_dist() - 600f32.sqrt()).abs() < 1e-4);

    let vertices: Vec<Vec3> = level
        .rooms()
        .iter()
        .flat_map(|r| r.meshes.iter().flat_map(|m| m.vertices.iter().copied()))
        .collect();
    let widest = vertices
        .iter()
        .flat_map(|a| vertices.iter().map(move |b| a.distance(*b)))
        .fold(0.0, f32::max);
    assert!(level.max_dist() >= widest - 1e-4);
}

#[test]
fn start_room_found_when_not_given() {
    let level = two_rooms(LevelConfig::default());
    let hit = level
        .check_collision(None, Vec3::new(15.0, 4.0, 6.0), Vec3::new(0.0, -10.0, 0.0))
        .unwrap();
    assert_eq!(hit.room, RoomId(1));
    assert!((hit.pos.y).abs() < 1e-4);
}

#[test]
fn portal_cycle_terminates_within_depth() {
    // two rooms with no geometry, each pointing at the other
    for max_depth in [1, 2, 5] {
        let mut a = Room::new("a");
        let mut b = Room::new("b");
        a.portals.push(portal("portal_a", RoomId(0), Vec3::ZERO, 2.0));
        b.portals.push(portal("portal_b", RoomId(1), Vec3::ZERO, 2.0));
        let config = LevelConfig {
            query: QueryConfig { max_depth },
            ..LevelConfig::default()
        };
        let level = Level::from_rooms(vec![a, b], config).unwrap();

        let start = Vec3::new(-5.0, 0.0, 0.0);
        let (hit, path) = level.check_collision_traced(Some(RoomId(0)), start, Vec3::X * 10.0);
        assert!(hit.is_none());
        assert!(path.len() <= max_depth);
        assert!(path.len() <= 2);
        assert_eq!(path[0], RoomId(0));
    }
}

#[test]
fn room_at_prefers_enclosing_room() {
    // room 0 is open and its bounds cover room 1, which is a closed box
    let open = {
        let floor = quad(
            "floor",
            [
                Vec3::new(-5.0, -2.0, -5.0),
                Vec3::new(-5.0, -2.0, 15.0),
                Vec3::new(15.0, -2.0, 15.0),
                Vec3::new(15.0, -2.0, -5.0),
            ],
        );
        let wall = quad(
            "wall",
            [
                Vec3::new(-5.0, -2.0, -5.0),
                Vec3::new(-5.0, 12.0, -5.0),
                Vec3::new(-5.0, 12.0, 15.0),
                Vec3::new(-5.0, -2.0, 15.0),
            ],
        );
        let mut room = room_with_mesh("open", RoomId(0), floor);
        room.bounds.union(&wall.bounds());
        room
    };
    let closed_box = box_mesh("closed", Vec3::ZERO, Vec3::splat(10.0), &[]);
    let closed = room_with_mesh("closed", RoomId(1), closed_box);
    let level = Level::from_rooms(vec![open, closed], LevelConfig::default()).unwrap();

    let inside = Vec3::new(4.0, 5.5, 6.5);
    assert!(level.rooms()[0].bounds.contains_point(inside));
    assert_eq!(level.room_at(inside), Some(RoomId(1)));

    // outside the closed box, inside the open room's bounds
    assert_eq!(level.room_at(Vec3::new(12.0, 5.0, 12.0)), Some(RoomId(0)));
    assert_eq!(level.room_at(Vec3::new(100.0, 0.0, 0.0)), None);
}

/// Room 0 sees two portals on the -Z axis: the farther one leads to
/// room 1, the nearer one to room 2
fn branching_rooms() -> Level {
    let mut hub = Room::new("hub");
    hub.portals.push(portal("portal_far", RoomId(0), Vec3::new(0.0, 0.0, -20.0), 1.0));
    hub.portals.push(portal("portal_near", RoomId(0), Vec3::new(0.0, 0.0, -10.0), 1.0));
    let mut far = Room::new("far");
    far.portals.push(portal("portal_far_back", RoomId(1), Vec3::new(0.0, 0.0, -20.0), 1.0));
    let mut near = Room::new("near");
    near.portals.push(portal("portal_near_back", RoomId(2), Vec3::new(0.0, 0.0, -10.0), 1.0));
    Level::from_rooms(vec![hub, far, near], LevelConfig::default()).unwrap()
}

#[test]
fn enemy_hit_scan_takes_global_minimum() {
    let mut level = branching_rooms();
    let far = Enemy::new(Vec3::new(0.0, 0.0, -30.0), 1.0, 10.0, RoomId(1));
    let near = Enemy::new(Vec3::new(0.0, 0.0, -15.0), 1.0, 10.0, RoomId(2));
    let far = level.add_enemy(far).unwrap();
    let near = level.add_enemy(near).unwrap();

    let dir = Vec3::new(0.0, 0.0, -40.0);
    let hit = level.hit_enemy(Some(RoomId(0)), Vec3::ZERO, dir, 1.0).unwrap();
    assert_eq!(hit.enemy, near);
    assert!((hit.t - 14.0 / 40.0).abs() < 1e-5);

    level.enemy_mut(near).unwrap().alive = false;
    let hit = level.hit_enemy(Some(RoomId(0)), Vec3::ZERO, dir, 1.0).unwrap();
    assert_eq!(hit.enemy, far);

    assert!(level.hit_enemy(Some(RoomId(0)), Vec3::ZERO, dir, 0.5).is_none());
}

#[test]
fn missiles_hit_enemies_walls_and_expire() {
    let mut level = two_rooms(LevelConfig::default());
    let target = Enemy::new(Vec3::new(4.0, 5.0, 8.0), 1.0, 15.0, RoomId(0));
    let target = level.add_enemy(target).unwrap();
    let start = Vec3::new(4.0, 5.0, 2.0);

    // player missile towards the enemy
    assert!(level.fire_missile(RoomId(0), start, Vec3::Z * 10.0, MissileOwner::Player, 10.0, 5.0));
    let events = level.update_missiles(1.0);
    assert!(matches!(
        events.as_slice(),
        [MissileEvent::HitEnemy { enemy, killed: false, .. }] if *enemy == target
    ));
    assert_eq!(level.rooms()[0].num_missiles(), 0);

    // enemy missiles ignore enemies and stop at the wall behind
    let owner = MissileOwner::Enemy(EnemyId(0));
    assert!(level.fire_missile(RoomId(0), start, Vec3::Z * 10.0, owner, 10.0, 5.0));
    let events = level.update_missiles(1.0);
    assert!(matches!(events.as_slice(), [MissileEvent::HitWall { room: RoomId(0), .. }]));
    assert_eq!(level.enemy(target).unwrap().hp, 5.0);

    // slow missile runs out of time
    assert!(level.fire_missile(RoomId(0), start, Vec3::Y * 0.1, MissileOwner::Player, 1.0, 0.5));
    let events = level.update_missiles(1.0);
    assert!(matches!(events.as_slice(), [MissileEvent::Expired { room: RoomId(0) }]));
}

#[test]
fn missile_moves_into_next_room() {
    let mut level = two_rooms(LevelConfig::default());
    let start = Vec3::new(9.0, 5.0, 5.0);
    assert!(level.fire_missile(RoomId(0), start, Vec3::X * 3.0, MissileOwner::Player, 1.0, 10.0));
    let events = level.update_missiles(1.0);
    assert!(matches!(
        events.as_slice(),
        [MissileEvent::Transferred { from: RoomId(0), to: RoomId(1) }]
    ));
    assert_eq!(level.rooms()[0].num_missiles(), 0);
    let (_, missile) = level.rooms()[1].missiles().next().unwrap();
    assert!((missile.pos - Vec3::new(12.0, 5.0, 5.0)).length() < 1e-5);
}

#[test]
fn spawn_and_triggers() {
    let mut level = two_rooms(LevelConfig::default());
    assert_eq!(level.spawn_enemies(3), 3);
    assert_eq!(level.enemies().len(), 3);
    assert_eq!(level.rooms()[0].enemies.len(), 2);
    assert_eq!(level.rooms()[1].enemies.len(), 1);
    assert_eq!(level.enemies()[1].pos, Vec3::new(15.0, 5.0, 5.0));

    level.add_action("lava", sixdof_level::Action::new(sixdof_level::ActionKind::Damage, 4.0));
    level.room_mut(RoomId(0)).unwrap().triggers.push(sixdof_level::Trigger {
        bounds: sixdof_core::Aabb::new(Vec3::ZERO, Vec3::new(10.0, 1.0, 10.0)),
        action: "lava".to_string(),
    });
    let fired: Vec<_> = level.triggers_at(RoomId(0), Vec3::new(3.0, 0.5, 3.0)).collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].0, "lava");
    assert_eq!(fired[0].1.value, 4.0);
    assert_eq!(level.triggers_at(RoomId(0), Vec3::new(3.0, 5.0, 3.0)).count(), 0);
}

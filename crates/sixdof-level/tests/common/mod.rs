#![allow(dead_code)]

use glam::Vec3;
use sixdof_core::Mesh;
use sixdof_level::{Portal, Room, RoomId};
use sixdof_physics::{Octree, OctreeConfig};

/// Box faces, in the order `box_mesh` emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

pub fn quad(name: &str, corners: [Vec3; 4]) -> Mesh {
    Mesh::indexed(name, corners.to_vec(), vec![0, 1, 2, 0, 2, 3])
}

/// Axis-aligned box surface with the `open` faces left out
pub fn box_mesh(name: &str, min: Vec3, max: Vec3, open: &[Face]) -> Mesh {
    // corner index bits: 1 = max x, 2 = max y, 4 = max z
    let corner = |bits: usize| {
        Vec3::new(
            if bits & 1 != 0 { max.x } else { min.x },
            if bits & 2 != 0 { max.y } else { min.y },
            if bits & 4 != 0 { max.z } else { min.z },
        )
    };
    let faces = [
        (Face::NegX, [0, 2, 6, 4]),
        (Face::PosX, [1, 5, 7, 3]),
        (Face::NegY, [0, 4, 5, 1]),
        (Face::PosY, [2, 3, 7, 6]),
        (Face::NegZ, [0, 1, 3, 2]),
        (Face::PosZ, [4, 6, 7, 5]),
    ];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (face, corners) in faces {
        if open.contains(&face) {
            continue;
        }
        let base = vertices.len() as u32;
        vertices.extend(corners.map(corner));
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::indexed(name, vertices, indices)
}

/// Room whose render and collision geometry is `mesh`
pub fn room_with_mesh(name: &str, id: RoomId, mesh: Mesh) -> Room {
    let mut room = Room::new(name);
    room.octree = Octree::from_triangles(mesh.triangles(id.0 as u32), &OctreeConfig::default());
    room.add_mesh(mesh);
    room
}

/// Unlinked portal record
pub fn portal(name: &str, room: RoomId, pos: Vec3, radius: f32) -> Portal {
    Portal {
        name: name.to_string(),
        room,
        link: None,
        pos,
        radius,
    }
}

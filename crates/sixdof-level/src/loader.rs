//! Level construction from a scene graph and a level description
//!
//! Every root node of the scene is a room. Its subtree is walked once and
//! each node is classified by name prefix:
//!
//! | Prefix    | Becomes                                          |
//! |-----------|--------------------------------------------------|
//! | `portal_` | portal (centroid + radius of its world mesh)     |
//! | `dummy_`  | empty dynamic object placeholder                 |
//! | `dyn_`    | dynamic object instance; children are not walked |
//! | `col_`    | collision-only mesh                              |
//! | other     | render mesh                                      |
//!
//! Rooms without collision meshes collide against their render meshes.
//! Octrees are built in parallel once every room is collected.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use glam::{Mat4, Quat, Vec3};
use indexmap::IndexMap;
use rayon::prelude::*;
use sixdof_core::{Mesh, NodeId, SceneGraph};
use sixdof_physics::{Octree, OctreeConfig};

use crate::action::{Action, ActionKind};
use crate::desc::{parse_table, ActionDef, DynMeshDef, DynObjectDef, LevelDesc, ObjectProps};
use crate::error::{LevelError, LevelResult};
use crate::level::Level;
use crate::object::{DynMesh, DynMeshId, DynamicObject};
use crate::portal::Portal;
use crate::room::{Room, RoomId, Trigger};
use crate::texture::TextureCache;

/// Role of a scene node inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Portal,
    Dummy,
    DynMesh,
    Collision,
    Mesh,
}

impl NodeKind {
    /// Classify a node by its name
    pub fn classify(name: &str) -> Self {
        if name.starts_with("portal_") {
            NodeKind::Portal
        } else if name.starts_with("dummy_") {
            NodeKind::Dummy
        } else if name.starts_with("dyn_") {
            NodeKind::DynMesh
        } else if name.starts_with("col_") {
            NodeKind::Collision
        } else {
            NodeKind::Mesh
        }
    }
}

/// Room under construction
struct PendingRoom {
    room: Room,
    colmeshes: Vec<Mesh>,
}

/// State shared by every room while walking the scene
struct RoomBuilder<'a> {
    scene: &'a SceneGraph,
    objects: &'a IndexMap<String, ObjectProps>,
    actions: &'a IndexMap<String, Action>,
    dynmeshes: &'a mut IndexMap<String, DynMesh>,
}

impl RoomBuilder<'_> {
    fn build_room(&mut self, id: RoomId, root: NodeId) -> PendingRoom {
        let mut pending = PendingRoom {
            room: Room::new(self.scene.node(root).name.clone()),
            colmeshes: Vec::new(),
        };
        self.visit(id, root, &mut pending);
        pending
    }

    fn visit(&mut self, id: RoomId, node_id: NodeId, pending: &mut PendingRoom) {
        let scene = self.scene;
        let node = scene.node(node_id);
        let world = scene.world_matrix(node_id);
        let mesh = node.mesh.map(|m| scene.mesh(m));

        match NodeKind::classify(&node.name) {
            NodeKind::Portal => {
                match mesh.and_then(|m| Portal::from_mesh(node.name.as_str(), id, m, &world)) {
                    Some(portal) => pending.room.portals.push(portal),
                    None => log::warn!(
                        "room {}: portal {} has no geometry, skipped",
                        pending.room.name,
                        node.name
                    ),
                }
            }
            NodeKind::Dummy => {
                let parent = node.parent.map_or(Mat4::IDENTITY, |p| scene.world_matrix(p));
                let t = node.transform;
                pending.room.objects.push(DynamicObject::new(
                    node.name.as_str(),
                    t.position,
                    t.rotation,
                    t.scale,
                    parent,
                ));
            }
            NodeKind::DynMesh => {
                let Some(mesh) = mesh else {
                    log::warn!("room {}: {} has no mesh, skipped", pending.room.name, node.name);
                    return;
                };
                let index = match self.dynmeshes.get_index_of(&mesh.name) {
                    Some(index) => index,
                    None => {
                        let template = DynMesh::new(mesh.name.as_str(), mesh.clone());
                        self.dynmeshes.insert_full(mesh.name.clone(), template).0
                    }
                };
                let parent = node.parent.map_or(Mat4::IDENTITY, |p| scene.world_matrix(p));
                let t = node.transform;
                let mut obj =
                    DynamicObject::new(node.name.as_str(), t.position, t.rotation, t.scale, parent);
                obj.mesh = Some(DynMeshId(index));
                pending.room.objects.push(obj);
                return;
            }
            NodeKind::Collision => {
                if let Some(mesh) = mesh {
                    let world_mesh = mesh.transformed(&world);
                    self.attach_trigger(&node.name, &world_mesh, &mut pending.room);
                    pending.colmeshes.push(world_mesh);
                }
            }
            NodeKind::Mesh => {
                if let Some(mesh) = mesh {
                    let mut world_mesh = mesh.transformed(&world);
                    if let Some(props) = self.objects.get(&node.name) {
                        props.apply(&mut world_mesh.material);
                    }
                    self.attach_trigger(&node.name, &world_mesh, &mut pending.room);
                    pending.room.add_mesh(world_mesh);
                }
            }
        }

        for &child in &node.children {
            self.visit(id, child, pending);
        }
    }

    fn attach_trigger(&self, name: &str, mesh: &Mesh, room: &mut Room) {
        let Some(action) = self.objects.get(name).and_then(|p| p.trigger.as_ref()) else {
            return;
        };
        if !self.actions.contains_key(action) {
            log::warn!("object {name}: trigger references unknown action `{action}`");
            return;
        }
        room.triggers.push(Trigger {
            bounds: mesh.bounds(),
            action: action.clone(),
        });
    }
}

/// Build one room's octree, consuming its dedicated collision meshes
fn build_octree(id: usize, pending: PendingRoom, config: &OctreeConfig) -> Room {
    let PendingRoom { mut room, colmeshes } = pending;
    let tag = id as u32;

    room.octree = if colmeshes.is_empty() {
        log::warn!("room {}: no collision meshes, colliding against render meshes", room.name);
        Octree::from_triangles(room.meshes.iter().flat_map(|m| m.triangles(tag)), config)
    } else {
        Octree::from_triangles(colmeshes.iter().flat_map(|m| m.triangles(tag)), config)
    };

    let stats = room.octree.stats();
    log::debug!(
        "room {}: octree {} nodes, {} leaves, {} triangle refs, depth {}",
        room.name,
        stats.nodes,
        stats.leaves,
        stats.triangles,
        stats.depth
    );
    room
}

/// Parse the action table, dropping unknown kinds
fn load_actions(desc: &LevelDesc) -> IndexMap<String, Action> {
    let defs: IndexMap<String, ActionDef> = parse_table(&desc.actions, "action");
    let mut actions = IndexMap::with_capacity(defs.len());
    for (name, def) in defs {
        match def.kind.parse::<ActionKind>() {
            Ok(kind) => {
                actions.insert(name, Action::new(kind, def.value));
            }
            Err(e) => log::warn!("skipping action `{name}`: {e}"),
        }
    }
    actions
}

/// Dynamic mesh templates declared by the description. Extra scene files
/// are loaded once each.
fn load_dynmeshes(
    desc: &LevelDesc,
    scene: &SceneGraph,
    base_dir: &Path,
) -> IndexMap<String, DynMesh> {
    let defs: IndexMap<String, DynMeshDef> = parse_table(&desc.dynmeshes, "dynamic mesh");
    let mut files: AHashMap<PathBuf, Option<SceneGraph>> = AHashMap::new();
    let mut templates = IndexMap::with_capacity(defs.len());

    for (name, def) in defs {
        let source = match &def.file {
            None => Some(scene),
            Some(file) => {
                let path = base_dir.join(file);
                files
                    .entry(path.clone())
                    .or_insert_with(|| match SceneGraph::load(&path) {
                        Ok(scene) => Some(scene),
                        Err(e) => {
                            log::warn!("dynamic mesh file {}: {e}", path.display());
                            None
                        }
                    })
                    .as_ref()
            }
        };
        let Some(source) = source else {
            log::warn!("skipping dynamic mesh `{name}`: scene file unavailable");
            continue;
        };
        let Some(mesh_id) = source.find_mesh(&def.mesh) else {
            log::warn!("skipping dynamic mesh `{name}`: no mesh named `{}`", def.mesh);
            continue;
        };

        let mut mesh = source.mesh(mesh_id).clone();
        if let Some(material) = &def.material {
            material.apply(&mut mesh.material);
        }
        let mut xform = Mat4::IDENTITY;
        if let Some([x, y, z, deg]) = def.rotate {
            match Vec3::new(x, y, z).try_normalize() {
                Some(axis) => {
                    xform = Mat4::from_quat(Quat::from_axis_angle(axis, deg.to_radians()));
                }
                None => log::warn!("dynamic mesh `{name}`: zero rotation axis ignored"),
            }
        }
        if let Some(scale) = def.scale {
            xform = Mat4::from_scale(scale) * xform;
        }
        if xform != Mat4::IDENTITY {
            mesh.apply_transform(&xform);
        }
        templates.insert(name.clone(), DynMesh::new(name, mesh));
    }
    templates
}

impl Level {
    /// Load a level description file and the scene it references
    pub fn load(path: impl AsRef<Path>) -> LevelResult<Self> {
        let path = path.as_ref();
        let desc = LevelDesc::load(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let scene = SceneGraph::load(base_dir.join(desc.scene()?))?;
        let level = Self::from_scene(&scene, &desc, base_dir)?;
        log::info!(
            "loaded level {}: {} rooms, {} portals, {} triangles, {} enemies",
            path.display(),
            level.rooms.len(),
            level.portals().count(),
            level.triangle_count(),
            level.enemies.len()
        );
        Ok(level)
    }

    /// Build a level from an already loaded scene. Relative paths in the
    /// description resolve against `base_dir`.
    pub fn from_scene(scene: &SceneGraph, desc: &LevelDesc, base_dir: &Path) -> LevelResult<Self> {
        if scene.roots().is_empty() {
            return Err(LevelError::NoRooms);
        }

        let actions = load_actions(desc);
        let objects: IndexMap<String, ObjectProps> = parse_table(&desc.objects, "object");
        let mut dynmeshes = load_dynmeshes(desc, scene, base_dir);

        let pending: Vec<PendingRoom> = {
            let mut builder = RoomBuilder {
                scene,
                objects: &objects,
                actions: &actions,
                dynmeshes: &mut dynmeshes,
            };
            scene
                .roots()
                .iter()
                .enumerate()
                .map(|(i, &root)| builder.build_room(RoomId(i), root))
                .collect()
        };

        let octree_config = desc.config.octree;
        let rooms: Vec<Room> = pending
            .into_par_iter()
            .enumerate()
            .map(|(i, p)| build_octree(i, p, &octree_config))
            .collect();

        let mut level = Level::from_rooms(rooms, desc.config)?;
        level.actions = actions;
        level.dynmeshes = dynmeshes;
        level.start_pos = desc.start_pos;
        level.start_rot = desc.start_rot;
        level.bind_dynobjects(desc);
        level.textures = level.collect_textures(desc.texpath.as_ref().map(|p| base_dir.join(p)));
        level.spawn_enemies(desc.enemies);
        Ok(level)
    }

    /// Attach meshes, rotation and actions to placeholder objects by name
    fn bind_dynobjects(&mut self, desc: &LevelDesc) {
        let defs: IndexMap<String, DynObjectDef> = parse_table(&desc.dynobjects, "dynamic object");
        for (name, def) in defs {
            let mesh = def.mesh.as_deref().and_then(|m| self.lookup_dynmesh(&name, m));
            let colmesh = def.colmesh.as_deref().and_then(|m| self.lookup_dynmesh(&name, m));
            let action = def.action.filter(|a| {
                let known = self.actions.contains_key(a);
                if !known {
                    log::warn!("dynamic object `{name}`: unknown action `{a}`");
                }
                known
            });

            let Some(obj) = self
                .rooms
                .iter_mut()
                .flat_map(|r| r.objects.iter_mut())
                .find(|o| o.name == name)
            else {
                log::warn!("skipping dynamic object `{name}`: no such node");
                continue;
            };
            if mesh.is_some() {
                obj.mesh = mesh;
            }
            obj.colmesh = colmesh;
            if let Some(axis) = def.rotaxis {
                obj.rot_axis = axis;
            }
            obj.rot_speed = def.rotspeed.to_radians();
            obj.action = action;
        }
    }

    fn lookup_dynmesh(&self, object: &str, mesh: &str) -> Option<DynMeshId> {
        let id = self.dynmesh_id(mesh);
        if id.is_none() {
            log::warn!("dynamic object `{object}`: unknown mesh `{mesh}`");
        }
        id
    }

    /// Register every texture referenced by room meshes and templates
    fn collect_textures(&self, search_path: Option<PathBuf>) -> TextureCache {
        let mut cache = TextureCache::new(search_path);
        let materials = self
            .rooms
            .iter()
            .flat_map(|r| r.meshes.iter())
            .chain(self.dynmeshes.values().map(|d| &d.mesh))
            .map(|m| &m.material);
        for material in materials {
            if let Some(texture) = &material.texture {
                cache.get_or_insert(texture);
            }
        }
        cache
    }
}

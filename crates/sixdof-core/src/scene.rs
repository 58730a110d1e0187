//! Scene Graph
//!
//! Hierarchical scene description consumed by the level loader:
//! - Node hierarchy with local transforms
//! - Mesh table referenced by nodes
//! - JSON scene file reader

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::mesh::Mesh;

/// Scene loading errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Node {node} references missing {what} {index}")]
    BadReference {
        node: String,
        what: &'static str,
        index: usize,
    },
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Index of a node in its scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a mesh in its scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// Local transform of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Local position
    pub position: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a new transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Get the local transformation matrix
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scene graph node
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, matched by prefix during level construction
    pub name: String,
    /// Local transform
    pub transform: Transform,
    /// Attached mesh
    pub mesh: Option<MeshId>,
    /// Parent node
    pub parent: Option<NodeId>,
    /// Child nodes
    pub children: SmallVec<[NodeId; 8]>,
}

/// Scene graph: node arena plus the meshes they reference
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    meshes: Vec<Mesh>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON scene file
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let scene = Self::from_json(&text)?;
        log::debug!(
            "loaded scene {}: {} nodes, {} meshes",
            path.display(),
            scene.node_count(),
            scene.meshes.len()
        );
        Ok(scene)
    }

    /// Parse a JSON scene document
    pub fn from_json(text: &str) -> SceneResult<Self> {
        let file: SceneFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    fn from_file(file: SceneFile) -> SceneResult<Self> {
        let mut scene = SceneGraph::new();
        for mesh in file.meshes {
            scene.add_mesh(mesh);
        }

        let count = file.nodes.len();
        for desc in &file.nodes {
            if let Some(index) = desc.mesh.filter(|&m| m >= scene.meshes.len()) {
                return Err(SceneError::BadReference {
                    node: desc.name.clone(),
                    what: "mesh",
                    index,
                });
            }
            scene.add_node(desc.name.clone(), desc.transform, desc.mesh.map(MeshId));
        }

        for (i, desc) in file.nodes.iter().enumerate() {
            if let Some(parent) = desc.parent {
                if parent >= count || parent == i {
                    return Err(SceneError::BadReference {
                        node: desc.name.clone(),
                        what: "parent",
                        index: parent,
                    });
                }
                scene.set_parent(NodeId(i), Some(NodeId(parent)));
            }
        }

        // a parent chain longer than the node count has a cycle
        for (i, desc) in file.nodes.iter().enumerate() {
            let mut cursor = scene.nodes[i].parent;
            let mut steps = 0;
            while let Some(parent) = cursor {
                steps += 1;
                if steps > count {
                    return Err(SceneError::BadReference {
                        node: desc.name.clone(),
                        what: "parent",
                        index: parent.0,
                    });
                }
                cursor = scene.nodes[parent.0].parent;
            }
        }
        Ok(scene)
    }

    /// Add a mesh to the scene
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Add a new root node to the scene
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        mesh: Option<MeshId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            transform,
            mesh,
            parent: None,
            children: SmallVec::new(),
        });
        self.roots.push(id);
        id
    }

    /// Set the parent of a node
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|c| *c != child);
        }

        match parent {
            Some(parent) => {
                let children = &mut self.nodes[parent.0].children;
                if !children.contains(&child) {
                    children.push(child);
                }
                self.roots.retain(|&e| e != child);
            }
            None => {
                if !self.roots.contains(&child) {
                    self.roots.push(child);
                }
            }
        }
        self.nodes[child.0].parent = parent;
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    /// Get a mesh
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    /// All meshes
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Get root nodes
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Full world matrix of a node (parent chain applied)
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        let local = node.transform.local_matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// Find a node by exact name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Find a mesh by exact name
    pub fn find_mesh(&self, name: &str) -> Option<MeshId> {
        self.meshes.iter().position(|m| m.name == name).map(MeshId)
    }

    /// Get the number of nodes in the scene
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default)]
    nodes: Vec<NodeDesc>,
}

#[derive(Debug, Deserialize)]
struct NodeDesc {
    name: String,
    #[serde(default)]
    parent: Option<usize>,
    #[serde(default)]
    mesh: Option<usize>,
    #[serde(flatten)]
    transform: Transform,
}

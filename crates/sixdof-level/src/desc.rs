//! Level description documents
//!
//! The description is a JSON object naming the scene file plus optional
//! entity tables. Tables are kept as raw JSON until the loader asks for
//! them, so one malformed entry is skipped instead of failing the load.

use std::path::Path;

use glam::{Quat, Vec2, Vec3};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sixdof_core::Material;

use crate::config::LevelConfig;
use crate::error::{LevelError, LevelResult};

/// Raw level description
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LevelDesc {
    /// Scene file, relative to the description file
    pub scene: Option<String>,
    /// Texture search path, relative to the description file
    pub texpath: Option<String>,
    pub start_pos: Vec3,
    /// Start orientation as an `[x, y, z, w]` quaternion
    pub start_rot: Quat,
    /// Number of enemies to spawn
    pub enemies: usize,
    pub config: LevelConfig,
    pub actions: IndexMap<String, Value>,
    pub objects: IndexMap<String, Value>,
    pub dynmeshes: IndexMap<String, Value>,
    pub dynobjects: IndexMap<String, Value>,
}

impl LevelDesc {
    /// Read a description file
    pub fn load(path: impl AsRef<Path>) -> LevelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse a description document
    pub fn from_json(text: &str) -> LevelResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Scene file reference, the one required key
    pub fn scene(&self) -> LevelResult<&str> {
        self.scene.as_deref().ok_or(LevelError::MissingKey("scene"))
    }
}

/// `actions` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: f32,
}

/// `objects` entry: overrides for the scene node of the same name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectProps {
    /// Texture coordinate scroll speed
    pub uvanim: Option<Vec2>,
    pub uvoffs: Option<Vec2>,
    pub emissive: Option<bool>,
    /// Action fired inside the node's world bounds
    pub trigger: Option<String>,
}

impl ObjectProps {
    /// Apply the material overrides
    pub fn apply(&self, material: &mut Material) {
        if let Some(v) = self.uvanim {
            material.uv_velocity = v;
        }
        if let Some(v) = self.uvoffs {
            material.uv_offset = v;
        }
        if let Some(e) = self.emissive {
            material.emissive = e;
        }
    }
}

/// Material overrides for a dynamic mesh template
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaterialOverride {
    pub diffuse: Option<Vec3>,
    pub texture: Option<String>,
    pub emissive: Option<bool>,
    pub uvanim: Option<Vec2>,
    pub uvoffs: Option<Vec2>,
}

impl MaterialOverride {
    pub fn apply(&self, material: &mut Material) {
        if let Some(d) = self.diffuse {
            material.diffuse = d;
        }
        if let Some(t) = &self.texture {
            material.texture = Some(t.clone());
        }
        if let Some(e) = self.emissive {
            material.emissive = e;
        }
        if let Some(v) = self.uvanim {
            material.uv_velocity = v;
        }
        if let Some(v) = self.uvoffs {
            material.uv_offset = v;
        }
    }
}

/// `dynmeshes` entry
#[derive(Debug, Clone, Deserialize)]
pub struct DynMeshDef {
    /// Scene file holding the mesh; the level scene when absent
    #[serde(default)]
    pub file: Option<String>,
    /// Mesh name inside the scene
    pub mesh: String,
    #[serde(default)]
    pub material: Option<MaterialOverride>,
    /// Axis and angle in degrees baked into the vertices
    #[serde(default)]
    pub rotate: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<Vec3>,
}

/// `dynobjects` entry, keyed by the placeholder node name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DynObjectDef {
    /// Dynamic mesh template name
    pub mesh: Option<String>,
    pub colmesh: Option<String>,
    pub rotaxis: Option<Vec3>,
    /// Degrees per second
    pub rotspeed: f32,
    pub action: Option<String>,
}

/// Deserialize every entry of a table, warning about and dropping the
/// ones that do not fit `T`
pub fn parse_table<T: DeserializeOwned>(
    table: &IndexMap<String, Value>,
    what: &str,
) -> IndexMap<String, T> {
    let mut out = IndexMap::with_capacity(table.len());
    for (name, value) in table {
        match T::deserialize(value) {
            Ok(entry) => {
                out.insert(name.clone(), entry);
            }
            Err(e) => log::warn!("skipping {what} `{name}`: {e}"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_description() {
        let desc = LevelDesc::from_json(r#"{ "scene": "level.json" }"#).unwrap();
        assert_eq!(desc.scene().unwrap(), "level.json");
        assert_eq!(desc.start_rot, Quat::IDENTITY);
        assert_eq!(desc.enemies, 0);
        assert!(desc.actions.is_empty());
    }

    #[test]
    fn test_missing_scene() {
        let desc = LevelDesc::from_json(r#"{ "enemies": 3 }"#).unwrap();
        assert!(matches!(desc.scene(), Err(LevelError::MissingKey("scene"))));
    }

    #[test]
    fn test_parse_table_skips_bad_entries() {
        let desc = LevelDesc::from_json(
            r#"{
                "scene": "s.json",
                "actions": {
                    "lava": { "type": "damage", "value": 5 },
                    "broken": { "value": 1 },
                    "exit": { "type": "win" }
                }
            }"#,
        )
        .unwrap();
        let actions: IndexMap<String, ActionDef> = parse_table(&desc.actions, "action");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions["lava"].value, 5.0);
        assert_eq!(actions["exit"].value, 0.0);
        assert_eq!(actions.get_index(1).unwrap().0, "exit");
    }

    #[test]
    fn test_object_props_apply() {
        let value = serde_json::json!({ "uvanim": [0.5, 0], "emissive": true });
        let props: ObjectProps = serde_json::from_value(value).unwrap();
        let mut material = Material::default();
        props.apply(&mut material);
        assert_eq!(material.uv_velocity, Vec2::new(0.5, 0.0));
        assert!(material.emissive);
        assert_eq!(material.uv_offset, Vec2::ZERO);
    }

    #[test]
    fn test_dynmesh_def() {
        let def: DynMeshDef = serde_json::from_value(serde_json::json!({
            "file": "props.json",
            "mesh": "fan",
            "rotate": [0, 1, 0, 90],
            "material": { "texture": "fan.png" }
        }))
        .unwrap();
        assert_eq!(def.mesh, "fan");
        assert_eq!(def.rotate, Some([0.0, 1.0, 0.0, 90.0]));
        assert!(def.scale.is_none());

        let mut material = Material::default();
        def.material.unwrap().apply(&mut material);
        assert_eq!(material.texture.as_deref(), Some("fan.png"));
    }
}

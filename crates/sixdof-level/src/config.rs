//! Level tunables
//!
//! Every field has a default; a level description may override any subset
//! under its `config` key.

use serde::{Deserialize, Serialize};
use sixdof_physics::OctreeConfig;

/// Portal traversal limits for collision and hit-scan queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Size of the visited-room stack: the most rooms one query will test
    pub max_depth: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_depth: 2 }
    }
}

/// Enemy spawn parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Hit sphere radius
    pub radius: f32,
    /// Starting hit points
    pub hp: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            hp: 100.0,
        }
    }
}

/// Level configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Per-room collision octree limits
    pub octree: OctreeConfig,
    /// Collision query limits
    pub query: QueryConfig,
    /// Enemy defaults
    pub enemy: EnemyConfig,
}

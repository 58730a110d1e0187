//! # Sixdof Level
//!
//! Room and portal level graph for the sixdof shooter.
//!
//! ## Features
//! - Level loading from a JSON description plus a scene file
//! - Rooms with render meshes, a collision octree, portals, triggers,
//!   dynamic objects, enemies and missiles
//! - Ray, sphere and enemy hit-scan queries that fall through portals
//! - Portal-reduced frustum visibility and a depth-first render walk

pub mod action;
pub mod collision;
pub mod config;
pub mod desc;
pub mod enemy;
pub mod error;
pub mod level;
pub mod loader;
pub mod object;
pub mod portal;
pub mod room;
pub mod texture;
pub mod visibility;

pub use action::{Action, ActionKind};
pub use collision::{CollisionHit, EnemyHit, RoomPath};
pub use config::{EnemyConfig, LevelConfig, QueryConfig};
pub use desc::LevelDesc;
pub use enemy::{Enemy, EnemyId, Missile, MissileOwner};
pub use error::{LevelError, LevelResult};
pub use level::{Level, MissileEvent};
pub use loader::NodeKind;
pub use object::{DynMesh, DynMeshId, DynamicObject};
pub use portal::{Portal, PortalId};
pub use room::{Room, RoomId, Trigger, MAX_ROOM_MISSILES};
pub use texture::{TextureCache, TextureId};
pub use visibility::{reduce_frustum, RenderSink, Visibility};

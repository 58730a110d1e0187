//! # Sixdof Core
//!
//! Foundation types for the sixdof level engine.
//!
//! This crate provides:
//! - **Math**: bounding boxes and spheres, planes, frusta and ray segments on top of glam
//! - **Geometry**: triangles and the closest-point / intersection / separating-axis tests
//! - **Mesh**: read-only mesh and material snapshots
//! - **Scene Graph**: the node hierarchy the level loader walks, with a JSON reader

pub mod geom;
pub mod math;
pub mod mesh;
pub mod scene;

pub use geom::{aabox_tri_test, RayHit, SphereHit, Triangle};
pub use math::{Aabb, BoundingSphere, Frustum, Plane, Ray, EPSILON};
pub use mesh::{Material, Mesh};
pub use scene::{MeshId, NodeId, SceneError, SceneGraph, SceneNode, SceneResult, Transform};

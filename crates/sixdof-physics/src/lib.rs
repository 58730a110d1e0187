//! # Sixdof Physics
//!
//! Spatial queries for static level geometry.
//!
//! ## Features
//! - Octree over triangle soups with duplicate-on-straddle subdivision
//! - Nearest-hit ray segment queries
//! - Nearest-triangle sphere queries

pub mod octree;

pub use octree::{Octree, OctreeConfig, OctreeStats};

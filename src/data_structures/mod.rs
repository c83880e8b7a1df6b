//! Engine data structures: models, textures, the part tree, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains vertex layouts, uploaded meshes and GPU materials
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `scene_graph` builds bodies out of named, nested parts

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;

//! carrot-orbit
//!
//! A low-poly carrot ship flown by a rabbit pilot, circling a textured planet
//! with its moon while paper clouds drift past. The same crate runs as a
//! native window or inside a browser canvas; the scene advances on a fixed
//! 60 Hz clock so both look the same regardless of frame rate.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `config`: scene-wide tunables and colour helpers
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `data_structures`: engine data models (meshes, instances, the part tree)
//! - `flow`: the event loop, asset loading and per-frame driving
//! - `pipelines`: the lit scene pipeline and its light/fog uniforms
//! - `resources`: texture cache, materials, procedural meshes and the label font
//! - `render`: instance batching and draw submission
//! - `scene`: the animated bodies and the director that steps them
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
#[cfg(target_arch = "wasm32")]
mod web;

pub use config::SceneConfig;

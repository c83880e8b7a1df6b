//! Render pipelines.
//!
//! - `basic` builds the scene pipeline and the shared pipeline boilerplate
//! - `light` holds the light and fog uniform bound next to the camera

pub mod basic;
pub mod light;

//! The animated scene.
//!
//! - `orbit` holds the circular motion shared by the carrot and the orbiting planet
//! - `carrot`, `pilot`, `planet` and `cloud` are the animated bodies
//! - `label` is the floating text that follows the orbiting planet
//! - `director` owns all of them and runs the fixed-step clock

pub mod carrot;
pub mod cloud;
pub mod director;
pub mod label;
pub mod orbit;
pub mod pilot;
pub mod planet;

use crate::data_structures::scene_graph::DrawItem;

/// A tree of rigid parts that moves once per fixed step.
///
/// A body's transforms depend only on how many steps it has taken and its construction
/// parameters (plus, for the pilot, the blink signals it was given).
pub trait AnimatedBody {
    fn step(&mut self);

    /// Appends one draw item per visible part at its current world transform.
    fn collect_draws(&self, out: &mut Vec<DrawItem>);
}

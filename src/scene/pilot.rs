//! The rabbit pilot: wiggling ears and blinking eyes.

use std::f32::consts::PI;

use crate::{
    data_structures::{
        instance::Instance,
        scene_graph::{DrawItem, Part},
    },
    resources::{material::MaterialKey, mesh::MeshKey},
    scene::AnimatedBody,
};

const EAR_CLOCK_STEP: f32 = 0.1;
const BLINK_CLOCK_STEP: f32 = 0.02;
const LEFT_EAR_PITCH: f32 = -PI / 2.25;
const RIGHT_EAR_PITCH: f32 = -PI / 3.0;
const EAR_SWING: f32 = 0.1;

const EYES: [&str; 2] = ["eye_left", "eye_right"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlinkState {
    Idle,
    Blinking { clock: f32 },
}

/// Eye height while blinking; sweeps smoothly between 0.2 and 1.0.
pub fn blink_scale(clock: f32) -> f32 {
    (clock.sin() + 1.0) * 0.4 + 0.2
}

/// Names of the parts one ear is made of.
struct EarNames {
    pivot: &'static str,
    ear: &'static str,
    inside: &'static str,
}

/// Builds an ear hanging off its pivot. `mirror` flips the side (1 for left, -1 for right).
fn ear(names: EarNames, pitch: f32, mirror: f32) -> Part {
    Part::group(names.pivot)
        .at(0.0, 2.5, 0.0)
        .rotated(pitch, 0.0, 0.0)
        .with_child(
            Part::mesh(names.ear, MeshKey::Ear, MaterialKey::Rabbit)
                .at(-1.5 * mirror, 2.5, 0.0)
                .with_child(
                    Part::mesh(names.inside, MeshKey::Ear, MaterialKey::Pink)
                        .at(0.0, 0.0, 0.25)
                        .scaled(0.5, 0.7, 0.5),
                ),
        )
}

fn eye(name: &'static str, mirror: f32) -> Part {
    Part::mesh(name, MeshKey::Eye, MaterialKey::Gray).at(mirror, 0.5, 2.5)
}

#[derive(Clone, Debug)]
pub struct Pilot {
    root: Part,
    ear_time: f32,
    blink: BlinkState,
}

impl Pilot {
    pub fn new() -> Self {
        let body = Part::mesh("pilot_body", MeshKey::PilotBody, MaterialKey::Rabbit)
            .at(0.0, 1.0, 4.0)
            .with_children([
                Part::mesh("seat", MeshKey::Seat, MaterialKey::Brown)
                    .at(0.0, -2.5, 0.0)
                    .rotated(0.25, 0.0, 0.0),
                ear(
                    EarNames {
                        pivot: "ear_pivot_left",
                        ear: "ear_left",
                        inside: "ear_inside_left",
                    },
                    LEFT_EAR_PITCH,
                    1.0,
                ),
                ear(
                    EarNames {
                        pivot: "ear_pivot_right",
                        ear: "ear_right",
                        inside: "ear_inside_right",
                    },
                    RIGHT_EAR_PITCH,
                    -1.0,
                ),
                eye(EYES[0], 1.0),
                eye(EYES[1], -1.0),
                Part::mesh("nose", MeshKey::Nose, MaterialKey::Pink).at(0.0, -0.5, 2.5),
                Part::mesh("mouth", MeshKey::Mouth, MaterialKey::Gray).at(0.0, -1.5, 2.5),
            ]);
        let root = Part::group("pilot")
            .at(0.0, 7.0, 5.0)
            .rotated(1.5, 0.0, 0.0)
            .with_child(body);
        Self {
            root,
            ear_time: 0.0,
            blink: BlinkState::Idle,
        }
    }

    pub fn root(&self) -> &Part {
        &self.root
    }

    pub fn ear_time(&self) -> f32 {
        self.ear_time
    }

    pub fn blink_state(&self) -> BlinkState {
        self.blink
    }

    /// Current y-scale of both eyes.
    pub fn eye_scale(&self) -> f32 {
        self.root.find(EYES[0]).map(|eye| eye.scale.y).unwrap_or(1.0)
    }

    pub fn ear_pitches(&self) -> (f32, f32) {
        let pitch = |name| self.root.find(name).map(|p| p.euler.x).unwrap_or_default();
        (pitch("ear_pivot_left"), pitch("ear_pivot_right"))
    }

    /// Starts (or restarts) blinking from the beginning of the cycle.
    pub fn start_blinking(&mut self) {
        self.blink = BlinkState::Blinking { clock: 0.0 };
    }

    /// Stops blinking and opens the eyes fully.
    pub fn stop_blinking(&mut self) {
        self.blink = BlinkState::Idle;
        self.set_eye_scale(1.0);
    }

    fn set_eye_scale(&mut self, scale: f32) {
        for name in EYES {
            self.root.update(name, |eye| eye.scale.y = scale);
        }
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimatedBody for Pilot {
    fn step(&mut self) {
        self.ear_time += EAR_CLOCK_STEP;
        let t = self.ear_time;
        self.root.update("ear_pivot_left", |pivot| {
            pivot.euler.x = LEFT_EAR_PITCH + t.sin() * EAR_SWING
        });
        self.root.update("ear_pivot_right", |pivot| {
            pivot.euler.x = RIGHT_EAR_PITCH + (t + 1.0).sin() * EAR_SWING
        });

        if let BlinkState::Blinking { clock } = self.blink {
            let clock = clock + BLINK_CLOCK_STEP;
            self.blink = BlinkState::Blinking { clock };
            self.set_eye_scale(blink_scale(clock));
        }
    }

    fn collect_draws(&self, out: &mut Vec<DrawItem>) {
        self.root.collect_draws(&Instance::new(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ears_swing_around_their_rest_pitch() {
        let mut pilot = Pilot::new();
        for _ in 0..10 {
            pilot.step();
        }
        assert!((pilot.ear_time() - 1.0).abs() < 1e-5);
        let (left, right) = pilot.ear_pitches();
        assert!((left - (LEFT_EAR_PITCH + 1.0f32.sin() * 0.1)).abs() < 1e-5);
        assert!((right - (RIGHT_EAR_PITCH + 2.0f32.sin() * 0.1)).abs() < 1e-5);
    }

    #[test]
    fn right_ear_is_the_mirror_of_the_left() {
        let pilot = Pilot::new();
        let left = pilot.root().find("ear_left").unwrap();
        let right = pilot.root().find("ear_right").unwrap();
        assert_eq!(left.position.x, -1.5);
        assert_eq!(right.position.x, 1.5);
        assert_eq!(left.children.len(), right.children.len());
    }

    #[test]
    fn blinking_sweeps_between_a_fifth_and_fully_open() {
        let mut pilot = Pilot::new();
        pilot.start_blinking();
        pilot.step();
        assert!((pilot.eye_scale() - blink_scale(0.02)).abs() < 1e-6);
        for _ in 0..2000 {
            pilot.step();
            let scale = pilot.eye_scale();
            assert!((0.2..=1.0).contains(&scale), "{}", scale);
        }
    }

    #[test]
    fn stopping_snaps_the_eyes_open_and_resets_the_clock() {
        let mut pilot = Pilot::new();
        pilot.start_blinking();
        for _ in 0..50 {
            pilot.step();
        }
        pilot.stop_blinking();
        assert_eq!(pilot.eye_scale(), 1.0);
        assert_eq!(pilot.blink_state(), BlinkState::Idle);
        pilot.step();
        assert_eq!(pilot.eye_scale(), 1.0);

        pilot.start_blinking();
        assert_eq!(pilot.blink_state(), BlinkState::Blinking { clock: 0.0 });
    }

    #[test]
    fn restarting_while_blinking_restarts_the_cycle() {
        let mut pilot = Pilot::new();
        pilot.start_blinking();
        for _ in 0..30 {
            pilot.step();
        }
        pilot.start_blinking();
        pilot.step();
        assert_eq!(pilot.blink_state(), BlinkState::Blinking { clock: 0.02 });
    }

    #[test]
    fn draws_every_visible_part() {
        let mut out = Vec::new();
        Pilot::new().collect_draws(&mut out);
        // body, seat, 2 ears, 2 ear insides, 2 eyes, nose, mouth
        assert_eq!(out.len(), 10);
        assert_eq!(
            out.iter().filter(|d| d.mesh == MeshKey::Ear).count(),
            4
        );
    }
}

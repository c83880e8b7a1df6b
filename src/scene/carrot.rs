//! The flying carrot and its rabbit pilot.

use std::f32::consts::PI;

use cgmath::Vector3;

use crate::{
    data_structures::{
        instance::Instance,
        scene_graph::{DrawItem, Part},
    },
    resources::{material::MaterialKey, mesh::MeshKey},
    scene::{
        AnimatedBody,
        orbit::{OrbitState, float_offset},
        pilot::Pilot,
    },
};

const TIME_STEP: f32 = 0.016;
const BASE_PITCH: f32 = -1.7;
const LEAF_SPIN: f32 = 10.0;

/// The orbit the carrot flies: radius 60 around the planet, 20 units above its centre.
pub fn default_orbit() -> OrbitState {
    OrbitState::new(Vector3::new(0.0, -50.0, -20.0), 60.0, 0.01, 20.0)
}

#[derive(Clone, Debug)]
pub struct Carrot {
    body: Part,
    pilot: Pilot,
    orbit: OrbitState,
    time: f32,
}

impl Carrot {
    pub fn new(orbit: OrbitState) -> Self {
        let leaf = |name| Part::mesh(name, MeshKey::Leaf, MaterialKey::Green);
        let body = Part::group("carrot").with_children([
            Part::mesh("carrot_body", MeshKey::CarrotBody, MaterialKey::Orange),
            Part::mesh("wing_right", MeshKey::Wing, MaterialKey::Brown).at(6.0, 2.0, 1.0),
            Part::mesh("wing_left", MeshKey::Wing, MaterialKey::Brown)
                .at(-6.0, 2.0, 1.0)
                .rotated(0.0, PI, 0.0),
            Part::group("leaves").with_children([
                leaf("leaf_a").at(0.0, 16.0, 0.0),
                leaf("leaf_b").at(-1.75, 15.0, 0.0).rotated(0.0, 0.0, 0.4),
                leaf("leaf_c").at(1.75, 15.0, 0.0).rotated(0.0, 0.0, -0.4),
            ]),
        ]);
        let mut carrot = Self {
            body,
            pilot: Pilot::new(),
            orbit,
            time: 0.0,
        };
        carrot.pose();
        carrot
    }

    pub fn pilot(&self) -> &Pilot {
        &self.pilot
    }

    pub fn pilot_mut(&mut self) -> &mut Pilot {
        &mut self.pilot
    }

    pub fn orbit(&self) -> &OrbitState {
        &self.orbit
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn position(&self) -> Vector3<f32> {
        self.body.position
    }

    pub fn leaf_spin(&self) -> f32 {
        self.body.find("leaves").map(|l| l.euler.y).unwrap_or_default()
    }

    /// Derives the body's transform from the orbit and the clock.
    fn pose(&mut self) {
        let t = self.time;
        self.body.position = self.orbit.position() + float_offset(t);
        self.body.euler = Vector3::new(
            BASE_PITCH + t.sin() * 0.1,
            self.orbit.heading(),
            self.orbit.bank(),
        );
        self.body.update("leaves", |leaves| leaves.euler.y = t * LEAF_SPIN);
    }
}

impl Default for Carrot {
    fn default() -> Self {
        Self::new(default_orbit())
    }
}

impl AnimatedBody for Carrot {
    fn step(&mut self) {
        self.time += TIME_STEP;
        self.orbit.advance();
        self.pose();
        self.pilot.step();
    }

    fn collect_draws(&self, out: &mut Vec<DrawItem>) {
        let root = Instance::new();
        self.body.collect_draws(&root, out);
        // The pilot rides along in the carrot's frame
        self.pilot
            .root()
            .collect_draws(&(&root * &self.body.local_transform()), out);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn starts_on_its_orbit() {
        let carrot = Carrot::default();
        assert!((carrot.position() - Vector3::new(60.0, -30.0, -20.0)).magnitude() < 1e-5);
        assert_eq!(carrot.leaf_spin(), 0.0);
    }

    #[test]
    fn flies_and_spins_its_leaves() {
        let mut carrot = Carrot::default();
        for _ in 0..100 {
            carrot.step();
        }
        let t = carrot.time();
        assert!((t - 1.6).abs() < 1e-4);
        assert!((carrot.orbit().angle - 1.0).abs() < 1e-4);
        let expected = Vector3::new(1.0f32.cos() * 60.0, -30.0, -20.0 + 1.0f32.sin() * 60.0)
            + float_offset(t);
        assert!((carrot.position() - expected).magnitude() < 1e-3);
        assert!((carrot.leaf_spin() - 16.0).abs() < 1e-3);
        assert!((carrot.pilot().ear_time() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn same_steps_same_pose() {
        let mut a = Carrot::default();
        let mut b = Carrot::default();
        for _ in 0..37 {
            a.step();
            b.step();
        }
        let (mut da, mut db) = (Vec::new(), Vec::new());
        a.collect_draws(&mut da);
        b.collect_draws(&mut db);
        assert_eq!(da, db);
    }

    #[test]
    fn pilot_rides_with_the_carrot() {
        let mut carrot = Carrot::default();
        let mut before = Vec::new();
        carrot.collect_draws(&mut before);
        for _ in 0..50 {
            carrot.step();
        }
        let mut after = Vec::new();
        carrot.collect_draws(&mut after);

        let seat = |draws: &[DrawItem]| {
            draws
                .iter()
                .find(|d| d.mesh == MeshKey::Seat)
                .map(|d| d.transform.position)
                .unwrap()
        };
        let moved = carrot.position() - Vector3::new(60.0, -30.0, -20.0);
        assert!(moved.magnitude() > 1.0);
        // body, 2 wings, 3 leaves and the 10 pilot parts
        assert_eq!(after.len(), 16);
        // The seat stays close to the carrot wherever it flies
        assert!((seat(&after) - carrot.position()).magnitude() < 15.0);
        assert!((seat(&before) - Vector3::new(60.0, -30.0, -20.0)).magnitude() < 15.0);
    }
}

//! Planets: the large central one and the small one circling it.

use cgmath::Vector3;

use crate::{
    data_structures::{
        instance::Instance,
        scene_graph::{DrawItem, Part},
    },
    resources::{material::MaterialKey, mesh::MeshKey},
    scene::{
        AnimatedBody,
        orbit::{OrbitState, wrap_angle},
    },
};

/// Self spin per step about x and y.
pub const DEFAULT_SPIN: (f32, f32) = (0.001, 0.002);

pub fn central_position() -> Vector3<f32> {
    Vector3::new(0.0, -50.0, -20.0)
}

/// The moon's path: radius 80 around the central planet, 10 units up.
pub fn default_orbit() -> OrbitState {
    OrbitState::new(central_position(), 80.0, 0.01, 10.0)
}

#[derive(Clone, Debug)]
pub struct Planet {
    sphere: Part,
    spin: (f32, f32),
    orbit: Option<OrbitState>,
}

impl Planet {
    /// A planet that stays at `position` and only spins.
    pub fn central(position: Vector3<f32>) -> Self {
        Self {
            sphere: Part::mesh("planet", MeshKey::Planet, MaterialKey::Grass)
                .at(position.x, position.y, position.z),
            spin: DEFAULT_SPIN,
            orbit: None,
        }
    }

    /// A planet that follows `orbit` and spins along the way.
    pub fn orbiting(orbit: OrbitState) -> Self {
        let start = orbit.position();
        Self {
            sphere: Part::mesh("moon", MeshKey::Moon, MaterialKey::Metal)
                .at(start.x, start.y, start.z),
            spin: DEFAULT_SPIN,
            orbit: Some(orbit),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.sphere.position
    }

    pub fn rotation(&self) -> Vector3<f32> {
        self.sphere.euler
    }

    pub fn orbit(&self) -> Option<&OrbitState> {
        self.orbit.as_ref()
    }
}

impl AnimatedBody for Planet {
    fn step(&mut self) {
        self.sphere.euler.x = wrap_angle(self.sphere.euler.x + self.spin.0);
        self.sphere.euler.y = wrap_angle(self.sphere.euler.y + self.spin.1);
        if let Some(orbit) = &mut self.orbit {
            orbit.advance();
            self.sphere.position = orbit.position();
        }
    }

    fn collect_draws(&self, out: &mut Vec<DrawItem>) {
        self.sphere.collect_draws(&Instance::new(), out);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn central_planet_spins_in_place() {
        let mut planet = Planet::central(central_position());
        for _ in 0..500 {
            planet.step();
        }
        assert_eq!(planet.position(), central_position());
        assert!((planet.rotation().x - 0.5).abs() < 1e-4);
        assert!((planet.rotation().y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn spin_angles_stay_within_one_turn() {
        let mut planet = Planet::central(central_position());
        // 0.002 per step passes a full turn on y after about 3142 steps
        for _ in 0..4000 {
            planet.step();
        }
        let rotation = planet.rotation();
        assert!((0.0..std::f32::consts::TAU).contains(&rotation.y));
        assert!((rotation.y - (8.0 - std::f32::consts::TAU)).abs() < 1e-2);
        assert!((rotation.x - 4.0).abs() < 1e-2);
    }

    #[test]
    fn moon_keeps_its_distance() {
        let mut moon = Planet::orbiting(default_orbit());
        assert!((moon.position() - Vector3::new(80.0, -40.0, -20.0)).magnitude() < 1e-5);
        for _ in 0..300 {
            moon.step();
            let offset = moon.position() - central_position();
            assert!((offset.y - 10.0).abs() < 1e-4);
            let flat = Vector3::new(offset.x, 0.0, offset.z);
            assert!((flat.magnitude() - 80.0).abs() < 1e-3);
        }
        assert!((moon.orbit().unwrap().angle - 3.0).abs() < 1e-3);
    }

    #[test]
    fn draws_one_sphere() {
        let mut out = Vec::new();
        Planet::orbiting(default_orbit()).collect_draws(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mesh, MeshKey::Moon);
        assert_eq!(out[0].material, MaterialKey::Metal);
    }
}

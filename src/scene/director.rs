//! Owns every body of the scene and drives them with a fixed-step clock.

use std::{collections::BTreeMap, f32::consts::FRAC_PI_2};

use cgmath::Vector3;

use crate::{
    config::{STEP_SECONDS, SceneConfig},
    data_structures::{
        instance::Instance,
        scene_graph::{DrawItem, Part},
    },
    resources::{
        material::{MaterialDescriptor, MaterialKey},
        mesh::MeshKey,
        texture::TextureSet,
    },
    scene::{
        AnimatedBody,
        carrot::{self, Carrot},
        cloud::{self, Cloud},
        label::FloatingLabel,
        planet::{self, Planet},
    },
};

/// Height-map displacement of the grass planet, in world units.
const PLANET_DISPLACEMENT: f32 = 3.0;
/// The moon is small, so its surface only gets a light relief.
const MOON_DISPLACEMENT: f32 = 0.5;
const FLOOR_HEIGHT: f32 = -100.0;

#[derive(Debug)]
pub struct SceneDirector {
    carrot: Carrot,
    planet: Planet,
    moon: Planet,
    clouds: Vec<Cloud>,
    floor: Part,
    label: FloatingLabel,
    materials: BTreeMap<MaterialKey, MaterialDescriptor>,
    accumulator: f32,
    max_steps: u32,
    eye: Vector3<f32>,
    steps: u64,
}

impl SceneDirector {
    /// Builds the bodies and the material table. Textures come from the preloaded set only;
    /// maps that failed to load are simply absent.
    pub fn new(config: &SceneConfig, textures: &TextureSet) -> Self {
        let mut materials: BTreeMap<_, _> = MaterialKey::PALETTE
            .iter()
            .filter_map(|&key| key.palette().map(|m| (key, m)))
            .collect();
        materials.insert(
            MaterialKey::Grass,
            textures.material(&config.planet_material, PLANET_DISPLACEMENT, true),
        );
        materials.insert(
            MaterialKey::Metal,
            textures.material(&config.moon_material, MOON_DISPLACEMENT, true),
        );
        // Paper is never metallic, even when the metallic map falls back to its stand-in
        materials.insert(
            MaterialKey::Cloud,
            textures
                .material(&config.cloud_material, 0.0, true)
                .with_factors(1.0, 0.0),
        );
        materials.insert(
            MaterialKey::Floor,
            MaterialDescriptor::solid(config.floor_colour, false).unlit(),
        );

        let mut label = FloatingLabel::new();
        let moon = Planet::orbiting(planet::default_orbit());
        let eye = Vector3::new(config.camera_eye.x, config.camera_eye.y, config.camera_eye.z);
        label.track(moon.position(), eye);

        Self {
            carrot: Carrot::new(carrot::default_orbit()),
            planet: Planet::central(planet::central_position()),
            moon,
            clouds: cloud::default_clouds().into_iter().map(Cloud::new).collect(),
            floor: Part::mesh("floor", MeshKey::Floor, MaterialKey::Floor)
                .at(0.0, FLOOR_HEIGHT, 0.0)
                .rotated(-FRAC_PI_2, 0.0, 0.0),
            label,
            materials,
            accumulator: 0.0,
            max_steps: config.max_steps_per_frame,
            eye,
            steps: 0,
        }
    }

    /// Feeds `dt` seconds of real time into the clock and runs every whole step it covers.
    ///
    /// At most `max_steps_per_frame` steps run per call; time beyond that is dropped so a
    /// long stall does not have to be caught up. Returns the number of steps taken.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut taken = 0;
        while self.accumulator >= STEP_SECONDS && taken < self.max_steps {
            self.accumulator -= STEP_SECONDS;
            self.step();
            taken += 1;
        }
        if taken == self.max_steps && self.accumulator >= STEP_SECONDS {
            log::debug!("dropping {:.3}s of animation time", self.accumulator);
            self.accumulator %= STEP_SECONDS;
        }
        taken
    }

    /// One update per body, then the label follows the moon.
    pub fn step(&mut self) {
        self.planet.step();
        self.moon.step();
        self.carrot.step();
        for cloud in &mut self.clouds {
            cloud.step();
        }
        self.label.track(self.moon.position(), self.eye);
        self.steps += 1;
    }

    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut out = Vec::new();
        self.floor.collect_draws(&Instance::new(), &mut out);
        self.planet.collect_draws(&mut out);
        self.moon.collect_draws(&mut out);
        self.carrot.collect_draws(&mut out);
        for cloud in &self.clouds {
            cloud.collect_draws(&mut out);
        }
        out.extend(self.label.draw_item());
        out
    }

    /// Mouse press starts the pilot's blink, release stops it.
    pub fn set_blinking(&mut self, blinking: bool) {
        let pilot = self.carrot.pilot_mut();
        if blinking {
            pilot.start_blinking();
        } else {
            pilot.stop_blinking();
        }
    }

    pub fn submit_text(&mut self, text: &str) -> bool {
        self.label.submit(text)
    }

    pub fn label(&self) -> &FloatingLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut FloatingLabel {
        &mut self.label
    }

    /// The label turns toward this point; the camera reports its eye here when it moves.
    pub fn set_camera_eye(&mut self, eye: Vector3<f32>) {
        self.eye = eye;
        self.label.track(self.moon.position(), eye);
    }

    pub fn materials(&self) -> &BTreeMap<MaterialKey, MaterialDescriptor> {
        &self.materials
    }

    pub fn carrot(&self) -> &Carrot {
        &self.carrot
    }

    pub fn moon(&self) -> &Planet {
        &self.moon
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn director() -> SceneDirector {
        SceneDirector::new(&SceneConfig::default(), &TextureSet::default())
    }

    #[test]
    fn whole_steps_only() {
        let mut scene = director();
        // 0.04s holds two 1/60s steps with a remainder
        assert_eq!(scene.advance(0.04), 2);
        assert_eq!(scene.advance(0.005), 0);
        assert_eq!(scene.advance(0.006), 1);
        assert_eq!(scene.steps(), 3);
    }

    #[test]
    fn long_stalls_are_capped() {
        let mut scene = director();
        assert_eq!(scene.advance(1.0), 10);
        // the backlog is gone instead of being replayed on the next frame
        assert_eq!(scene.advance(0.0), 0);
        assert_eq!(scene.advance(-1.0), 0);
    }

    #[test]
    fn every_material_is_available() {
        let scene = director();
        let keys: Vec<_> = scene.materials().keys().copied().collect();
        assert_eq!(keys.len(), 11);
        let floor = &scene.materials()[&MaterialKey::Floor];
        assert!(floor.unlit);
        // no textures were preloaded, so the grass material has no maps but still exists
        let grass = &scene.materials()[&MaterialKey::Grass];
        assert!(grass.maps().iter().all(Option::is_none));
        assert_eq!(grass.displacement_scale, PLANET_DISPLACEMENT);
        let cloud = &scene.materials()[&MaterialKey::Cloud];
        assert!(cloud.flat);
        assert_eq!(cloud.displacement_scale, 0.0);
        assert_eq!(cloud.metalness, 0.0);
    }

    #[test]
    fn label_appears_once_shown_and_follows_the_moon() {
        let mut scene = director();
        let count = scene.draw_items().len();
        assert!(!scene.submit_text("  "));
        assert!(scene.submit_text("carrot"));
        assert_eq!(scene.draw_items().len(), count);

        let text = scene.label_mut().take_request().unwrap();
        scene.label_mut().show(text);
        for _ in 0..25 {
            scene.step();
        }
        let items = scene.draw_items();
        assert_eq!(items.len(), count + 1);
        let label = items.iter().find(|d| d.mesh == MeshKey::Label).unwrap();
        let expected = scene.moon().position() - Vector3::new(0.0, 15.0, 0.0);
        assert!((label.transform.position - expected).magnitude() < 1e-5);
    }

    #[test]
    fn blinking_reaches_the_pilot() {
        let mut scene = director();
        scene.set_blinking(true);
        scene.step();
        assert!(scene.carrot().pilot().eye_scale() < 1.0);
        scene.set_blinking(false);
        assert_eq!(scene.carrot().pilot().eye_scale(), 1.0);
    }

    #[test]
    fn draws_floor_planets_carrot_and_clouds() {
        let items = director().draw_items();
        // floor, planet, moon, 16 carrot parts, 4 clouds of 3 puffs
        assert_eq!(items.len(), 1 + 2 + 16 + 12);
        assert_eq!(items.iter().filter(|d| d.mesh == MeshKey::Floor).count(), 1);
    }
}

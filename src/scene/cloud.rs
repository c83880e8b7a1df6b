//! Paper clouds drifting across the sky from right to left.

use cgmath::Vector3;

use crate::{
    config::STEP_SECONDS,
    data_structures::{
        instance::Instance,
        scene_graph::{DrawItem, Part},
    },
    resources::{material::MaterialKey, mesh::MeshKey},
    scene::AnimatedBody,
};

pub const DRIFT_SPEED: f32 = 0.8;
pub const START_X: f32 = 200.0;
pub const WRAP_X: f32 = -200.0;
pub const RESEED_RANGE: (i32, i32) = (-10, 20);

/// Where a cloud starts and how long it waits before drifting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudConfig {
    pub y: f32,
    pub z: f32,
    pub delay_seconds: f32,
    pub seed: u32,
}

/// The four clouds of the scene.
pub fn default_clouds() -> [CloudConfig; 4] {
    [
        CloudConfig {
            y: -15.0,
            z: 20.0,
            delay_seconds: 0.0,
            seed: 1,
        },
        CloudConfig {
            y: 5.0,
            z: 10.0,
            delay_seconds: 3.0,
            seed: 2,
        },
        CloudConfig {
            y: 25.0,
            z: -10.0,
            delay_seconds: 1.5,
            seed: 3,
        },
        CloudConfig {
            y: -25.0,
            z: 10.0,
            delay_seconds: 6.0,
            seed: 4,
        },
    ]
}

/// New height after the `wrap`-th wrap of the cloud seeded with `seed`.
///
/// Integer in `RESEED_RANGE` (inclusive), derived from a small integer hash so the same
/// cloud always takes the same path.
pub fn reseed_height(seed: u32, wrap: u32) -> f32 {
    let mut h = seed.wrapping_mul(0x9E37_79B9) ^ wrap.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    let (low, high) = RESEED_RANGE;
    let span = (high - low + 1) as u32;
    (low + (h % span) as i32) as f32
}

#[derive(Clone, Debug)]
pub struct Cloud {
    root: Part,
    delay_steps: u32,
    waited: u32,
    wraps: u32,
    seed: u32,
}

impl Cloud {
    pub fn new(config: CloudConfig) -> Self {
        let puff = |name| Part::mesh(name, MeshKey::CloudPuff, MaterialKey::Cloud);
        let root = Part::group("cloud")
            .at(START_X, config.y, config.z)
            .with_children([
                puff("puff_main").scaled(1.0, 0.8, 1.0),
                puff("puff_right").at(5.0, -1.5, 2.0).scaled(0.55, 0.35, 1.0),
                puff("puff_left").at(-5.5, -2.0, -1.0).scaled(0.75, 0.5, 1.0),
            ]);
        Self {
            root,
            delay_steps: (config.delay_seconds / STEP_SECONDS).round() as u32,
            waited: 0,
            wraps: 0,
            seed: config.seed,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.root.position
    }

    pub fn wraps(&self) -> u32 {
        self.wraps
    }

    pub fn delay_steps(&self) -> u32 {
        self.delay_steps
    }
}

impl AnimatedBody for Cloud {
    fn step(&mut self) {
        if self.waited < self.delay_steps {
            self.waited += 1;
            return;
        }
        self.root.position.x -= DRIFT_SPEED;
        if self.root.position.x < WRAP_X {
            self.wraps += 1;
            self.root.position.x = START_X;
            self.root.position.y = reseed_height(self.seed, self.wraps);
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
    fn waits_out_its_delay() {
        let mut cloud = Cloud::new(CloudConfig {
            y: 5.0,
            z: 10.0,
            delay_seconds: 3.0,
            seed: 7,
        });
        assert_eq!(cloud.delay_steps(), 180);
        for _ in 0..180 {
            cloud.step();
            assert_eq!(cloud.position().x, START_X);
        }
        cloud.step();
        assert!((cloud.position().x - (START_X - DRIFT_SPEED)).abs() < 1e-4);
    }

    #[test]
    fn wraps_back_to_the_start_with_a_new_height() {
        let mut cloud = Cloud::new(default_clouds()[0]);
        // 400 units at 0.8 per step; the wrap happens once x drops below -200
        let mut steps = 0;
        while cloud.wraps() == 0 && steps < 600 {
            cloud.step();
            steps += 1;
        }
        assert!((500..=501).contains(&steps), "{}", steps);
        assert_eq!(cloud.position().x, START_X);
        let y = cloud.position().y;
        assert!((-10.0..=20.0).contains(&y));
        assert_eq!(y.fract(), 0.0);
        assert_eq!(cloud.position().z, 20.0);
    }

    #[test]
    fn reseeding_is_deterministic_and_in_range() {
        for seed in 0..8 {
            for wrap in 0..200 {
                let y = reseed_height(seed, wrap);
                assert!((-10.0..=20.0).contains(&y));
                assert_eq!(y, reseed_height(seed, wrap));
            }
        }
        let spread: std::collections::BTreeSet<i32> =
            (0..200).map(|w| reseed_height(1, w) as i32).collect();
        assert!(spread.len() > 10);
    }

    #[test]
    fn three_puffs_per_cloud() {
        let mut out = Vec::new();
        Cloud::new(default_clouds()[2]).collect_draws(&mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|d| d.material == MaterialKey::Cloud));
    }
}

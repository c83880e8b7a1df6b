//! Scene-wide tunables.
//!
//! Everything that used to live as loose constants (canvas size, colours,
//! fog range, camera placement, asset names) is collected in [`SceneConfig`].
//! The defaults reproduce the carrot scene; callers can tweak fields before
//! handing the config to [`crate::flow::run`].

use cgmath::Point3;

use crate::resources::texture::{TextureSettings, material_urls};

/// Length of one simulation step in seconds. All per-step animation
/// constants (orbit speeds, clock increments, cloud drift) assume this rate.
pub const STEP_SECONDS: f32 = 1.0 / 60.0;

/// How many times the planet and moon maps repeat across the sphere.
pub const SURFACE_TILING: f32 = 8.0;

/// Converts a `0xRRGGBB` colour into float RGB, still sRGB encoded.
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Decodes an sRGB colour for the GPU, which blends and writes sRGB surfaces in linear space.
pub fn linear(srgb: [f32; 3]) -> [f32; 3] {
    srgb.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

/// Where assets live unless configured otherwise: the page's `assets/` folder in the browser,
/// the copy made at build time natively (falling back to `./assets`).
fn default_asset_root() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        return "assets";
    }
    option_env!("CARROT_ASSET_DIR").unwrap_or("assets")
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Preferred canvas width in pixels before the first resize arrives.
    pub width: u32,
    /// Aspect ratio held regardless of window size; the rest is letterboxed.
    pub aspect_ratio: f32,
    pub clear_colour: [f32; 3],
    pub clear_alpha: f32,
    pub fog_colour: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_colour: [f32; 3],
    pub ambient_intensity: f32,
    pub light_position: [f32; 3],
    pub light_colour: [f32; 3],
    pub floor_colour: [f32; 3],
    pub camera_eye: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Root that texture and font names are resolved against.
    pub asset_root: String,
    /// Font used to extrude the floating label. Absolute URLs are fetched as-is.
    pub font_url: String,
    pub planet_material: String,
    pub moon_material: String,
    /// Paper maps of the clouds, sampled once rather than tiled.
    pub cloud_material: String,
    /// Upper bound of fixed steps run per rendered frame.
    pub max_steps_per_frame: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 500,
            aspect_ratio: 16.0 / 9.0,
            clear_colour: rgb(0xc5f5f5),
            clear_alpha: 0.7,
            fog_colour: rgb(0xd5f8f8),
            fog_near: 100.0,
            fog_far: 300.0,
            ambient_colour: rgb(0xc5f5f5),
            ambient_intensity: 1.0,
            light_position: [30.0, 20.0, 0.0],
            light_colour: rgb(0xffffff),
            floor_colour: rgb(0xe0dacd),
            camera_eye: Point3::new(40.0, 20.0, 100.0),
            camera_target: Point3::new(0.0, 0.0, 0.0),
            fovy_degrees: 45.0,
            znear: 1.0,
            zfar: 1000.0,
            asset_root: default_asset_root().to_string(),
            font_url: "fonts/helvetiker_regular.ttf".to_string(),
            planet_material: "stylized-grass1".to_string(),
            moon_material: "peeling-painted-metal".to_string(),
            cloud_material: "crumpled-paper".to_string(),
            max_steps_per_frame: 10,
        }
    }
}

impl SceneConfig {
    /// Every texture the scene needs, in a stable order.
    pub fn texture_urls(&self) -> Vec<String> {
        [
            &self.planet_material,
            &self.moon_material,
            &self.cloud_material,
        ]
        .into_iter()
        .flat_map(|name| material_urls(name))
        .collect()
    }

    /// Sampling for `url`: the planet and moon maps repeat across the sphere, anything else
    /// is sampled once.
    pub fn texture_settings(&self, url: &str) -> TextureSettings {
        let tiled = [&self.planet_material, &self.moon_material]
            .into_iter()
            .any(|name| material_urls(name).iter().any(|u| u == url));
        if tiled {
            TextureSettings::tiled(SURFACE_TILING)
        } else {
            TextureSettings::default()
        }
    }

    pub fn height(&self) -> u32 {
        (self.width as f32 / self.aspect_ratio).round() as u32
    }
}

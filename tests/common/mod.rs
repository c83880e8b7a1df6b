#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

use carrot_orbit::{
    SceneConfig,
    resources::texture::{Channel, channel_url},
    scene::director::SceneDirector,
};

pub fn director() -> SceneDirector {
    SceneDirector::new(&SceneConfig::default(), &Default::default())
}

/// Asset root backed by a temporary directory, removed again on drop.
pub struct AssetDir {
    dir: TempDir,
}

impl AssetDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create asset dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    pub fn write_png(&self, file: &str, rgba: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
        img.save_with_format(self.path().join(file), image::ImageFormat::Png)
            .expect("write png");
    }

    /// Writes all six maps of `material` except the listed channels.
    pub fn write_material(&self, material: &str, skip: &[Channel]) {
        for channel in Channel::ALL {
            if !skip.contains(&channel) {
                self.write_png(&channel_url(material, channel), [120, 180, 60, 255]);
            }
        }
    }
}

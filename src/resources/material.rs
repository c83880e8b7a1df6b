//! Surface descriptions shared by every mesh of the same appearance.

use std::rc::Rc;

use crate::{config::rgb, resources::texture::Texture};

/// Everything the scene shader needs to shade one surface.
///
/// Texture maps are optional: untextured palette materials leave all six empty and the GPU side
/// binds neutral 1×1 stand-ins instead.
#[derive(Clone, Debug)]
pub struct MaterialDescriptor {
    pub albedo: Option<Rc<Texture>>,
    pub ao: Option<Rc<Texture>>,
    pub height: Option<Rc<Texture>>,
    pub metallic: Option<Rc<Texture>>,
    pub normal: Option<Rc<Texture>>,
    pub roughness: Option<Rc<Texture>>,
    /// World units the height map pushes vertices along their normal. `0.0` disables it.
    pub displacement_scale: f32,
    /// Shade with per-face normals (low-poly look).
    pub flat: bool,
    pub colour: [f32; 3],
    pub metalness: f32,
    pub roughness_factor: f32,
    /// Skip lighting entirely, used for the floor.
    pub unlit: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn make_material(
    albedo: Option<Rc<Texture>>,
    ao: Option<Rc<Texture>>,
    height: Option<Rc<Texture>>,
    displacement_scale: f32,
    metallic: Option<Rc<Texture>>,
    normal: Option<Rc<Texture>>,
    roughness: Option<Rc<Texture>>,
    flat: bool,
) -> MaterialDescriptor {
    MaterialDescriptor {
        albedo,
        ao,
        height,
        metallic,
        normal,
        roughness,
        displacement_scale,
        flat,
        colour: [1.0; 3],
        metalness: 1.0,
        roughness_factor: 1.0,
        unlit: false,
    }
}

impl MaterialDescriptor {
    /// An untextured surface of a single colour.
    pub fn solid(colour: [f32; 3], flat: bool) -> Self {
        Self {
            colour,
            metalness: 0.0,
            roughness_factor: 1.0,
            ..make_material(None, None, None, 0.0, None, None, None, flat)
        }
    }

    pub fn with_factors(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness_factor = roughness;
        self.metalness = metalness;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    /// UV repeat of the surface, taken from the albedo map (all maps of one material share it).
    pub fn uv_repeat(&self) -> [f32; 2] {
        self.albedo
            .as_ref()
            .map(|texture| texture.settings().repeat)
            .unwrap_or([1.0, 1.0])
    }

    pub fn maps(&self) -> [Option<&Rc<Texture>>; 6] {
        [
            self.albedo.as_ref(),
            self.ao.as_ref(),
            self.height.as_ref(),
            self.metallic.as_ref(),
            self.normal.as_ref(),
            self.roughness.as_ref(),
        ]
    }
}

/// Every appearance in the scene. Parts refer to materials by key so one descriptor (and later
/// one GPU bind group) is shared by all meshes that look the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKey {
    Grass,
    Metal,
    Orange,
    Brown,
    Green,
    Rabbit,
    Pink,
    Gray,
    Cloud,
    Floor,
    Label,
}

impl MaterialKey {
    pub const PALETTE: [MaterialKey; 7] = [
        MaterialKey::Orange,
        MaterialKey::Brown,
        MaterialKey::Green,
        MaterialKey::Rabbit,
        MaterialKey::Pink,
        MaterialKey::Gray,
        MaterialKey::Label,
    ];

    /// Untextured materials; `None` for the texture-backed planets and clouds, and the floor.
    pub fn palette(self) -> Option<MaterialDescriptor> {
        let solid = |hex| MaterialDescriptor::solid(rgb(hex), true);
        Some(match self {
            MaterialKey::Orange => solid(0xf58a1f),
            MaterialKey::Brown => solid(0x5c2c22),
            MaterialKey::Green => solid(0x5da04a),
            MaterialKey::Rabbit => solid(0xfbf5ef),
            MaterialKey::Pink => solid(0xdc9b96),
            MaterialKey::Gray => solid(0x3a3a3a),
            MaterialKey::Label => {
                MaterialDescriptor::solid(rgb(0x5c2c22), false).with_factors(0.8, 0.1)
            }
            MaterialKey::Grass | MaterialKey::Metal | MaterialKey::Cloud | MaterialKey::Floor => {
                return None;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::texture::TextureSettings;

    fn texture(repeat: f32) -> Rc<Texture> {
        Rc::new(Texture::new(
            "t.png",
            image::RgbaImage::new(1, 1),
            TextureSettings::tiled(repeat),
        ))
    }

    #[test]
    fn zero_displacement_is_a_valid_material() {
        let m = make_material(None, None, Some(texture(1.0)), 0.0, None, None, None, false);
        assert_eq!(m.displacement_scale, 0.0);
        assert!(m.height.is_some());
        assert!(!m.flat);
    }

    #[test]
    fn maps_keep_their_slots() {
        let albedo = texture(8.0);
        let normal = texture(8.0);
        let m = make_material(
            Some(albedo.clone()),
            None,
            None,
            3.0,
            None,
            Some(normal.clone()),
            None,
            true,
        );
        let maps = m.maps();
        assert!(Rc::ptr_eq(maps[0].unwrap(), &albedo));
        assert!(maps[1].is_none());
        assert!(Rc::ptr_eq(maps[4].unwrap(), &normal));
        assert_eq!(m.uv_repeat(), [8.0, 8.0]);
    }

    #[test]
    fn solid_materials_have_no_maps() {
        let m = MaterialDescriptor::solid([0.5; 3], true);
        assert!(m.maps().iter().all(Option::is_none));
        assert_eq!(m.uv_repeat(), [1.0, 1.0]);
        assert!(!m.unlit);
        assert!(m.unlit().unlit);
    }

    #[test]
    fn label_material_is_rough_and_barely_metallic() {
        let m = MaterialKey::Label.palette().unwrap();
        assert_eq!(m.roughness_factor, 0.8);
        assert_eq!(m.metalness, 0.1);
        assert!(MaterialKey::Grass.palette().is_none());
        assert!(MaterialKey::Cloud.palette().is_none());
        assert!(!MaterialKey::PALETTE.contains(&MaterialKey::Cloud));
    }
}

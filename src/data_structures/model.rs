//! Meshes and materials as they live on the GPU.
//!
//! - [`ModelVertex`] is the vertex layout every procedural mesh is uploaded with
//! - [`Mesh`] owns a vertex and index buffer
//! - [`GpuMaterial`] binds the six texture maps and the material uniform of one
//!   [`MaterialDescriptor`]
//! - [`DrawModel`] extends `wgpu::RenderPass` with instanced mesh draws

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    config,
    data_structures::texture::{self, Texture},
    resources::{material::MaterialDescriptor, texture::TextureSettings},
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Tangent and bitangent
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/**
 * Material parameters the scene shader reads next to the texture maps.
 *
 * Uniforms require 16 byte alignment, the layout below packs into three vec4s.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    colour: [f32; 3],
    metalness: f32,
    roughness: f32,
    displacement: f32,
    uv_repeat: [f32; 2],
    flat_shading: u32,
    unlit: u32,
    has_normal_map: u32,
    _padding: u32,
}

impl From<&MaterialDescriptor> for MaterialUniform {
    fn from(material: &MaterialDescriptor) -> Self {
        Self {
            colour: config::linear(material.colour),
            metalness: material.metalness,
            roughness: material.roughness_factor,
            // without a height map there is nothing to displace by
            displacement: if material.height.is_some() {
                material.displacement_scale
            } else {
                0.0
            },
            uv_repeat: material.uv_repeat(),
            flat_shading: material.flat as u32,
            unlit: material.unlit as u32,
            has_normal_map: material.normal.is_some() as u32,
            _padding: 0,
        }
    }
}

/// The six maps in binding order with the stand-in colour for a missing one and whether the
/// map holds colour (sRGB) data.
const MAP_SLOTS: [(&str, [u8; 4], bool); 6] = [
    ("albedo", [255, 255, 255, 255], true),
    ("ao", [255, 255, 255, 255], false),
    ("height", [0, 0, 0, 255], false),
    ("metallic", [255, 255, 255, 255], false),
    ("normal", [127, 127, 255, 255], false),
    ("roughness", [255, 255, 255, 255], false),
];

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            texture_entry(4),
            texture_entry(5),
            texture_entry(6),
            wgpu::BindGroupLayoutEntry {
                binding: 7,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct GpuMaterial {
    pub name: String,
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub maps: Vec<Texture>,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    /// Uploads every map of `material`; missing maps (never requested or failed to load) are
    /// replaced by 1×1 stand-ins so the surface renders blank instead of failing.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        material: &MaterialDescriptor,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let maps: Vec<Texture> = material
            .maps()
            .into_iter()
            .zip(MAP_SLOTS)
            .map(|(map, (slot, neutral, srgb))| {
                let label = format!("{} {}", name, slot);
                match map {
                    Some(map) => Texture::from_image(
                        device,
                        queue,
                        map.image(),
                        Some(&label),
                        srgb,
                        &map.settings(),
                    ),
                    None => Texture::solid(device, queue, neutral, srgb, &label),
                }
            })
            .collect();
        let settings = material
            .albedo
            .as_ref()
            .map(|albedo| albedo.settings())
            .unwrap_or_else(TextureSettings::default);
        let sampler = texture::create_sampler(device, &settings);

        let uniform = MaterialUniform::from(material);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }];
        entries.extend(maps.iter().enumerate().map(|(i, map)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(&map.view),
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: 7,
            resource: wgpu::BindingResource::Sampler(&sampler),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            uniform,
            buffer,
            maps,
            sampler,
            bind_group,
        }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        scene_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b GpuMaterial,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        scene_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, scene_bind_group, &[]);
        self.set_bind_group(2, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::resources::{material::make_material, texture::Texture as CpuTexture};

    #[test]
    fn material_uniform_is_three_vec4s() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        assert_eq!(std::mem::size_of::<ModelVertex>(), 14 * 4);
    }

    #[test]
    fn displacement_needs_a_height_map() {
        let without = make_material(None, None, None, 3.0, None, None, None, true);
        assert_eq!(MaterialUniform::from(&without).displacement, 0.0);

        let height = Rc::new(CpuTexture::new(
            "h.png",
            image::RgbaImage::new(1, 1),
            TextureSettings::tiled(8.0),
        ));
        let with = make_material(None, None, Some(height), 3.0, None, None, None, true);
        let uniform = MaterialUniform::from(&with);
        assert_eq!(uniform.displacement, 3.0);
        assert_eq!(uniform.flat_shading, 1);
        assert_eq!(uniform.has_normal_map, 0);
    }
}

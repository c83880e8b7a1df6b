//! Scene lighting and fog, shared by every draw through bind group 1.

use wgpu::util::DeviceExt;

use crate::config::{self, SceneConfig};

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, the scalars fill the fourth slot
    intensity: f32,
    color: [f32; 3],
    _padding: u32,
    ambient: [f32; 3],
    ambient_intensity: f32,
    fog_color: [f32; 3],
    fog_near: f32,
    fog_far: f32,
    _padding2: [u32; 3],
}

impl LightUniform {
    /// Colours are decoded to linear space here, the shader works in linear space only.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            position: config.light_position,
            intensity: 1.0,
            color: config::linear(config.light_colour),
            _padding: 0,
            ambient: config::linear(config.ambient_colour),
            ambient_intensity: config.ambient_intensity,
            fog_color: config::linear(config.fog_colour),
            fog_near: config.fog_near,
            fog_far: config.fog_far,
            _padding2: [0; 3],
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

impl LightResources {
    pub fn new(device: &wgpu::Device, config: &SceneConfig) -> Self {
        let uniform = LightUniform::from_config(config);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_padded_to_whole_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightUniform>(), 80);
    }

    #[test]
    fn fog_range_comes_from_the_config() {
        let uniform = LightUniform::from_config(&SceneConfig::default());
        assert_eq!(uniform.fog_near, 100.0);
        assert_eq!(uniform.fog_far, 300.0);
        assert_eq!(uniform.position, [30.0, 20.0, 0.0]);
    }
}

//! Render composition and instance batching.
//!
//! Every frame the [`SceneDirector`](crate::scene::director::SceneDirector) hands out one
//! [`DrawItem`] per visible part. [`batch`] groups them by mesh and material so each group is
//! drawn with a single instanced call, and [`SceneRenderer`] owns the GPU side: uploaded
//! meshes, material bind groups and the per-group instance buffers.
//!
//! # Key types
//!
//! - [`Instanced`] is one instance buffer with its mesh/material pair and instance count
//! - [`SceneRenderer`] keeps meshes, materials and instance buffers alive between frames
//!

use std::collections::{BTreeMap, HashMap};

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, GpuMaterial, Mesh},
        scene_graph::DrawItem,
    },
    resources::{
        material::{MaterialDescriptor, MaterialKey},
        mesh::{MeshData, MeshKey},
    },
};

pub type BatchKey = (MeshKey, MaterialKey);

/// Groups draw items by mesh and material, keeping the order items arrived in.
///
/// The map is ordered so the draw order (and therefore any overdraw) is the same every frame.
pub fn batch(items: &[DrawItem]) -> BTreeMap<BatchKey, Vec<InstanceRaw>> {
    let mut batches: BTreeMap<BatchKey, Vec<InstanceRaw>> = BTreeMap::new();
    for item in items {
        batches
            .entry((item.mesh, item.material))
            .or_default()
            .push(item.transform.to_raw());
    }
    batches
}

/// An instance buffer for one mesh/material pair.
///
/// The buffer only grows: when a frame needs more instances than it can hold it is replaced
/// by one of twice the size.
#[derive(Debug)]
pub struct Instanced {
    pub buffer: wgpu::Buffer,
    pub capacity: usize,
    pub amount: usize,
}

impl Instanced {
    fn new(device: &wgpu::Device, key: BatchKey, instances: &[InstanceRaw]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Instance Buffer", key)),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            capacity: instances.len(),
            amount: instances.len(),
        }
    }

    fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: BatchKey,
        instances: &[InstanceRaw],
    ) {
        if instances.len() > self.capacity {
            let mut grown = Vec::with_capacity(instances.len() * 2);
            grown.extend_from_slice(instances);
            grown.resize(instances.len() * 2, instances[0]);
            *self = Self::new(device, key, &grown);
        } else {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
        }
        self.amount = instances.len();
    }
}

#[derive(Debug)]
pub struct SceneRenderer {
    meshes: HashMap<MeshKey, Mesh>,
    materials: BTreeMap<MaterialKey, GpuMaterial>,
    instances: BTreeMap<BatchKey, Instanced>,
}

impl SceneRenderer {
    /// Uploads every procedural mesh and every material of the scene.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        materials: &BTreeMap<MaterialKey, MaterialDescriptor>,
    ) -> Self {
        let meshes = MeshKey::STATIC
            .iter()
            .filter_map(|&key| {
                let data = key.build()?;
                Some((key, data.upload(device, &format!("{:?}", key))))
            })
            .collect();
        let materials = materials
            .iter()
            .map(|(&key, descriptor)| {
                let gpu = GpuMaterial::new(
                    device,
                    queue,
                    &format!("{:?}", key),
                    descriptor,
                    material_layout,
                );
                (key, gpu)
            })
            .collect();
        log::info!("uploaded scene meshes and materials");
        Self {
            meshes,
            materials,
            instances: BTreeMap::new(),
        }
    }

    /// Swaps in the geometry of a new label. An empty mesh removes the label geometry and
    /// returns `false`, the label must not be drawn then.
    pub fn set_label_mesh(&mut self, device: &wgpu::Device, mesh: MeshData) -> bool {
        if mesh.indices.is_empty() {
            log::warn!("label text produced no geometry");
            self.meshes.remove(&MeshKey::Label);
            return false;
        }
        self.meshes.insert(MeshKey::Label, mesh.upload(device, "Label"));
        true
    }

    /// Writes this frame's instances. Groups that are absent this frame draw nothing.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[DrawItem]) {
        for instanced in self.instances.values_mut() {
            instanced.amount = 0;
        }
        for (key, raws) in batch(items) {
            match self.instances.get_mut(&key) {
                Some(instanced) => instanced.write(device, queue, key, &raws),
                None => {
                    self.instances.insert(key, Instanced::new(device, key, &raws));
                }
            }
        }
    }

    pub fn has_mesh(&self, key: MeshKey) -> bool {
        self.meshes.contains_key(&key)
    }

    /// Instances drawn for `key` in the last prepared frame.
    pub fn instance_count(&self, key: BatchKey) -> usize {
        self.instances.get(&key).map(|i| i.amount).unwrap_or(0)
    }

    pub fn draw<'pass>(&'pass self, ctx: &'pass Context, render_pass: &mut wgpu::RenderPass<'pass>) {
        render_pass.set_pipeline(&ctx.pipeline);
        for (key, instanced) in &self.instances {
            if instanced.amount == 0 {
                continue;
            }
            let (Some(mesh), Some(material)) = (self.meshes.get(&key.0), self.materials.get(&key.1))
            else {
                log::warn!("nothing uploaded for {:?}", key);
                continue;
            };
            render_pass.set_vertex_buffer(1, instanced.buffer.slice(..));
            render_pass.draw_mesh_instanced(
                mesh,
                material,
                0..instanced.amount as u32,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }
    }
}

//! Procedural low-poly geometry.
//!
//! Every mesh in the scene is generated in code: boxes, tapered cylinders, UV spheres and a
//! plane. The generators emit vertices in a fixed, documented order (faces `+x, -x, +y, -y,
//! +z, -z` for boxes; rows from top to bottom for cylinders and spheres) so that shape tweaks
//! can address individual vertices by index, e.g. pulling one corner of a wing.

use std::f32::consts::{PI, TAU};

use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::model::{self, ModelVertex};

/// Identifies one of the scene's meshes. Parts refer to meshes by key so identical parts share
/// one vertex buffer and are drawn instanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKey {
    CarrotBody,
    Wing,
    Leaf,
    PilotBody,
    Seat,
    Ear,
    Eye,
    Nose,
    Mouth,
    Planet,
    Moon,
    CloudPuff,
    Floor,
    /// Rebuilt whenever the label text changes, see [`crate::resources::font`].
    Label,
}

impl MeshKey {
    pub const STATIC: [MeshKey; 13] = [
        MeshKey::CarrotBody,
        MeshKey::Wing,
        MeshKey::Leaf,
        MeshKey::PilotBody,
        MeshKey::Seat,
        MeshKey::Ear,
        MeshKey::Eye,
        MeshKey::Nose,
        MeshKey::Mouth,
        MeshKey::Planet,
        MeshKey::Moon,
        MeshKey::CloudPuff,
        MeshKey::Floor,
    ];

    /// Geometry of the static meshes. The label has no fixed geometry.
    pub fn build(self) -> Option<MeshData> {
        let mesh = match self {
            MeshKey::CarrotBody => {
                let mut body = MeshData::cylinder(5.0, 2.0, 25.0, 12, 4);
                body.nudge(16, [0.0, 3.0, 0.0]);
                body.nudge(17, [0.0, -2.0, 0.0]);
                body
            }
            MeshKey::Wing => {
                let mut wing = MeshData::cuboid(7.0, 7.0, 0.5);
                wing.nudge(2, [-1.0, 2.0, 0.0]);
                wing.nudge(3, [-1.0, 2.0, 0.0]);
                wing
            }
            MeshKey::Leaf => {
                let mut leaf = MeshData::cylinder(1.5, 1.0, 5.0, 4, 1);
                leaf.nudge(8, [0.0, 0.5, 0.0]);
                leaf
            }
            MeshKey::PilotBody => {
                let mut body = MeshData::cuboid(5.0, 5.0, 5.0);
                body.nudge(3, [0.0, 0.5, 0.0]);
                body.nudge(6, [0.0, 0.5, 0.0]);
                body
            }
            MeshKey::Seat => MeshData::cuboid(6.0, 1.0, 6.0),
            MeshKey::Ear => {
                let mut ear = MeshData::cuboid(2.0, 6.0, 0.5);
                ear.nudge(2, [-0.5, 0.0, 0.0]);
                ear.nudge(3, [-0.5, 0.0, 0.0]);
                ear.nudge(6, [0.5, 0.0, 0.0]);
                ear.nudge(7, [0.5, 0.0, 0.0]);
                ear
            }
            MeshKey::Eye => MeshData::cuboid(0.5, 1.0, 0.5),
            MeshKey::Nose => {
                let mut nose = MeshData::cuboid(0.5, 0.5, 0.5);
                for idx in [2, 3, 6, 7] {
                    nose.set_x(idx, 0.0);
                }
                nose
            }
            MeshKey::Mouth => MeshData::cuboid(0.25, 0.25, 0.5),
            MeshKey::Planet => MeshData::sphere(30.0, 32, 32),
            MeshKey::Moon => MeshData::sphere(8.0, 32, 32),
            MeshKey::CloudPuff => MeshData::sphere(5.0, 4, 6),
            MeshKey::Floor => MeshData::plane(1000.0, 1000.0),
            MeshKey::Label => return None,
        };
        Some(mesh)
    }
}

/// CPU-side geometry: vertices and a triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

fn vertex(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> ModelVertex {
    ModelVertex {
        position,
        tex_coords,
        normal,
        tangent: [0.0; 3],
        bitangent: [0.0; 3],
    }
}

impl MeshData {
    /// Axis-aligned box centred on the origin. Four vertices per face, faces in the order
    /// `+x, -x, +y, -y, +z, -z`.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);
        // (corner order within the face: top-left, top-right, bottom-left, bottom-right)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([1.0, 0.0, 0.0], [[w, h, d], [w, h, -d], [w, -h, d], [w, -h, -d]]),
            ([-1.0, 0.0, 0.0], [[-w, h, -d], [-w, h, d], [-w, -h, -d], [-w, -h, d]]),
            ([0.0, 1.0, 0.0], [[-w, h, -d], [w, h, -d], [-w, h, d], [w, h, d]]),
            ([0.0, -1.0, 0.0], [[-w, -h, d], [w, -h, d], [-w, -h, -d], [w, -h, -d]]),
            ([0.0, 0.0, 1.0], [[-w, h, d], [w, h, d], [-w, -h, d], [w, -h, d]]),
            ([0.0, 0.0, -1.0], [[w, h, -d], [-w, h, -d], [w, -h, -d], [-w, -h, -d]]),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        let mut mesh = MeshData::default();
        for (normal, corners) in faces {
            let offset = mesh.vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(uvs) {
                mesh.vertices.push(vertex(corner, normal, uv));
            }
            mesh.indices
                .extend([offset, offset + 2, offset + 1, offset + 2, offset + 3, offset + 1]);
        }
        mesh
    }

    /// Tapered cylinder along y. Side vertices come first, row by row from the top, with
    /// `radial_segments + 1` vertices per row (the seam is duplicated); caps follow.
    pub fn cylinder(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
    ) -> Self {
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;
        let mut mesh = MeshData::default();
        let mut rows = Vec::with_capacity(height_segments as usize + 1);

        for y in 0..=height_segments {
            let v = y as f32 / height_segments as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            let mut row = Vec::with_capacity(radial_segments as usize + 1);
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                let normal = cgmath::Vector3::new(sin, slope, cos).normalize();
                row.push(mesh.vertices.len() as u32);
                mesh.vertices.push(vertex(
                    [radius * sin, -v * height + half_height, radius * cos],
                    normal.into(),
                    [u, 1.0 - v],
                ));
            }
            rows.push(row);
        }
        for x in 0..radial_segments as usize {
            for y in 0..height_segments as usize {
                let a = rows[y][x];
                let b = rows[y + 1][x];
                let c = rows[y + 1][x + 1];
                let d = rows[y][x + 1];
                mesh.indices.extend([a, b, d, b, c, d]);
            }
        }

        for top in [true, false] {
            let radius = if top { radius_top } else { radius_bottom };
            if radius <= 0.0 {
                continue;
            }
            let sign = if top { 1.0 } else { -1.0 };
            let centre_start = mesh.vertices.len() as u32;
            for _ in 0..=radial_segments {
                mesh.vertices.push(vertex(
                    [0.0, half_height * sign, 0.0],
                    [0.0, sign, 0.0],
                    [0.5, 0.5],
                ));
            }
            let ring_start = mesh.vertices.len() as u32;
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let (sin, cos) = (u * TAU).sin_cos();
                mesh.vertices.push(vertex(
                    [radius * sin, half_height * sign, radius * cos],
                    [0.0, sign, 0.0],
                    [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
                ));
            }
            for x in 0..radial_segments {
                let c = centre_start + x;
                let i = ring_start + x;
                if top {
                    mesh.indices.extend([i, i + 1, c]);
                } else {
                    mesh.indices.extend([i + 1, i, c]);
                }
            }
        }
        mesh
    }

    /// UV sphere, rows from the north pole down.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let mut mesh = MeshData::default();
        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let position = cgmath::Vector3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                let normal = if position.magnitude2() > 0.0 {
                    position.normalize()
                } else {
                    cgmath::Vector3::unit_y()
                };
                row.push(mesh.vertices.len() as u32);
                mesh.vertices
                    .push(vertex(position.into(), normal.into(), [u, 1.0 - v]));
            }
            grid.push(row);
        }
        let last_row = height_segments as usize - 1;
        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 {
                    mesh.indices.extend([a, b, d]);
                }
                if iy != last_row {
                    mesh.indices.extend([b, c, d]);
                }
            }
        }
        mesh
    }

    /// A single quad in the xy plane facing +z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        MeshData {
            vertices: vec![
                vertex([-w, h, 0.0], normal, [0.0, 1.0]),
                vertex([w, h, 0.0], normal, [1.0, 1.0]),
                vertex([-w, -h, 0.0], normal, [0.0, 0.0]),
                vertex([w, -h, 0.0], normal, [1.0, 0.0]),
            ],
            indices: vec![0, 2, 1, 2, 3, 1],
        }
    }

    /// Moves one vertex; out-of-range indices are ignored with a warning.
    pub fn nudge(&mut self, idx: usize, offset: [f32; 3]) {
        match self.vertices.get_mut(idx) {
            Some(v) => {
                for (axis, delta) in offset.iter().enumerate() {
                    v.position[axis] += delta;
                }
            }
            None => log::warn!("cannot nudge vertex {} of a {} vertex mesh", idx, self.vertices.len()),
        }
    }

    pub fn set_x(&mut self, idx: usize, x: f32) {
        if let Some(v) = self.vertices.get_mut(idx) {
            v.position[0] = x;
        }
    }

    pub fn translated(mut self, offset: [f32; 3]) -> Self {
        for v in &mut self.vertices {
            for axis in 0..3 {
                v.position[axis] += offset[axis];
            }
        }
        self
    }

    /// Appends `other`, re-basing its indices.
    pub fn merge(&mut self, other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// Axis-aligned bounds as `(min, max)`; `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(v.position[axis]);
                hi[axis] = hi[axis].max(v.position[axis]);
            }
            (lo, hi)
        }))
    }

    /**
     * Procedural geometry doesn't come with tangents and bitangents so they have to be
     * calculated for normal maps to work correctly.
     */
    pub fn compute_tangents(&mut self) {
        let vertices = &mut self.vertices;
        let mut triangles_included = vec![0; vertices.len()];

        // Calculate tangents and bitangets. We're going to
        // use the triangles, so we need to loop through the
        // indices in chunks of 3
        for c in self.indices.chunks(3) {
            if c.len() < 3 {
                continue;
            }
            let v0 = vertices[c[0] as usize];
            let v1 = vertices[c[1] as usize];
            let v2 = vertices[c[2] as usize];

            let pos0: cgmath::Vector3<_> = v0.position.into();
            let pos1: cgmath::Vector3<_> = v1.position.into();
            let pos2: cgmath::Vector3<_> = v2.position.into();

            let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
            let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
            let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

            // Calculate the edges of the triangle
            let delta_pos1 = pos1 - pos0;
            let delta_pos2 = pos2 - pos0;

            // This will give us a direction to calculate the
            // tangent and bitangent
            let delta_uv1 = uv1 - uv0;
            let delta_uv2 = uv2 - uv0;

            // Solving the following system of equations will
            // give us the tangent and bitangent.
            //     delta_pos1 = delta_uv1.x * T + delta_u.y * B
            //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
            let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
            // Degenerate UVs (cap centres, poles) contribute nothing
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
            // We flip the bitangent to enable right-handed normal
            // maps with wgpu texture coordinate system
            let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

            for &i in c {
                let v = &mut vertices[i as usize];
                v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
                v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
                // Used to average the tangents/bitangents
                triangles_included[i as usize] += 1;
            }
        }

        // Average the tangents/bitangents
        for (i, n) in triangles_included.into_iter().enumerate() {
            if n == 0 {
                continue;
            }
            let denom = 1.0 / n as f32;
            let v = &mut vertices[i];
            v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
            v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
        }
    }

    pub fn upload(mut self, device: &wgpu::Device, name: &str) -> model::Mesh {
        self.compute_tangents();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        model::Mesh {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
        }
    }
}

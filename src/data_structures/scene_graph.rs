//! Scene graph and hierarchical scene organization.
//!
//! Bodies are trees of rigid [`Part`]s. A part carries a local transform (kept as Euler
//! angles so animation code can write angles directly), an optional mesh/material pair and its
//! children. Walking the tree composes local transforms into world transforms and yields one
//! [`DrawItem`] per visible part.

use cgmath::Vector3;

use crate::{
    data_structures::instance::Instance,
    resources::{material::MaterialKey, mesh::MeshKey},
};

/// One visible part at its world transform, ready to be batched by mesh and material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshKey,
    pub material: MaterialKey,
    pub transform: Instance,
}

#[derive(Clone, Debug)]
pub struct Part {
    pub name: &'static str,
    pub position: Vector3<f32>,
    pub euler: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub visual: Option<(MeshKey, MaterialKey)>,
    pub children: Vec<Part>,
}

impl Part {
    /// An empty group or pivot.
    pub fn group(name: &'static str) -> Self {
        Self {
            name,
            position: Vector3::new(0.0, 0.0, 0.0),
            euler: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            visual: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: &'static str, mesh: MeshKey, material: MaterialKey) -> Self {
        Self {
            visual: Some((mesh, material)),
            ..Self::group(name)
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.euler = Vector3::new(x, y, z);
        self
    }

    pub fn scaled(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vector3::new(x, y, z);
        self
    }

    pub fn with_child(mut self, child: Part) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Part>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn local_transform(&self) -> Instance {
        Instance::from_euler(self.position, self.euler, self.scale)
    }

    pub fn find(&self, name: &str) -> Option<&Part> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Part> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    /// Applies `mutation` to the named part; logs a warning if there is no such part.
    pub fn update(&mut self, name: &str, mutation: impl FnOnce(&mut Part)) {
        match self.find_mut(name) {
            Some(part) => mutation(part),
            None => log::warn!("part {} not found below {}", name, self.name),
        }
    }

    /// World transform of the named part given the transform of this part's parent.
    pub fn world_transform_of(&self, name: &str, parent: &Instance) -> Option<Instance> {
        let world = parent * &self.local_transform();
        if self.name == name {
            return Some(world);
        }
        self.children
            .iter()
            .find_map(|child| child.world_transform_of(name, &world))
    }

    /// Appends a draw item for every visible part below (and including) this one.
    pub fn collect_draws(&self, parent: &Instance, out: &mut Vec<DrawItem>) {
        let world = parent * &self.local_transform();
        if let Some((mesh, material)) = self.visual {
            out.push(DrawItem {
                mesh,
                material,
                transform: world,
            });
        }
        for child in &self.children {
            child.collect_draws(&world, out);
        }
    }
}

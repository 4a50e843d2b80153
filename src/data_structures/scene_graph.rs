//! Scene graph and hierarchical scene organization.
//!
//! A resolved asset is a tree of `SceneNode`s. Each node carries a local
//! transform, the meshes attached to it and its children. World transforms are
//! computed on demand by multiplying the parents' transforms into the
//! children's (`parent * local`).

use cgmath::{EuclideanSpace, Transform};

use crate::data_structures::{instance::Instance, model::Mesh};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Instance,
    pub meshes: Vec<Mesh>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn container(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_meshes(name: Option<&str>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.map(str::to_string),
            meshes,
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first, parents before children.
    pub fn traverse(&self, visit: &mut dyn FnMut(&SceneNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        visit(self);
        for child in self.children.iter_mut() {
            child.traverse_mut(visit);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| count += node.meshes.len());
        count
    }

    /// Axis aligned bounds of all vertices, in the coordinate frame of this node's parent.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        self.accumulate_bounds(&Instance::default(), &mut bounds);
        bounds
    }

    fn accumulate_bounds(&self, parent: &Instance, bounds: &mut Option<BoundingBox>) {
        let world = parent * &self.local;
        let matrix = world.to_matrix();
        for mesh in &self.meshes {
            for &position in &mesh.positions {
                let point = matrix.transform_point(cgmath::Point3::from(position));
                match bounds {
                    Some(b) => b.expand(point),
                    None => *bounds = Some(BoundingBox::from_point(point)),
                }
            }
        }
        for child in &self.children {
            child.accumulate_bounds(&world, bounds);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: cgmath::Point3<f32>,
    pub max: cgmath::Point3<f32>,
}

impl BoundingBox {
    pub fn from_point(point: cgmath::Point3<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn expand(&mut self, point: cgmath::Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> cgmath::Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> cgmath::Vector3<f32> {
        self.max - self.min
    }
}

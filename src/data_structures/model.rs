//! Meshes and materials of a resolved scene.
//!
//! Everything here lives on the CPU. A renderer uploads the vertex data once
//! and watches `Material::needs_update` to know when to rebuild its pipeline
//! state for a material.

use crate::config::MaterialOverride;

/// Which faces of a mesh are shaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub side: Side,
    pub needs_update: bool,
    revision: u32,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            side: Side::Front,
            needs_update: false,
            revision: 0,
        }
    }

    /// A plain standard material built from a caller supplied override.
    pub fn standard(material_override: &MaterialOverride) -> Self {
        let [r, g, b] = material_override.color;
        Self {
            base_color: [r, g, b, 1.0],
            metallic: material_override.metalness,
            roughness: material_override.roughness,
            ..Self::new("Override Material")
        }
        .normalized()
    }

    /// Clamps all factors into the range a PBR shader expects.
    pub fn normalize(&mut self) {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        self.base_color = self.base_color.map(clamp);
        self.metallic = clamp(self.metallic);
        self.roughness = clamp(self.roughness);
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Flags the material for the renderer and bumps its revision.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
        self.revision += 1;
    }

    /// How many times this material was flagged for an update.
    pub fn revision(&self) -> u32 {
        self.revision
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default Material")
    }
}

/// Triangle list with optional per-vertex normals and texture coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl Mesh {
    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Rejects meshes a renderer could not draw safely.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.positions.is_empty() {
            anyhow::bail!("mesh {:?} has no vertices", self.name);
        }
        if self.indices.len() % 3 != 0 {
            anyhow::bail!(
                "mesh {:?} has {} indices which is not a triangle list",
                self.name,
                self.indices.len()
            );
        }
        if let Some(idx) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            anyhow::bail!(
                "mesh {:?} references vertex {} but only has {}",
                self.name,
                idx,
                self.positions.len()
            );
        }
        if self.positions.iter().flatten().any(|c| !c.is_finite()) {
            anyhow::bail!(
                "mesh {:?} contains non-finite coordinates. Make sure you use the right scale in your export settings.",
                self.name
            );
        }
        Ok(())
    }

    /// Fills in smooth vertex normals when the source did not provide any.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.positions.len()];

        // Accumulate the face normal of every triangle on its three corners
        for c in self.indices.chunks(3) {
            if c.len() < 3 {
                continue;
            }
            let pos0: cgmath::Vector3<f32> = self.positions[c[0] as usize].into();
            let pos1: cgmath::Vector3<f32> = self.positions[c[1] as usize].into();
            let pos2: cgmath::Vector3<f32> = self.positions[c[2] as usize].into();
            let face = (pos1 - pos0).cross(pos2 - pos0);
            for &i in c {
                normals[i as usize] += face;
            }
        }

        self.normals = normals
            .into_iter()
            .map(|n| {
                use cgmath::InnerSpace;
                if n.magnitude2() > f32::EPSILON {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }
}

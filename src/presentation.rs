//! Placing a resolved scene in the viewport.
//!
//! The displayed transform is composed as
//! `base (position, rotation) * spin (axis, angle) * pivot * scale`, where the
//! pivot moves the bounding-box centre of the scaled scene onto the origin
//! plus the configured offset. The pivot is computed once per scene; only the
//! spin angle changes from frame to frame.
//!
//! Loaded materials are switched to front-face shading and flagged for the
//! renderer once per scene. Scenes whose materials were overridden are left as
//! they are.

use std::time::Duration;

use crate::{
    config::PresentationConfig,
    data_structures::{
        instance::Instance,
        model::Side,
        scene_graph::BoundingBox,
    },
    resources::resolver::ResolvedScene,
};

#[derive(Debug)]
pub struct Presentation {
    scene: ResolvedScene,
    config: PresentationConfig,
    pivot: cgmath::Vector3<f32>,
    angle: cgmath::Rad<f32>,
}

impl Presentation {
    /// Takes ownership of `scene` and prepares it for display.
    pub fn new(mut scene: ResolvedScene, config: &PresentationConfig) -> Self {
        // An override material is built fresh and keeps its own settings
        if !scene.material_override_applied {
            for material in scene.materials.iter_mut() {
                material.side = Side::Front;
                material.mark_needs_update();
            }
        }
        let pivot = center_pivot(&scene, config);
        Self {
            scene,
            config: config.clone(),
            pivot,
            angle: cgmath::Rad(0.0),
        }
    }

    /// Advances the spin by `speed * dt`, independent of the frame rate.
    pub fn update(&mut self, dt: Duration) {
        let rotate = &self.config.auto_rotate;
        if !rotate.enabled {
            return;
        }
        self.angle += cgmath::Rad(rotate.speed * dt.as_secs_f32());
    }

    /// World transform of the scene root for the current frame.
    pub fn transform(&self) -> Instance {
        let base = Instance::from_euler(self.config.position, self.config.rotation);
        let spin = Instance::from_axis_angle(self.config.auto_rotate.axis.unit(), self.angle);
        let pivot = Instance::from(self.pivot);
        let scale = Instance::from_scale(self.config.scale);
        base * spin * pivot * scale
    }

    pub fn matrix(&self) -> cgmath::Matrix4<f32> {
        self.transform().to_matrix()
    }

    /// Bounds of the scene as displayed this frame.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut root = self.scene.root.clone();
        root.local = self.transform() * root.local;
        root.bounding_box()
    }

    pub fn scene(&self) -> &ResolvedScene {
        &self.scene
    }

    pub fn angle(&self) -> cgmath::Rad<f32> {
        self.angle
    }

    pub fn pivot(&self) -> cgmath::Vector3<f32> {
        self.pivot
    }
}

fn center_pivot(scene: &ResolvedScene, config: &PresentationConfig) -> cgmath::Vector3<f32> {
    let offset: cgmath::Vector3<f32> = config.pivot_offset.into();
    match scene.root.bounding_box() {
        Some(bounds) => {
            let center = bounds.center();
            offset - cgmath::Vector3::new(center.x, center.y, center.z) * config.scale
        }
        None => offset,
    }
}

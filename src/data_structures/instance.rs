//! Local transformation data for scene graph nodes.
//!
//! An `Instance` is a position, rotation and scale triple. Nodes store their
//! local transform as an `Instance`; world transforms are obtained by
//! multiplying parents into children (`parent * local`).

use std::ops::Mul;

use cgmath::{One, Rotation3};

/// Transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_scale(factor: f32) -> Self {
        Self {
            scale: cgmath::Vector3::new(factor, factor, factor),
            ..Default::default()
        }
    }

    /// Builds a transform from a translation and intrinsic XYZ Euler angles in radians.
    pub fn from_euler(position: [f32; 3], rotation: [f32; 3]) -> Self {
        let rotation = cgmath::Quaternion::from_angle_x(cgmath::Rad(rotation[0]))
            * cgmath::Quaternion::from_angle_y(cgmath::Rad(rotation[1]))
            * cgmath::Quaternion::from_angle_z(cgmath::Rad(rotation[2]));
        Self {
            position: position.into(),
            rotation,
            ..Default::default()
        }
    }

    pub fn from_axis_angle(axis: cgmath::Vector3<f32>, angle: cgmath::Rad<f32>) -> Self {
        Self {
            rotation: cgmath::Quaternion::from_axis_angle(axis, angle),
            ..Default::default()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

//! Per-instance configuration of a preview.
//!
//! Every knob lives in one of the structs below and is handed to the widget on
//! construction. Defaults reproduce the hero preview: a gentle spin around the
//! Y axis at 0.3 rad/s, unit scale, no pivot fine tuning.

use std::path::PathBuf;

use anyhow::ensure;

use crate::{fallback::FallbackPolicy, resources::reference::AssetReference};

/// Asset substituted when the requested one cannot be loaded.
pub const DEFAULT_FALLBACK: &str = "/torus3.glb";
/// Directory holding the Draco decoder.
pub const DEFAULT_DECODER_PATH: &str = "draco";

pub const DEFAULT_LOADING_LABEL: &str = "Loading 3D…";
pub const DEFAULT_FALLBACK_LABEL: &str = "Loading fallback…";
pub const DEFAULT_PLACEHOLDER: &str = "3D preview unavailable";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> cgmath::Vector3<f32> {
        match self {
            Axis::X => cgmath::Vector3::unit_x(),
            Axis::Y => cgmath::Vector3::unit_y(),
            Axis::Z => cgmath::Vector3::unit_z(),
        }
    }
}

/// Continuous spin of the displayed model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoRotate {
    pub enabled: bool,
    /// Radians per second.
    pub speed: f32,
    pub axis: Axis,
}

impl Default for AutoRotate {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.3,
            axis: Axis::Y,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PresentationConfig {
    pub scale: f32,
    pub position: [f32; 3],
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: [f32; 3],
    pub auto_rotate: AutoRotate,
    /// Added to the pivot after the model was centered on its bounding box.
    pub pivot_offset: [f32; 3],
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: [0.0; 3],
            rotation: [0.0; 3],
            auto_rotate: AutoRotate::default(),
            pivot_offset: [0.0; 3],
        }
    }
}

/// Replaces every material of a loaded model with one standard material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialOverride {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
}

impl MaterialOverride {
    pub fn with_hex(mut self, hex: &str) -> anyhow::Result<Self> {
        self.color = parse_hex_color(hex)?;
        Ok(self)
    }
}

impl Default for MaterialOverride {
    fn default() -> Self {
        Self {
            // #c084fc
            color: [192.0 / 255.0, 132.0 / 255.0, 252.0 / 255.0],
            metalness: 0.2,
            roughness: 0.6,
        }
    }
}

/// Parses `#rrggbb` or `#rgb` into linear 0..1 components.
pub fn parse_hex_color(hex: &str) -> anyhow::Result<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    ensure!(digits.is_ascii(), "{:?} is not a valid colour", hex);
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => anyhow::bail!("{:?} is not a #rgb or #rrggbb colour", hex),
    };
    let mut color = [0.0; 3];
    for (i, channel) in color.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16)
            .map_err(|e| anyhow::anyhow!("{:?} is not a valid colour: {}", hex, e))?;
        *channel = byte as f32 / 255.0;
    }
    Ok(color)
}

/// Everything a single preview widget needs.
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    pub asset: Option<AssetReference>,
    pub fallback: FallbackPolicy,
    pub presentation: PresentationConfig,
    pub material_override: Option<MaterialOverride>,
    pub decoder_path: PathBuf,
    pub loading_label: String,
    pub fallback_label: String,
    pub placeholder: String,
}

impl PreviewConfig {
    pub fn new(asset: impl Into<AssetReference>) -> Self {
        Self {
            asset: Some(asset.into()),
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_presentation(mut self, presentation: PresentationConfig) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_material_override(mut self, material_override: MaterialOverride) -> Self {
        self.material_override = Some(material_override);
        self
    }

    /// Rejects values that would make the presentation transform degenerate.
    pub fn validate(&self) -> anyhow::Result<()> {
        let presentation = &self.presentation;
        ensure!(
            presentation.scale.is_finite() && presentation.scale > 0.0,
            "scale must be a positive number, got {}",
            presentation.scale
        );
        ensure!(
            presentation.auto_rotate.speed.is_finite(),
            "rotation speed must be finite"
        );
        let vectors = [
            presentation.position,
            presentation.rotation,
            presentation.pivot_offset,
        ];
        ensure!(
            vectors.iter().flatten().all(|v| v.is_finite()),
            "position, rotation and pivot offset must be finite"
        );
        if let Some(material_override) = &self.material_override {
            ensure!(
                material_override.color.iter().all(|c| c.is_finite()),
                "override colour must be finite"
            );
        }
        Ok(())
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            asset: None,
            fallback: FallbackPolicy::new(DEFAULT_FALLBACK),
            presentation: PresentationConfig::default(),
            material_override: None,
            decoder_path: PathBuf::from(DEFAULT_DECODER_PATH),
            loading_label: DEFAULT_LOADING_LABEL.to_string(),
            fallback_label: DEFAULT_FALLBACK_LABEL.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

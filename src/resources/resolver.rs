//! Turning an [`AssetReference`] into a render-ready scene.
//!
//! The structured glTF parse is always tried first. When it fails, the
//! fetched bytes are run through [`format::detect`] and, if they look like
//! OBJ text, parsed again with the OBJ loader. Every error is reported as a
//! [`FailureSignal`]; nothing panics past `resolve`.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::MaterialOverride,
    data_structures::{model::Material, scene_graph::SceneNode},
    error::LoadError,
    resources::{
        draco::{DracoCli, MeshDecoder},
        fetch::AssetSource,
        format::{self, FormatTag},
        load_model_gltf, load_model_obj,
        reference::AssetReference,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Pending,
    Success,
    Failed,
}

/// One parse of one reference with one format.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadAttempt {
    pub reference: AssetReference,
    pub format: FormatTag,
    pub outcome: AttemptOutcome,
}

impl LoadAttempt {
    fn new(reference: &AssetReference, format: FormatTag) -> Self {
        Self {
            reference: reference.clone(),
            format,
            outcome: AttemptOutcome::Pending,
        }
    }

    fn record(mut self, succeeded: bool, attempts: &mut Vec<LoadAttempt>) {
        self.outcome = if succeeded {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::Failed
        };
        attempts.push(self);
    }
}

/// The error of a failed resolution together with the attempts that led to it.
#[derive(Clone, Debug, Error)]
#[error("{error}")]
pub struct FailureSignal {
    pub error: LoadError,
    pub attempts: Vec<LoadAttempt>,
}

/// A parsed scene with presentation defaults applied.
#[derive(Clone, Debug)]
pub struct ResolvedScene {
    pub reference: AssetReference,
    pub format: FormatTag,
    pub root: SceneNode,
    pub materials: Vec<Material>,
    /// The materials were replaced by a [`MaterialOverride`].
    pub material_override_applied: bool,
}

/// Source resolver. Cloning is cheap: source and decoder are shared.
pub struct Resolver<S> {
    source: Arc<S>,
    decoder: Arc<dyn MeshDecoder>,
    material_override: Option<MaterialOverride>,
}

impl<S> Clone for Resolver<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            decoder: self.decoder.clone(),
            material_override: self.material_override.clone(),
        }
    }
}

impl<S: AssetSource> Resolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            decoder: Arc::new(DracoCli::default()),
            material_override: None,
        }
    }

    pub fn with_decoder(mut self, decoder: impl MeshDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn with_material_override(mut self, material_override: Option<MaterialOverride>) -> Self {
        self.material_override = material_override;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn resolve(&self, reference: &AssetReference) -> Result<ResolvedScene, FailureSignal> {
        let mut attempts = Vec::new();

        let bytes = match self.source.fetch(reference).await {
            Ok(bytes) => bytes,
            Err(error) => {
                LoadAttempt::new(reference, FormatTag::Gltf).record(false, &mut attempts);
                return Err(FailureSignal { error, attempts });
            }
        };

        let gltf = load_model_gltf(&*self.source, reference, &bytes, &*self.decoder).await;
        LoadAttempt::new(reference, FormatTag::Gltf).record(gltf.is_ok(), &mut attempts);
        let gltf_error = match gltf {
            Ok((root, materials)) => return Ok(self.finish(reference, FormatTag::Gltf, root, materials)),
            Err(e) => e,
        };
        log::debug!("{} is not a glTF scene: {:#}", reference, gltf_error);

        let error = match format::detect(&bytes) {
            FormatTag::Obj => {
                let obj = load_model_obj(&*self.source, reference, &bytes).await;
                LoadAttempt::new(reference, FormatTag::Obj).record(obj.is_ok(), &mut attempts);
                match obj {
                    Ok((root, materials)) => {
                        return Ok(self.finish(reference, FormatTag::Obj, root, materials));
                    }
                    Err(e) => classify(e, reference, FormatTag::Obj),
                }
            }
            FormatTag::Gltf => classify(gltf_error, reference, FormatTag::Gltf),
            FormatTag::Unknown => LoadError::UnknownFormat {
                reference: reference.clone(),
            },
        };
        Err(FailureSignal { error, attempts })
    }

    fn finish(
        &self,
        reference: &AssetReference,
        format: FormatTag,
        mut root: SceneNode,
        mut materials: Vec<Material>,
    ) -> ResolvedScene {
        apply_presentation_defaults(&mut root, &mut materials, self.material_override.as_ref());
        log::info!("Loaded {} as {}", reference, format);
        ResolvedScene {
            reference: reference.clone(),
            format,
            root,
            materials,
            material_override_applied: self.material_override.is_some(),
        }
    }
}

/// Failures of nested fetches keep their class, everything else is a decode failure.
fn classify(error: anyhow::Error, reference: &AssetReference, format: FormatTag) -> LoadError {
    match error.downcast::<LoadError>() {
        Ok(load_error) => load_error,
        Err(error) => LoadError::Decode {
            reference: reference.clone(),
            format,
            reason: format!("{:#}", error),
        },
    }
}

/// Shadows on every mesh node; materials either normalized or replaced by the override.
pub fn apply_presentation_defaults(
    root: &mut SceneNode,
    materials: &mut Vec<Material>,
    material_override: Option<&MaterialOverride>,
) {
    if let Some(material_override) = material_override {
        *materials = vec![Material::standard(material_override)];
    } else {
        materials.iter_mut().for_each(Material::normalize);
    }
    root.traverse_mut(&mut |node| {
        if node.meshes.is_empty() {
            return;
        }
        node.cast_shadow = true;
        node.receive_shadow = true;
        if material_override.is_some() {
            node.meshes.iter_mut().for_each(|mesh| mesh.material = Some(0));
        }
    });
}

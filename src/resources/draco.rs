//! Support for glTF primitives compressed with `KHR_draco_mesh_compression`.
//!
//! The `gltf` crate refuses documents that require extensions it does not know,
//! so the extension is removed from `extensionsRequired` before validation and
//! the compressed buffer views are handed to a [`MeshDecoder`].

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    path::PathBuf,
};

use futures::future::LocalBoxFuture;

use crate::{config::DEFAULT_DECODER_PATH, data_structures::model, resources::mesh};

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Decompresses a single Draco encoded primitive into a triangle mesh.
///
/// Decoding is asynchronous so an external decoder never blocks the loop
/// that drives the preview.
pub trait MeshDecoder {
    fn decode<'a>(&'a self, compressed: &'a [u8]) -> LocalBoxFuture<'a, anyhow::Result<model::Mesh>>;
}

/// Runs the `draco_decoder` executable found in a configurable directory.
///
/// The decoder writes an OBJ file which is then read back with `tobj`.
#[derive(Clone, Debug)]
pub struct DracoCli {
    path: PathBuf,
}

impl DracoCli {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn executable(&self) -> PathBuf {
        let name = if cfg!(windows) {
            "draco_decoder.exe"
        } else {
            "draco_decoder"
        };
        self.path.join(name)
    }
}

impl Default for DracoCli {
    fn default() -> Self {
        Self::new(DEFAULT_DECODER_PATH)
    }
}

impl MeshDecoder for DracoCli {
    #[cfg(target_arch = "wasm32")]
    fn decode<'a>(&'a self, _: &'a [u8]) -> LocalBoxFuture<'a, anyhow::Result<model::Mesh>> {
        let unsupported: anyhow::Result<model::Mesh> = Err(anyhow::anyhow!(
            "{} cannot be started from the browser",
            self.executable().display()
        ));
        Box::pin(futures::future::ready(unsupported))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn decode<'a>(&'a self, compressed: &'a [u8]) -> LocalBoxFuture<'a, anyhow::Result<model::Mesh>> {
        Box::pin(async move {
            // Removed again when `scratch` is dropped
            let scratch = tempfile::tempdir()?;
            let input = scratch.path().join("primitive.drc");
            let output = scratch.path().join("primitive.obj");
            tokio::fs::write(&input, compressed).await?;

            let executable = self.executable();
            let run = tokio::process::Command::new(&executable)
                .arg("-i")
                .arg(&input)
                .arg("-o")
                .arg(&output)
                .output()
                .await
                .map_err(|e| anyhow::anyhow!("could not start {}: {}", executable.display(), e))?;
            if !run.status.success() {
                anyhow::bail!(
                    "{} exited with {}: {}",
                    executable.display(),
                    run.status,
                    String::from_utf8_lossy(&run.stderr).trim()
                );
            }
            let obj_text = tokio::fs::read_to_string(&output).await?;
            mesh_from_obj(&obj_text)
        })
    }
}

/// Merges every object of an OBJ text into one mesh.
pub fn mesh_from_obj(obj_text: &str) -> anyhow::Result<model::Mesh> {
    let (models, _) = tobj::load_obj_buf(
        &mut BufReader::new(Cursor::new(obj_text)),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let mut merged = model::Mesh::default();
    for mesh in mesh::load_meshes(&models, "draco primitive") {
        let mesh = mesh?;
        let base = merged.positions.len() as u32;
        merged.positions.extend(mesh.positions);
        merged.normals.extend(mesh.normals);
        merged.tex_coords.extend(mesh.tex_coords);
        merged.indices.extend(mesh.indices.into_iter().map(|i| i + base));
    }
    if merged.is_empty() {
        anyhow::bail!("the decoded primitive contains no triangles");
    }
    Ok(merged)
}

/// Maps `(mesh index, primitive index)` to the buffer view holding the compressed data.
pub fn compressed_primitives(root: &serde_json::Value) -> HashMap<(usize, usize), usize> {
    let mut primitives = HashMap::new();
    let Some(meshes) = root.get("meshes").and_then(|m| m.as_array()) else {
        return primitives;
    };
    for (mesh_idx, mesh) in meshes.iter().enumerate() {
        let Some(prims) = mesh.get("primitives").and_then(|p| p.as_array()) else {
            continue;
        };
        for (prim_idx, prim) in prims.iter().enumerate() {
            let view = prim
                .get("extensions")
                .and_then(|e| e.get(DRACO_EXTENSION))
                .and_then(|d| d.get("bufferView"))
                .and_then(|v| v.as_u64());
            if let Some(view) = view {
                primitives.insert((mesh_idx, prim_idx), view as usize);
            }
        }
    }
    primitives
}

/// Removes the Draco extension from `extensionsRequired` so the document validates.
pub fn strip_required_extension(root: &mut serde_json::Value) {
    if let Some(required) = root
        .get_mut("extensionsRequired")
        .and_then(|r| r.as_array_mut())
    {
        required.retain(|ext| ext.as_str() != Some(DRACO_EXTENSION));
    }
}

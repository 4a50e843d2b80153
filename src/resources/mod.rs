use std::{
    borrow::Cow,
    collections::HashMap,
    io::{BufReader, Cursor},
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        instance::Instance,
        model::{self, Side},
        scene_graph::SceneNode,
    },
    resources::{draco::MeshDecoder, fetch::AssetSource, reference::AssetReference},
};

/**
 * This module contains all logic for loading meshes and materials from external files.
 */
pub mod draco;
pub mod fetch;
pub mod format;
pub mod mesh;
pub mod reference;
pub mod resolver;

// Deeper hierarchies only show up in broken or cyclic documents
const MAX_NODE_DEPTH: usize = 64;

pub async fn load_model_obj<S: AssetSource>(
    source: &S,
    reference: &AssetReference,
    bytes: &[u8],
) -> anyhow::Result<(SceneNode, Vec<model::Material>)> {
    let obj_text = String::from_utf8_lossy(bytes);
    let obj_cursor = Cursor::new(obj_text.as_bytes());
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mtl = reference.join(&p);
            match source.fetch(&mtl).await {
                Ok(mat_bytes) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_bytes))),
                Err(e) => {
                    log::warn!("Material library of {} could not be loaded: {}", reference, e);
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await?;

    let materials = match obj_materials {
        Ok(materials) => mesh::load_materials(&materials),
        Err(e) => {
            log::warn!("{} is rendered with default materials: {}", reference, e);
            Vec::new()
        }
    };
    let meshes = mesh::load_meshes(&models, reference.as_str());
    let meshes = meshes
        .into_iter()
        .enumerate()
        .filter_map(|(idx, result)| match result {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::warn!(
                    "Mesh at index {} in file {} could not be loaded: {}",
                    idx,
                    reference,
                    e
                );
                None
            }
        })
        .collect::<Vec<_>>();
    if meshes.is_empty() {
        anyhow::bail!("no drawable mesh found");
    }

    // Material ids point into the mtl library; drop the ones that did not load
    let mut root = SceneNode::container(reference.as_str());
    for mut mesh in meshes {
        if mesh.material.is_some_and(|id| id >= materials.len()) {
            mesh.material = None;
        }
        let name = mesh.name.clone();
        root.add_child(SceneNode::with_meshes(Some(&name), vec![mesh]));
    }
    Ok((root, materials))
}

pub async fn load_model_gltf<S: AssetSource>(
    source: &S,
    reference: &AssetReference,
    bytes: &[u8],
    decoder: &dyn MeshDecoder,
) -> anyhow::Result<(SceneNode, Vec<model::Material>)> {
    let (json, blob) = split_container(bytes)?;
    let mut raw: serde_json::Value =
        serde_json::from_slice(&json).context("the JSON chunk is not valid JSON")?;
    let compressed = draco::compressed_primitives(&raw);
    let document = if compressed.is_empty() {
        gltf::Gltf::from_slice(&json)?.document
    } else {
        draco::strip_required_extension(&mut raw);
        gltf::Gltf::from_slice(&serde_json::to_vec(&raw)?)?.document
    };

    // Load buffers
    let blob = blob.as_deref();
    let buffer_futures = document.buffers().map(|buffer| async move {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .context("buffer refers to a binary chunk the file does not have")?
                .to_vec(),
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                fetch::decode_data_uri(reference, uri)?
            }
            gltf::buffer::Source::Uri(uri) => source.fetch(&reference.join(uri)).await?,
        };
        if data.len() < buffer.length() {
            anyhow::bail!(
                "buffer {} holds {} bytes but declares {}",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
        Ok::<_, anyhow::Error>(data)
    });
    let buffer_data = futures::future::join_all(buffer_futures)
        .await
        .into_iter()
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Load materials
    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let mut mat = model::Material::new(material.name().unwrap_or("Default"));
            mat.base_color = pbr.base_color_factor();
            mat.metallic = pbr.metallic_factor();
            mat.roughness = pbr.roughness_factor();
            mat.side = if material.double_sided() {
                Side::Double
            } else {
                Side::Front
            };
            mat
        })
        .collect::<Vec<_>>();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("the document contains no scene")?;
    let decoded = decode_compressed(&document, &buffer_data, &compressed, decoder).await?;
    let loader = NodeLoader {
        buffers: &buffer_data,
        decoded: &decoded,
    };
    let mut models = Vec::new();
    for node in scene.nodes() {
        models.push(loader.to_scene_node(node, 0)?);
    }

    let root_node = if models.len() == 1 {
        models.remove(0)
    } else {
        let mut root_node = SceneNode::container(scene.name().unwrap_or("Scene"));
        root_node.children = models;
        root_node
    };
    if root_node.mesh_count() == 0 {
        anyhow::bail!("the scene contains no meshes");
    }

    Ok((root_node, materials))
}

/// Splits a GLB container into its JSON and binary chunk; plain glTF JSON passes through.
fn split_container(bytes: &[u8]) -> anyhow::Result<(Cow<'_, [u8]>, Option<Vec<u8>>)> {
    if bytes.starts_with(b"glTF") {
        let glb = gltf::Glb::from_slice(bytes)?;
        Ok((glb.json, glb.bin.map(Cow::into_owned)))
    } else {
        Ok((Cow::Borrowed(bytes), None))
    }
}

/// Runs the decoder on every compressed primitive, keyed by `(mesh index, primitive index)`.
async fn decode_compressed(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    compressed: &HashMap<(usize, usize), usize>,
    decoder: &dyn MeshDecoder,
) -> anyhow::Result<HashMap<(usize, usize), model::Mesh>> {
    let decodes = compressed.iter().map(|(&key, &view_idx)| async move {
        let view = document
            .views()
            .nth(view_idx)
            .with_context(|| format!("compressed primitive points to missing view {}", view_idx))?;
        let bytes = buffers
            .get(view.buffer().index())
            .and_then(|data| data.get(view.offset()..view.offset() + view.length()))
            .context("compressed buffer view is out of bounds")?;
        let mesh = decoder.decode(bytes).await?;
        Ok::<_, anyhow::Error>((key, mesh))
    });
    futures::future::join_all(decodes)
        .await
        .into_iter()
        .collect()
}

struct NodeLoader<'a> {
    buffers: &'a [Vec<u8>],
    decoded: &'a HashMap<(usize, usize), model::Mesh>,
}

impl NodeLoader<'_> {
    fn to_scene_node(&self, node: gltf::Node, depth: usize) -> anyhow::Result<SceneNode> {
        if depth > MAX_NODE_DEPTH {
            anyhow::bail!("node hierarchy is deeper than {}", MAX_NODE_DEPTH);
        }
        let mut meshes = Vec::new();
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "Skipping {:?} primitive of mesh {:?}, only triangles are supported.",
                        primitive.mode(),
                        mesh.name()
                    );
                    continue;
                }
                let key = (mesh.index(), primitive.index());
                let mut model_mesh = match self.decoded.get(&key) {
                    Some(decoded) => decoded.clone(),
                    None => self.read_primitive(&primitive)?,
                };
                model_mesh.name = mesh.name().unwrap_or("unknown_mesh").to_string();
                model_mesh.material = primitive.material().index();
                model_mesh.validate()?;
                model_mesh.ensure_normals();
                meshes.push(model_mesh);
            }
        }

        let mut scene_node = SceneNode::with_meshes(node.name(), meshes);
        let (position, rotation, scale) = node.transform().decomposed();
        scene_node.local = Instance {
            position: position.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        };
        for child in node.children() {
            scene_node.add_child(self.to_scene_node(child, depth + 1)?);
        }
        Ok(scene_node)
    }

    fn read_primitive(&self, primitive: &gltf::Primitive) -> anyhow::Result<model::Mesh> {
        let reader =
            primitive.reader(|buffer| self.buffers.get(buffer.index()).map(Vec::as_slice));

        let positions = reader
            .read_positions()
            .context("primitive has no POSITION attribute")?
            .collect::<Vec<_>>();
        let normals = reader
            .read_normals()
            .map(|normals| normals.collect())
            .unwrap_or_default();
        let tex_coords = reader
            .read_tex_coords(0)
            .map(|tex_coords| tex_coords.into_f32().collect())
            .unwrap_or_default();
        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        Ok(model::Mesh {
            positions,
            normals,
            tex_coords,
            indices,
            ..Default::default()
        })
    }
}

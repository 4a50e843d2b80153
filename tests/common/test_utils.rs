#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use base64::Engine;
use futures::future::LocalBoxFuture;
use flow_preview::{
    AssetReference, AssetSource, LoadError,
    data_structures::model::Mesh,
    resources::draco::MeshDecoder,
};
use serde_json::json;

pub(crate) const FALLBACK: &str = "/torus3.glb";
pub(crate) const TRIANGLE_POSITIONS: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];

/// In-memory asset source that records every fetch.
#[derive(Clone, Default)]
pub(crate) struct MemorySource {
    assets: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, uri: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(uri, bytes);
        self
    }

    pub(crate) fn insert(&self, uri: &str, bytes: impl Into<Vec<u8>>) {
        self.assets
            .lock()
            .unwrap()
            .insert(uri.to_string(), bytes.into());
    }

    pub(crate) fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub(crate) fn fetch_count(&self, uri: &str) -> usize {
        self.fetches().iter().filter(|f| f.as_str() == uri).count()
    }
}

impl AssetSource for MemorySource {
    async fn fetch(&self, reference: &AssetReference) -> Result<Vec<u8>, LoadError> {
        self.fetches
            .lock()
            .unwrap()
            .push(reference.as_str().to_string());
        self.assets
            .lock()
            .unwrap()
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| LoadError::network(reference, "404 Not Found"))
    }
}

/// Positions followed by u16 indices, 42 bytes.
pub(crate) fn triangle_bin() -> Vec<u8> {
    let mut bin = Vec::new();
    for position in TRIANGLE_POSITIONS {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    bin
}

/// A single red triangle. Without `buffer_uri` the buffer lives in the GLB binary chunk.
pub(crate) fn triangle_document(buffer_uri: Option<&str>) -> serde_json::Value {
    let mut buffer = json!({ "byteLength": 42 });
    if let Some(uri) = buffer_uri {
        buffer["uri"] = json!(uri);
    }
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "Triangle" }],
        "meshes": [{
            "name": "Triangle",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{
            "name": "Red",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.5,
                "roughnessFactor": 0.25
            }
        }],
        "buffers": [buffer],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [2.0, 2.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    })
}

pub(crate) fn triangle_glb() -> Vec<u8> {
    let json = serde_json::to_vec(&triangle_document(None)).unwrap();
    glb(json, triangle_bin())
}

/// glTF JSON with the buffer inlined as a base64 data URI.
pub(crate) fn triangle_gltf_embedded() -> Vec<u8> {
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(triangle_bin())
    );
    serde_json::to_vec(&triangle_document(Some(&uri))).unwrap()
}

/// glTF JSON whose buffer is a sibling file named `bin_name`.
pub(crate) fn triangle_gltf_external(bin_name: &str) -> Vec<u8> {
    serde_json::to_vec(&triangle_document(Some(bin_name))).unwrap()
}

/// Packs a JSON and a binary chunk into a GLB container.
pub(crate) fn glb(mut json: Vec<u8>, mut bin: Vec<u8>) -> Vec<u8> {
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x004E4942u32.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}

pub(crate) const TRIANGLE_OBJ: &str = "\
# exported by hand
mtllib triangle.mtl
o Triangle
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 0.0 2.0 0.0
usemtl Purple
f 1 2 3
";

pub(crate) const TRIANGLE_MTL: &str = "\
newmtl Purple
Kd 0.5 0.2 0.8
d 1.0
";

pub(crate) const DRACO_PAYLOAD: &[u8] = b"DRACO\x02\x02compressed-triangle";

/// A glTF whose only primitive requires `KHR_draco_mesh_compression`.
pub(crate) fn draco_gltf() -> Vec<u8> {
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(DRACO_PAYLOAD)
    );
    let document = json!({
        "asset": { "version": "2.0" },
        "extensionsRequired": ["KHR_draco_mesh_compression"],
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "name": "Compressed",
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "extensions": {
                    "KHR_draco_mesh_compression": {
                        "bufferView": 0,
                        "attributes": { "POSITION": 0 }
                    }
                }
            }]
        }],
        "buffers": [{ "byteLength": DRACO_PAYLOAD.len(), "uri": uri }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": DRACO_PAYLOAD.len() }],
        "accessors": [
            {
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [2.0, 2.0, 0.0]
            },
            { "componentType": 5125, "count": 3, "type": "SCALAR" }
        ]
    });
    serde_json::to_vec(&document).unwrap()
}

/// Decoder that checks it got the compressed view and returns the triangle.
#[derive(Clone, Default)]
pub(crate) struct StubDecoder {
    calls: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl StubDecoder {
    pub(crate) fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().clone()
    }
}

impl MeshDecoder for StubDecoder {
    fn decode<'a>(&'a self, compressed: &'a [u8]) -> LocalBoxFuture<'a, anyhow::Result<Mesh>> {
        self.calls.lock().unwrap().push(compressed.to_vec());
        Box::pin(async move {
            anyhow::ensure!(compressed == DRACO_PAYLOAD, "unexpected payload");
            Ok(Mesh {
                positions: TRIANGLE_POSITIONS.to_vec(),
                indices: vec![0, 1, 2],
                ..Default::default()
            })
        })
    }
}

pub(crate) fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

//! flow-preview
//!
//! A resilient 3D model preview for native and WASM hosts. A preview resolves
//! an asset reference into a scene graph, detects glTF and OBJ payloads by
//! content rather than by extension, falls back to a single substitute asset
//! when loading fails and degrades to a text placeholder when that fails too.
//! The resolved scene is centred, scaled and slowly spun for display.
//!
//! High-level modules
//! - `config`: per-instance presentation, material and fallback settings
//! - `data_structures`: scene data models (meshes, materials, instances, scene graph)
//! - `error`: the load error taxonomy shared by all stages
//! - `fallback`: the primary / fallback / exhausted state machine
//! - `flow`: hosting previews in an event loop, logger setup
//! - `presentation`: placing a resolved scene in the viewport
//! - `preview`: the widget tying resolution, fallback and presentation together
//! - `resources`: fetching, format detection and glTF / OBJ / Draco decoding
//!

pub mod config;
pub mod data_structures;
pub mod error;
pub mod fallback;
pub mod flow;
pub mod presentation;
pub mod preview;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::{AutoRotate, Axis, MaterialOverride, PresentationConfig, PreviewConfig};
pub use error::LoadError;
pub use fallback::{ChainState, FallbackChain, FallbackPolicy};
pub use flow::{PreviewHost, init_logging};
pub use presentation::Presentation;
pub use preview::{Completion, ModelPreview, PendingLoad, View};
pub use resources::{
    fetch::{AssetSource, AssetStore},
    format::FormatTag,
    reference::AssetReference,
    resolver::{ResolvedScene, Resolver},
};

//! Scene data: nodes, meshes, materials and transforms.
//!
//! - `instance` holds position, rotation and scale of a node
//! - `model` contains CPU side mesh and material definitions
//! - `scene_graph` enables hierarchical scene organization and bounds

pub mod instance;
pub mod model;
pub mod scene_graph;

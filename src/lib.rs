//! Engine-side model import pipeline.
//!
//! This library converts an externally-authored asset (node hierarchy,
//! meshes, skeleton, animation clips) into the engine's scene
//! representation: a [`ModelNode`](asset::node::ModelNode) tree, flat
//! mesh buffers, an avatar and animation clips bound to it. The concrete
//! file format is kept behind the source-graph traits in
//! [`asset::source`]; an adapter over the `gltf` crate is provided in
//! [`asset::loader`].
//!
pub mod asset;
pub mod importer;
pub mod scene;

pub use asset::model::Model;
pub use importer::{ImportSettings, ModelImporter};

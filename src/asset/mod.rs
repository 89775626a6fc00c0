//! Asset data model produced by the import pipeline.

pub mod animation;
pub mod avatar;
pub mod builtin;
/// Adapters turning concrete file formats into source graphs
pub mod loader;
pub mod mesh;
pub mod model;
pub mod node;
pub mod normal;
pub mod source;
pub mod tangent;

//! File-format adapters producing [`crate::asset::source`] graphs.

pub mod gltf;

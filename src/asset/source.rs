//! Read-only capability traits over an externally parsed asset graph.
//!
//! The import pipeline consumes these instead of any concrete parser
//! representation; [`crate::asset::loader`] adapts real file formats onto
//! them and tests drive the pipeline with in-memory fakes.

use super::node::{DecomposedTransform, NodeTransform};

/// One node of the source hierarchy.
pub trait SourceNode {
    fn name(&self) -> &str;
    fn local_transform(&self) -> NodeTransform;
    /// Ids into the asset's mesh table. The id is the mesh's identity for
    /// deduplication: two nodes sharing an id share one extracted mesh.
    fn mesh_ids(&self) -> &[usize];
    fn child_count(&self) -> usize;
    fn child(&self, index: usize) -> &dyn SourceNode;
}

/// One bone channel of a source mesh: the bound node's name and the
/// vertices it influences.
#[derive(Debug, Clone)]
pub struct SourceBone {
    pub node_name: String,
    pub weights: Vec<(u32, f32)>,
}

/// One mesh record. Every attribute except positions is optional.
pub trait SourceMesh {
    fn name(&self) -> Option<&str>;
    fn positions(&self) -> Option<&[[f32; 3]]>;
    fn normals(&self) -> Option<&[[f32; 3]]>;
    fn tangents(&self) -> Option<&[[f32; 4]]>;
    fn uvs(&self) -> Option<&[[f32; 2]]>;
    /// Per-face vertex index lists. Only triangles survive extraction.
    fn faces(&self) -> &[Vec<u32>];
    fn skin(&self) -> &[SourceBone];
    fn material_id(&self) -> Option<usize>;
}

#[derive(Debug, Clone)]
pub struct SourceKeyframe {
    pub time: f32,
    pub transform: DecomposedTransform,
}

#[derive(Debug, Clone)]
pub struct SourceTrack {
    pub node_name: String,
    pub keyframes: Vec<SourceKeyframe>,
}

pub trait SourceAnimation {
    fn name(&self) -> Option<&str>;
    fn tracks(&self) -> &[SourceTrack];
}

/// A fully loaded source asset graph.
pub trait SourceAsset {
    fn root(&self) -> &dyn SourceNode;
    fn mesh_count(&self) -> usize;
    fn mesh(&self, id: usize) -> Option<&dyn SourceMesh>;
    fn animation_count(&self) -> usize;
    fn animation(&self, id: usize) -> Option<&dyn SourceAnimation>;
    fn material_names(&self) -> &[String];
}

use std::sync::OnceLock;

use crate::scene::instantiate::InstancePlan;

use super::{animation::AnimationClip, avatar::Avatar, mesh::Mesh, node::ModelNodeTree};

/// The aggregate produced by one import: the node tree, the flat mesh
/// list with its parallel material indices, the avatar and the animation
/// clips. Created once during import and immutable afterwards.
#[derive(Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    /// Imported material names; the material system itself is external.
    /// Empty when the source names none.
    pub materials: Vec<String>,
    /// Same length as `meshes`. Every entry is a valid index into
    /// `materials` whenever that list is non-empty; sources without
    /// materials leave 0 placeholders.
    pub material_index_per_mesh: Vec<usize>,
    pub tree: ModelNodeTree,
    pub avatar: Avatar,
    pub animations: Vec<AnimationClip>,
    /// Memoized instantiation bookkeeping, built on the first
    /// `instantiate` call and reused afterwards. The model never changes
    /// after import, so the memo never needs invalidation.
    pub(crate) instance_plan: OnceLock<InstancePlan>,
}

impl Model {
    /// First mesh of the model. `None` only for transform-only assets,
    /// which import successfully without any mesh.
    pub fn main_mesh(&self) -> Option<&Mesh> {
        self.meshes.first()
    }

    pub fn main_animation(&self) -> Option<&AnimationClip> {
        self.animations.first()
    }
}

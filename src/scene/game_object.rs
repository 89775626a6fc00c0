use glam::Mat4;

use crate::asset::{
    animation::AnimationClip,
    mesh::Mesh,
    node::NodeTransform,
};

/// Renders one mesh on its game object. The mesh data is owned by the
/// instance, so instances never alias each other or the source model.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub mesh: Mesh,
    /// Index into the source model's material name table.
    pub material_index: usize,
    /// Bone slot to instance node index, parallel to `mesh.bones`.
    /// `None` marks a bone the hierarchy could not satisfy.
    pub bones: Vec<Option<usize>>,
}

/// One node of an instantiated hierarchy. Trees are owned top-down; the
/// `node_index` ties each object back to the model tree node it was
/// spawned from.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub name: String,
    pub transform: NodeTransform,
    pub node_index: usize,
    pub children: Vec<GameObject>,
    pub renderers: Vec<MeshRenderer>,
    /// Clips carried by the instance; populated on the root only.
    pub animations: Vec<AnimationClip>,
}

impl GameObject {
    /// First object with the given name, in pre-order.
    pub fn find(&self, name: &str) -> Option<&GameObject> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut GameObject> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Local-to-world transform of the object at `node_index`, composed
    /// from this object down.
    pub fn world_transform(&self, node_index: usize) -> Option<Mat4> {
        self.world_transform_from(Mat4::IDENTITY, node_index)
    }

    fn world_transform_from(&self, parent: Mat4, node_index: usize) -> Option<Mat4> {
        let world = parent * Mat4::from(self.transform);
        if self.node_index == node_index {
            return Some(world);
        }
        self.children
            .iter()
            .find_map(|child| child.world_transform_from(world, node_index))
    }

    /// Poses the subtree at `time`: every object whose name has a track
    /// in the clip takes the sampled local transform, everything else
    /// keeps its current one.
    pub fn apply_clip(&mut self, clip: &AnimationClip, time: f32) {
        if let Some(value) = clip.track(&self.name).and_then(|track| track.sample(time)) {
            self.transform = NodeTransform::Decomposed(value);
        }
        for child in &mut self.children {
            child.apply_clip(clip, time);
        }
    }
}

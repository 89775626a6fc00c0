//! Spawning owned [`GameObject`] trees from a [`Model`].

use log::warn;

use crate::asset::{model::Model, node::ModelNode};

use super::{GameObject, MeshRenderer};

/// Instantiation bookkeeping shared by every instance of one model:
/// resolved bone bindings per mesh. Built once on the first
/// [`Model::instantiate`] call.
#[derive(Debug)]
pub(crate) struct InstancePlan {
    /// Parallel to the model's mesh list; inner vectors parallel each
    /// mesh's bone slots.
    bone_bindings: Vec<Vec<Option<usize>>>,
}

impl InstancePlan {
    fn build(model: &Model) -> Self {
        let bone_bindings = model
            .meshes
            .iter()
            .map(|mesh| {
                mesh.bones
                    .iter()
                    .map(|bone| {
                        let binding = model.avatar.node_index(bone);
                        if binding.is_none() {
                            warn!(
                                "model {:?}: mesh {:?} binds unknown bone {:?}",
                                model.name, mesh.name, bone
                            );
                        }
                        binding
                    })
                    .collect()
            })
            .collect();
        Self { bone_bindings }
    }
}

impl Model {
    /// Spawns an owned instance of the model hierarchy.
    ///
    /// Every call produces a fully independent tree; mutating one
    /// instance never affects another or the model itself. The root
    /// object carries clones of the model's animation clips. Like the
    /// tree builder, the walk is iterative with an explicit stack and
    /// the owned tree is assembled bottom-up, so arbitrarily deep
    /// hierarchies cannot overflow the call stack.
    pub fn instantiate(&self) -> GameObject {
        let plan = self.instance_plan.get_or_init(|| InstancePlan::build(self));

        let mut flat: Vec<(GameObject, Option<usize>)> = Vec::with_capacity(self.tree.len());
        let mut stack: Vec<(usize, Option<usize>)> = self
            .tree
            .root()
            .map(|root| vec![(root.index, None)])
            .unwrap_or_default();
        while let Some((index, parent)) = stack.pop() {
            let node = match self.tree.get(index) {
                Some(node) => node,
                None => continue,
            };
            let flat_index = flat.len();
            flat.push((self.spawn_object(node, plan), parent));
            for &child in &node.children {
                stack.push((child, Some(flat_index)));
            }
        }

        // Reattach in reverse creation order: a node's subtree is
        // complete before the node itself moves into its parent, and
        // siblings land in tree order.
        // A model without nodes still instantiates, as an empty carrier
        // object.
        let mut root = GameObject {
            name: self.name.clone(),
            transform: Default::default(),
            node_index: 0,
            children: Vec::new(),
            renderers: Vec::new(),
            animations: Vec::new(),
        };
        while let Some((object, parent)) = flat.pop() {
            match parent {
                Some(parent) => flat[parent].0.children.push(object),
                None => root = object,
            }
        }
        root.animations = self.animations.clone();
        root
    }

    fn spawn_object(&self, node: &ModelNode, plan: &InstancePlan) -> GameObject {
        let renderers = node
            .mesh_indices
            .iter()
            .filter_map(|&mesh_index| {
                let mesh = self.meshes.get(mesh_index)?;
                Some(MeshRenderer {
                    mesh: mesh.clone(),
                    material_index: self
                        .material_index_per_mesh
                        .get(mesh_index)
                        .copied()
                        .unwrap_or(0),
                    bones: plan.bone_bindings.get(mesh_index).cloned().unwrap_or_default(),
                })
            })
            .collect();
        GameObject {
            name: node.name.clone(),
            transform: node.transform,
            node_index: node.index,
            children: Vec::new(),
            renderers,
            animations: Vec::new(),
        }
    }
}

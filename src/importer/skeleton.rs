use std::collections::HashSet;

use log::warn;

use crate::asset::{avatar::Avatar, mesh::Mesh, node::ModelNodeTree};

/// Marks every tree node referenced by a mesh bone channel and collects
/// them into an [`Avatar`].
///
/// Registration order is pre-order over the tree, not mesh order, so
/// models sharing a skeleton produce identical avatars regardless of
/// which meshes reference which bones. A bone name that resolves to more
/// than one node keeps the first pre-order occurrence.
pub(crate) fn build_avatar(tree: &mut ModelNodeTree, meshes: &[Mesh]) -> Avatar {
    let bone_names: HashSet<&str> = meshes
        .iter()
        .flat_map(|mesh| mesh.bones.iter().map(String::as_str))
        .collect();

    let mut avatar = Avatar::default();
    if bone_names.is_empty() {
        return avatar;
    }

    for index in 0..tree.len() {
        let (name, is_bone_name) = match tree.get(index) {
            Some(node) => (node.name.clone(), bone_names.contains(node.name.as_str())),
            None => continue,
        };
        if !is_bone_name {
            continue;
        }
        if avatar.insert(&name, index) {
            if let Some(node) = tree.get_mut(index) {
                node.is_bone = true;
            }
        } else {
            warn!("duplicate bone name {:?}; first occurrence wins", name);
        }
    }

    for name in &bone_names {
        if !avatar.contains(name) {
            warn!("bone {:?} has no matching node in the hierarchy", name);
        }
    }

    avatar
}

use std::collections::HashMap;

use glam::Mat4;
use log::warn;

use crate::asset::{
    mesh::Mesh,
    node::{DecomposedTransform, ModelNodeTree, NodeTransform},
    source::{SourceAsset, SourceNode},
};

use super::{mesh::extract_mesh, ImportSettings};

/// Name fragment of synthetic pivot nodes some FBX exporters insert.
pub(crate) const DUMMY_NODE_MARKER: &str = "$AssimpFbx$";

pub(crate) struct TreeOutput {
    pub tree: ModelNodeTree,
    pub meshes: Vec<Mesh>,
    pub material_index_per_mesh: Vec<usize>,
    /// Synthetic pivot node name to tree index, for the animation cleaner.
    pub dummy_nodes: HashMap<String, usize>,
}

/// Mirrors the source hierarchy into a [`ModelNodeTree`], extracting each
/// referenced mesh exactly once.
///
/// The walk is iterative with an explicit stack, so arbitrarily deep or
/// malformed hierarchies cannot overflow the call stack. Children are
/// pushed in reverse so arena order stays pre-order. Unresolvable mesh
/// references and failed extractions are logged and skipped; the owning
/// node is kept and the import continues.
pub(crate) fn build_tree(source: &dyn SourceAsset, settings: &ImportSettings) -> TreeOutput {
    let mut tree = ModelNodeTree::default();
    let mut meshes = Vec::new();
    let mut material_index_per_mesh = Vec::new();
    let mut dummy_nodes = HashMap::new();
    // Source mesh id to extracted index; None marks a failed extraction
    // so it is not retried for later references.
    let mut extracted: HashMap<usize, Option<usize>> = HashMap::new();

    let mut stack: Vec<(&dyn SourceNode, Option<usize>)> = vec![(source.root(), None)];
    while let Some((node, parent)) = stack.pop() {
        let name = node.name().to_string();
        let transform = scale_transform(node.local_transform(), settings.file_scale);
        let index = tree.push(name.clone(), parent, transform);
        if name.contains(DUMMY_NODE_MARKER) {
            dummy_nodes.insert(name.clone(), index);
        }

        for &mesh_id in node.mesh_ids() {
            let slot = match extracted.get(&mesh_id) {
                Some(slot) => *slot,
                None => {
                    let slot = match source.mesh(mesh_id) {
                        None => {
                            warn!(
                                "node {:?}: unresolvable mesh reference #{}, skipping",
                                name, mesh_id
                            );
                            None
                        }
                        Some(source_mesh) => match extract_mesh(source_mesh, settings) {
                            Ok((mesh, material_id)) => {
                                let material_count = source.material_names().len();
                                let material = match material_id {
                                    Some(id) if id < material_count => id,
                                    Some(id) => {
                                        warn!(
                                            "mesh #{}: material index {} out of range ({} materials), using 0",
                                            mesh_id, id, material_count
                                        );
                                        0
                                    }
                                    None => 0,
                                };
                                meshes.push(mesh);
                                material_index_per_mesh.push(material);
                                Some(meshes.len() - 1)
                            }
                            Err(error) => {
                                warn!("skipping mesh #{}: {}", mesh_id, error);
                                None
                            }
                        },
                    };
                    extracted.insert(mesh_id, slot);
                    slot
                }
            };
            if let (Some(slot), Some(node)) = (slot, tree.get_mut(index)) {
                node.mesh_indices.push(slot);
            }
        }

        for child in (0..node.child_count()).rev() {
            stack.push((node.child(child), Some(index)));
        }
    }

    TreeOutput {
        tree,
        meshes,
        material_index_per_mesh,
        dummy_nodes,
    }
}

fn scale_transform(transform: NodeTransform, scale: f32) -> NodeTransform {
    if scale == 1.0 {
        return transform;
    }
    match transform {
        NodeTransform::Decomposed(decomposed) => NodeTransform::Decomposed(DecomposedTransform {
            translation: decomposed.translation * scale,
            ..decomposed
        }),
        NodeTransform::Matrix(matrix) => {
            let mut columns = matrix.to_cols_array_2d();
            for row in 0..3 {
                columns[3][row] *= scale;
            }
            NodeTransform::Matrix(Mat4::from_cols_array_2d(&columns))
        }
    }
}

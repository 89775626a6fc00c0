use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use log::warn;

use crate::asset::{
    mesh::Mesh,
    normal::calculate_normals,
    source::SourceMesh,
    tangent::calculate_tangents,
};

use super::{ImportSettings, NormalImportMode, TangentImportMode};

/// Failure of a single mesh. Fatal for that mesh only; the importer
/// absorbs it and proceeds with the rest of the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    MissingPositions,
    NonTriangleFace { face: usize, vertices: usize },
    IndexOutOfRange { face: usize, index: u32, vertices: usize },
}

impl Display for MeshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::MissingPositions => write!(f, "mesh has no vertex positions"),
            MeshError::NonTriangleFace { face, vertices } => {
                write!(f, "face #{} has {} vertices, expected 3", face, vertices)
            }
            MeshError::IndexOutOfRange { face, index, vertices } => {
                write!(
                    f,
                    "face #{} references vertex {} of a {}-vertex mesh",
                    face, index, vertices
                )
            }
        }
    }
}

impl Error for MeshError {}

const MAX_INFLUENCES: usize = 4;

/// Converts one source mesh record into engine buffers, applying the
/// normal/tangent policy and the file scale. Returns the mesh together
/// with its source material id.
pub(crate) fn extract_mesh(
    source: &dyn SourceMesh,
    settings: &ImportSettings,
) -> Result<(Mesh, Option<usize>), MeshError> {
    let positions = source.positions().ok_or(MeshError::MissingPositions)?;

    // Every index is validated against the vertex buffer here, so the
    // attribute generators can index without further checks.
    let mut indices = Vec::new();
    for (face_index, face) in source.faces().iter().enumerate() {
        if face.len() != 3 {
            return Err(MeshError::NonTriangleFace {
                face: face_index,
                vertices: face.len(),
            });
        }
        for &index in face {
            if index as usize >= positions.len() {
                return Err(MeshError::IndexOutOfRange {
                    face: face_index,
                    index,
                    vertices: positions.len(),
                });
            }
        }
        indices.extend_from_slice(face);
    }

    let scale = settings.file_scale;
    let positions: Vec<[f32; 3]> = if scale == 1.0 {
        positions.to_vec()
    } else {
        positions
            .iter()
            .map(|[x, y, z]| [x * scale, y * scale, z * scale])
            .collect()
    };

    let uvs = source.uvs().map(<[_]>::to_vec);

    // Import demotes to Calculate when the source lacks the attribute;
    // absent data is never left uninitialized.
    let normals = match settings.import_normals {
        NormalImportMode::None => None,
        NormalImportMode::Import => Some(
            source
                .normals()
                .map(<[_]>::to_vec)
                .unwrap_or_else(|| calculate_normals(&positions, &indices)),
        ),
        NormalImportMode::Calculate => Some(calculate_normals(&positions, &indices)),
    };

    let tangents = match settings.import_tangents {
        TangentImportMode::None => None,
        TangentImportMode::Import if source.tangents().is_some() => {
            source.tangents().map(<[_]>::to_vec)
        }
        _ => {
            // Calculate, or Import demoted. Tangent generation needs
            // normals; derive throwaway ones if the normal policy
            // excluded them from the output.
            let derived;
            let reference_normals = match &normals {
                Some(normals) => normals.as_slice(),
                None => {
                    derived = calculate_normals(&positions, &indices);
                    derived.as_slice()
                }
            };
            Some(calculate_tangents(
                &positions,
                reference_normals,
                uvs.as_deref(),
                &indices,
            ))
        }
    };

    let name = source.name().unwrap_or("mesh").to_string();
    let (bones, joints, weights) = extract_skin(source, &name, positions.len());

    Ok((
        Mesh {
            name,
            positions,
            normals,
            tangents,
            uvs,
            indices,
            bones,
            joints,
            weights,
        },
        source.material_id(),
    ))
}

/// Copies the per-bone weight channels into per-vertex joint/weight
/// buffers, keeping the authored weights verbatim. Influences beyond
/// four per vertex are dropped with a warning. Bone-name resolution
/// against tree nodes happens later, in the skeleton builder.
fn extract_skin(
    source: &dyn SourceMesh,
    mesh_name: &str,
    vertex_count: usize,
) -> (Vec<String>, Vec<[u16; 4]>, Vec<[f32; 4]>) {
    let source_bones = source.skin();
    if source_bones.is_empty() {
        return (Vec::new(), Vec::new(), Vec::new());
    }

    let mut bones = Vec::with_capacity(source_bones.len());
    let mut joints = vec![[0u16; 4]; vertex_count];
    let mut weights = vec![[0f32; 4]; vertex_count];
    let mut influence_count = vec![0u8; vertex_count];
    let mut dropped = 0usize;

    for (slot, bone) in source_bones.iter().enumerate() {
        bones.push(bone.node_name.clone());
        for &(vertex, weight) in &bone.weights {
            let vertex = vertex as usize;
            if vertex >= vertex_count {
                warn!(
                    "mesh {:?}: bone {:?} weights out-of-range vertex {}",
                    mesh_name, bone.node_name, vertex
                );
                continue;
            }
            let count = influence_count[vertex] as usize;
            if count >= MAX_INFLUENCES {
                dropped += 1;
                continue;
            }
            joints[vertex][count] = slot as u16;
            weights[vertex][count] = weight;
            influence_count[vertex] += 1;
        }
    }

    if dropped > 0 {
        warn!(
            "mesh {:?}: dropped {} skin influences beyond {} per vertex",
            mesh_name, dropped, MAX_INFLUENCES
        );
    }

    (bones, joints, weights)
}

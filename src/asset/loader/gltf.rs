//! glTF 2.0 adapter.
//!
//! Flattens each (mesh, skin) pairing into one mesh record, derives bone
//! weight channels from the `JOINTS_0`/`WEIGHTS_0` vertex attributes, and
//! resamples animation channels onto per-node TRS keyframes so the rest
//! of the pipeline never sees glTF specifics.

use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    ops::Deref,
    path::Path,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    animation::{util::ReadOutputs, Interpolation},
    buffer,
    mesh::Mode,
    scene::Transform,
    Document, Node, Scene,
};
use log::warn;

use crate::asset::{
    node::{DecomposedTransform, NodeTransform},
    source::{
        SourceAnimation, SourceAsset, SourceBone, SourceKeyframe, SourceMesh, SourceNode,
        SourceTrack,
    },
};

#[derive(Debug)]
pub enum GltfLoadError {
    Gltf(gltf::Error),
    /// The document contains no scene to instantiate.
    NoScene,
}

impl Display for GltfLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoadError::Gltf(error) => Display::fmt(error, f),
            GltfLoadError::NoScene => write!(f, "Model file has no scene"),
        }
    }
}

impl Error for GltfLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GltfLoadError::Gltf(error) => Some(error),
            GltfLoadError::NoScene => None,
        }
    }
}

impl From<gltf::Error> for GltfLoadError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

/// Nodes without an authored name get a stable index-derived one, used
/// consistently for the hierarchy, bone bindings and animation targets.
fn node_label(node: &Node) -> String {
    match node.name() {
        Some(name) => name.to_string(),
        None => format!("node_{}", node.index()),
    }
}

fn convert_transform(transform: Transform) -> NodeTransform {
    match transform {
        Transform::Matrix { matrix } => NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix)),
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => NodeTransform::Decomposed(DecomposedTransform {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        }),
    }
}

#[derive(Debug)]
struct GltfNode {
    name: String,
    transform: NodeTransform,
    mesh_ids: Vec<usize>,
    children: Vec<GltfNode>,
}

impl SourceNode for GltfNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_transform(&self) -> NodeTransform {
        self.transform
    }

    fn mesh_ids(&self) -> &[usize] {
        &self.mesh_ids
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> &dyn SourceNode {
        &self.children[index]
    }
}

#[derive(Debug, Default)]
struct GltfMesh {
    name: Option<String>,
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    tangents: Option<Vec<[f32; 4]>>,
    uvs: Option<Vec<[f32; 2]>>,
    faces: Vec<Vec<u32>>,
    skin: Vec<SourceBone>,
    material_id: Option<usize>,
}

impl SourceMesh for GltfMesh {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn positions(&self) -> Option<&[[f32; 3]]> {
        if self.positions.is_empty() {
            None
        } else {
            Some(&self.positions)
        }
    }

    fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    fn tangents(&self) -> Option<&[[f32; 4]]> {
        self.tangents.as_deref()
    }

    fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    fn skin(&self) -> &[SourceBone] {
        &self.skin
    }

    fn material_id(&self) -> Option<usize> {
        self.material_id
    }
}

#[derive(Debug)]
struct GltfAnimation {
    name: Option<String>,
    tracks: Vec<SourceTrack>,
}

impl SourceAnimation for GltfAnimation {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn tracks(&self) -> &[SourceTrack] {
        &self.tracks
    }
}

/// A loaded glTF document adapted to the source-graph traits.
#[derive(Debug)]
pub struct GltfSourceAsset {
    root: GltfNode,
    meshes: Vec<GltfMesh>,
    animations: Vec<GltfAnimation>,
    materials: Vec<String>,
}

impl GltfSourceAsset {
    pub fn open(path: &Path) -> Result<Self, GltfLoadError> {
        let (document, buffers, _images) = gltf::import(path)?;
        Self::from_document(document, buffers)
    }

    fn from_document(
        document: Document,
        buffers: Vec<buffer::Data>,
    ) -> Result<Self, GltfLoadError> {
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(GltfLoadError::NoScene)?;

        let mut builder = MeshTableBuilder {
            buffers: &buffers,
            table: Vec::new(),
            by_key: HashMap::new(),
        };

        let mut root = builder.convert_scene(&scene);
        // The pipeline expects a single root; multi-root scenes keep
        // the synthetic one.
        let root = if root.children.len() == 1 {
            root.children.remove(0)
        } else {
            root
        };

        let animations = document
            .animations()
            .map(|animation| build_animation(&animation, &buffers))
            .collect();

        let materials = document
            .materials()
            .filter_map(|material| {
                let index = material.index()?;
                Some(
                    material
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("material_{}", index)),
                )
            })
            .collect();

        Ok(Self {
            root,
            meshes: builder.table,
            animations,
            materials,
        })
    }
}

impl SourceAsset for GltfSourceAsset {
    fn root(&self) -> &dyn SourceNode {
        &self.root
    }

    fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn mesh(&self, id: usize) -> Option<&dyn SourceMesh> {
        self.meshes.get(id).map(|mesh| mesh as &dyn SourceMesh)
    }

    fn animation_count(&self) -> usize {
        self.animations.len()
    }

    fn animation(&self, id: usize) -> Option<&dyn SourceAnimation> {
        self.animations
            .get(id)
            .map(|animation| animation as &dyn SourceAnimation)
    }

    fn material_names(&self) -> &[String] {
        &self.materials
    }
}

struct MeshTableBuilder<'a> {
    buffers: &'a [buffer::Data],
    table: Vec<GltfMesh>,
    /// (mesh index, skin index) to table id. The same geometry bound to
    /// different skins yields different weight channels, so the skin is
    /// part of the identity.
    by_key: HashMap<(usize, Option<usize>), usize>,
}

/// Hierarchies nested deeper than this are truncated with a warning.
const MAX_NODE_DEPTH: usize = 4096;

impl MeshTableBuilder<'_> {
    /// Mirrors a scene under a synthetic root node. The walk is
    /// iterative with an explicit stack and the owned tree is assembled
    /// bottom-up afterwards, so adversarially deep files cannot
    /// overflow the call stack.
    fn convert_scene(&mut self, scene: &Scene) -> GltfNode {
        let mut flat: Vec<(GltfNode, Option<usize>)> = vec![(
            GltfNode {
                name: scene.name().unwrap_or("root").to_string(),
                transform: NodeTransform::default(),
                mesh_ids: Vec::new(),
                children: Vec::new(),
            },
            None,
        )];
        let mut stack: Vec<(Node, usize, usize)> =
            scene.nodes().map(|node| (node, 0, 1)).collect();
        while let Some((node, parent, depth)) = stack.pop() {
            if depth > MAX_NODE_DEPTH {
                warn!(
                    "node {:?} is nested deeper than {} levels, truncating",
                    node_label(&node),
                    MAX_NODE_DEPTH
                );
                continue;
            }
            let flat_index = flat.len();
            flat.push((
                GltfNode {
                    name: node_label(&node),
                    transform: convert_transform(node.transform()),
                    mesh_ids: self.mesh_ids_for(&node),
                    children: Vec::new(),
                },
                Some(parent),
            ));
            for child in node.children() {
                stack.push((child, flat_index, depth + 1));
            }
        }

        // Reattach in reverse creation order: a node's subtree is
        // complete before the node itself moves into its parent, and
        // siblings land in source order.
        let mut root = GltfNode {
            name: String::new(),
            transform: NodeTransform::default(),
            mesh_ids: Vec::new(),
            children: Vec::new(),
        };
        while let Some((node, parent)) = flat.pop() {
            match parent {
                Some(parent) => flat[parent].0.children.push(node),
                None => root = node,
            }
        }
        root
    }

    fn mesh_ids_for(&mut self, node: &Node) -> Vec<usize> {
        let mesh = match node.mesh() {
            Some(mesh) => mesh,
            None => return Vec::new(),
        };
        let key = (mesh.index(), node.skin().map(|skin| skin.index()));
        let id = match self.by_key.get(&key) {
            Some(id) => *id,
            None => {
                let built = build_mesh(&mesh, node.skin().as_ref(), self.buffers);
                self.table.push(built);
                let id = self.table.len() - 1;
                self.by_key.insert(key, id);
                id
            }
        };
        vec![id]
    }
}

fn build_mesh(
    mesh: &gltf::Mesh,
    skin: Option<&gltf::Skin>,
    buffers: &[buffer::Data],
) -> GltfMesh {
    let buffer_data = |buffer: gltf::Buffer| buffers.get(buffer.index()).map(Deref::deref);

    let mut out = GltfMesh {
        name: mesh.name().map(str::to_string),
        skin: skin
            .map(|skin| {
                skin.joints()
                    .map(|joint| SourceBone {
                        node_name: node_label(&joint),
                        weights: Vec::new(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        ..GltfMesh::default()
    };
    let mut normals = Vec::new();
    let mut tangents = Vec::new();
    let mut uvs = Vec::new();
    // An attribute survives flattening only when every primitive has it.
    let mut all_normals = true;
    let mut all_tangents = true;
    let mut all_uvs = true;

    for primitive in mesh.primitives() {
        let reader = primitive.reader(buffer_data);
        let positions = match reader.read_positions() {
            Some(positions) => positions,
            None => {
                warn!(
                    "mesh {:?}: primitive #{} has no positions, skipping",
                    mesh.name(),
                    primitive.index()
                );
                continue;
            }
        };
        let base = out.positions.len() as u32;
        out.positions.extend(positions);
        let vertex_count = out.positions.len() - base as usize;

        match reader.read_normals() {
            Some(values) => normals.extend(values),
            None => all_normals = false,
        }
        match reader.read_tangents() {
            Some(values) => tangents.extend(values),
            None => all_tangents = false,
        }
        match reader.read_tex_coords(0) {
            Some(values) => uvs.extend(values.into_f32()),
            None => all_uvs = false,
        }

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_else(|| (0..vertex_count as u32).collect());
        match primitive.mode() {
            Mode::Triangles => {
                for triangle in indices.chunks(3) {
                    out.faces
                        .push(triangle.iter().map(|index| index + base).collect());
                }
            }
            // Delivered as one face so extraction rejects the mesh
            // instead of misreading the topology.
            _ => out
                .faces
                .push(indices.iter().map(|index| index + base).collect()),
        }

        if !out.skin.is_empty() {
            if let (Some(joints), Some(weights)) =
                (reader.read_joints(0), reader.read_weights(0))
            {
                for (vertex, (joint, weight)) in
                    joints.into_u16().zip(weights.into_f32()).enumerate()
                {
                    for slot in 0..4 {
                        if weight[slot] <= 0.0 {
                            continue;
                        }
                        match out.skin.get_mut(joint[slot] as usize) {
                            Some(bone) => bone.weights.push((base + vertex as u32, weight[slot])),
                            None => warn!(
                                "mesh {:?}: joint index {} outside the skin",
                                mesh.name(),
                                joint[slot]
                            ),
                        }
                    }
                }
            }
        }

        if out.material_id.is_none() {
            out.material_id = primitive.material().index();
        }
    }

    out.normals = (all_normals && !normals.is_empty()).then_some(normals);
    out.tangents = (all_tangents && !tangents.is_empty()).then_some(tangents);
    out.uvs = (all_uvs && !uvs.is_empty()).then_some(uvs);
    out
}

struct Keys<T> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Copy> Keys<T> {
    /// Clamp outside the keyed range, interpolate inside.
    fn sample(&self, time: f32, lerp: impl Fn(T, T, f32) -> T) -> Option<T> {
        let (&first_time, &first) = self.times.first().zip(self.values.first())?;
        if time <= first_time {
            return Some(first);
        }
        let (&last_time, &last) = self.times.last().zip(self.values.last())?;
        if time >= last_time {
            return Some(last);
        }
        let next = self.times.partition_point(|&key| key <= time);
        let previous = next - 1;
        let span = self.times[next] - self.times[previous];
        if span <= f32::EPSILON {
            return Some(self.values[previous]);
        }
        let progress = (time - self.times[previous]) / span;
        Some(lerp(self.values[previous], self.values[next], progress))
    }
}

#[derive(Default)]
struct NodeChannels {
    translation: Option<Keys<Vec3>>,
    rotation: Option<Keys<Quat>>,
    scale: Option<Keys<Vec3>>,
}

/// Cubic-spline samplers store in-tangent, value, out-tangent triples;
/// only the value participates, so splines degrade to linear sampling.
fn spline_values<T>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values
            .into_iter()
            .skip(1)
            .step_by(3)
            .collect(),
        _ => values,
    }
}

fn nlerp(a: Quat, b: Quat, t: f32) -> Quat {
    let b = if a.dot(b) < 0.0 { -b } else { b };
    Quat::lerp(a, b, t).normalize()
}

/// Resamples one animation onto TRS keyframes, one track per targeted
/// node on the union of that node's channel key times. Properties a node
/// leaves unanimated hold its rest pose.
fn build_animation(animation: &gltf::Animation, buffers: &[buffer::Data]) -> GltfAnimation {
    let buffer_data = |buffer: gltf::Buffer| buffers.get(buffer.index()).map(Deref::deref);

    let mut channels: HashMap<usize, NodeChannels> = HashMap::new();
    let mut targets: Vec<Node> = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(buffer_data);
        let times: Vec<f32> = match reader.read_inputs() {
            Some(inputs) => inputs.collect(),
            None => continue,
        };
        let interpolation = channel.sampler().interpolation();
        let target = channel.target().node();
        if !channels.contains_key(&target.index()) {
            targets.push(target.clone());
        }
        let entry = channels.entry(target.index()).or_default();
        match reader.read_outputs() {
            Some(ReadOutputs::Translations(values)) => {
                entry.translation = Some(Keys {
                    times,
                    values: spline_values(values.map(Vec3::from).collect(), interpolation),
                });
            }
            Some(ReadOutputs::Rotations(values)) => {
                entry.rotation = Some(Keys {
                    times,
                    values: spline_values(
                        values.into_f32().map(Quat::from_array).collect(),
                        interpolation,
                    ),
                });
            }
            Some(ReadOutputs::Scales(values)) => {
                entry.scale = Some(Keys {
                    times,
                    values: spline_values(values.map(Vec3::from).collect(), interpolation),
                });
            }
            // Morph target weights have no TRS counterpart.
            _ => {}
        }
    }

    let tracks = targets
        .iter()
        .filter_map(|target| {
            let entry = channels.get(&target.index())?;
            let mut times: Vec<f32> = Vec::new();
            for keys in [&entry.translation, &entry.scale] {
                if let Some(keys) = keys {
                    times.extend(&keys.times);
                }
            }
            if let Some(keys) = &entry.rotation {
                times.extend(&keys.times);
            }
            times.sort_by(f32::total_cmp);
            times.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
            if times.is_empty() {
                return None;
            }

            let (base_translation, base_rotation, base_scale) = target.transform().decomposed();
            let keyframes = times
                .into_iter()
                .map(|time| SourceKeyframe {
                    time,
                    transform: DecomposedTransform {
                        translation: entry
                            .translation
                            .as_ref()
                            .and_then(|keys| keys.sample(time, Vec3::lerp))
                            .unwrap_or(Vec3::from_array(base_translation)),
                        rotation: entry
                            .rotation
                            .as_ref()
                            .and_then(|keys| keys.sample(time, nlerp))
                            .unwrap_or(Quat::from_array(base_rotation)),
                        scale: entry
                            .scale
                            .as_ref()
                            .and_then(|keys| keys.sample(time, Vec3::lerp))
                            .unwrap_or(Vec3::from_array(base_scale)),
                    },
                })
                .collect();
            Some(SourceTrack {
                node_name: node_label(target),
                keyframes,
            })
        })
        .collect();

    GltfAnimation {
        name: animation.name().map(str::to_string),
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};
    use gltf::animation::Interpolation;

    use super::{nlerp, spline_values, Keys};

    #[test]
    fn keys_sample_clamps_and_interpolates() {
        let keys = Keys {
            times: vec![1.0, 3.0],
            values: vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
        };
        assert_eq!(keys.sample(0.0, Vec3::lerp), Some(Vec3::ZERO));
        assert_eq!(keys.sample(5.0, Vec3::lerp), Some(Vec3::new(4.0, 0.0, 0.0)));
        let mid = keys.sample(2.0, Vec3::lerp).unwrap();
        assert!(mid.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn spline_triples_keep_only_the_value() {
        let values = vec![0, 1, 2, 10, 11, 12];
        assert_eq!(spline_values(values, Interpolation::CubicSpline), vec![1, 11]);
        assert_eq!(
            spline_values(vec![0, 1, 2], Interpolation::Linear),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn nlerp_takes_the_short_path() {
        let a = Quat::from_rotation_y(0.1);
        let b = -Quat::from_rotation_y(0.3);
        let mid = nlerp(a, b, 0.5);
        let expected = Quat::from_rotation_y(0.2);
        assert!(mid.abs_diff_eq(expected, 1e-4) || mid.abs_diff_eq(-expected, 1e-4));
    }
}

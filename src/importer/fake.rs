//! In-memory source-graph doubles for driving the pipeline in tests.

use crate::asset::{
    node::NodeTransform,
    source::{SourceAnimation, SourceAsset, SourceBone, SourceMesh, SourceNode, SourceTrack},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeNode {
    pub name: String,
    pub transform: NodeTransform,
    pub mesh_ids: Vec<usize>,
    pub children: Vec<FakeNode>,
}

impl FakeNode {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_mesh(name: &str, mesh_id: usize) -> Self {
        Self {
            mesh_ids: vec![mesh_id],
            ..Self::named(name)
        }
    }

    pub fn child(mut self, child: FakeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }
}

impl SourceNode for FakeNode {
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

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMesh {
    pub name: Option<String>,
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub faces: Vec<Vec<u32>>,
    pub skin: Vec<SourceBone>,
    pub material_id: Option<usize>,
}

impl FakeMesh {
    /// A unit quad in the XY plane facing +Z, positions and UVs only.
    pub fn quad() -> Self {
        Self {
            name: Some("quad".to_string()),
            positions: Some(vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ]),
            uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            faces: vec![vec![0, 1, 2], vec![0, 2, 3]],
            ..Self::default()
        }
    }
}

impl SourceMesh for FakeMesh {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn positions(&self) -> Option<&[[f32; 3]]> {
        self.positions.as_deref()
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

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeAnimation {
    pub name: Option<String>,
    pub tracks: Vec<SourceTrack>,
}

impl SourceAnimation for FakeAnimation {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn tracks(&self) -> &[SourceTrack] {
        &self.tracks
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeAsset {
    pub root: FakeNode,
    pub meshes: Vec<FakeMesh>,
    pub animations: Vec<FakeAnimation>,
    pub materials: Vec<String>,
}

impl SourceAsset for FakeAsset {
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

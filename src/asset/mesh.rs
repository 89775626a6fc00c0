pub type Position = [f32; 3];
pub type Normal = [f32; 3];
/// xyz tangent direction, w handedness (+1 or -1).
pub type Tangent = [f32; 4];
pub type TexCoord = [f32; 2];
/// Bone-slot indices of up to four influences per vertex.
pub type Joints = [u16; 4];
pub type Weights = [f32; 4];

/// Flat vertex buffers plus a triangle index buffer.
///
/// Positions and indices are always present; the remaining attributes
/// depend on the source data and the import policy. `bones` maps bone
/// slots (the values inside `joints`) to node names; binding those names
/// to tree nodes is the skeleton builder's job.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Position>,
    pub normals: Option<Vec<Normal>>,
    pub tangents: Option<Vec<Tangent>>,
    pub uvs: Option<Vec<TexCoord>>,
    pub indices: Vec<u32>,
    pub bones: Vec<String>,
    pub joints: Vec<Joints>,
    pub weights: Vec<Weights>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_skinned(&self) -> bool {
        !self.bones.is_empty()
    }
}

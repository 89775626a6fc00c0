use glam::{Mat4, Quat, Vec3};

/// A node-local transform, either as a raw matrix or in decomposed form.
///
/// Local transforms compose as `translation * rotation * scale`; a node's
/// world transform is `parent_world * local`. Source adapters must deliver
/// transforms in this convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl DecomposedTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, epsilon)
            && self.scale.abs_diff_eq(other.scale, epsilon)
            // q and -q are the same rotation
            && (self.rotation.abs_diff_eq(other.rotation, epsilon)
                || self.rotation.abs_diff_eq(-other.rotation, epsilon))
    }
}

impl From<DecomposedTransform> for Mat4 {
    fn from(value: DecomposedTransform) -> Self {
        value.to_matrix()
    }
}

impl From<NodeTransform> for Mat4 {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => matrix,
            NodeTransform::Decomposed(decomposed) => decomposed.to_matrix(),
        }
    }
}

impl From<NodeTransform> for DecomposedTransform {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => DecomposedTransform::from_matrix(&matrix),
            NodeTransform::Decomposed(decomposed) => decomposed,
        }
    }
}

/// One node of the imported hierarchy.
///
/// Nodes live in a [`ModelNodeTree`] arena; `parent` and `children` are
/// arena indices, never references. `index` equals the node's position in
/// the arena, which is the pre-order position of the node in the source
/// hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub index: usize,
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Indices into the owning model's flat mesh list.
    pub mesh_indices: Vec<usize>,
    pub transform: NodeTransform,
    pub is_bone: bool,
}

/// Arena-backed node tree with a single root at index 0.
#[derive(Debug, Clone, Default)]
pub struct ModelNodeTree {
    nodes: Vec<ModelNode>,
}

impl ModelNodeTree {
    /// Appends a node, wiring it into its parent's child list. The first
    /// pushed node becomes the root. Returns the new node's index.
    pub fn push(&mut self, name: String, parent: Option<usize>, transform: NodeTransform) -> usize {
        let index = self.nodes.len();
        debug_assert!(parent.map(|parent| parent < index).unwrap_or(index == 0));
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        self.nodes.push(ModelNode {
            index,
            name,
            parent,
            children: Vec::new(),
            mesh_indices: Vec::new(),
            transform,
            is_bone: false,
        });
        index
    }

    pub fn root(&self) -> Option<&ModelNode> {
        self.nodes.first()
    }

    pub fn get(&self, index: usize) -> Option<&ModelNode> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ModelNode> {
        self.nodes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in pre-order (arena order).
    pub fn iter(&self) -> impl Iterator<Item = &ModelNode> {
        self.nodes.iter()
    }

    /// First pre-order node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Local-to-world transform of a node, composed down from the root.
    pub fn world_transform(&self, index: usize) -> Option<Mat4> {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            chain.push(Mat4::from(node.transform));
            cursor = node.parent;
        }
        let mut world = Mat4::IDENTITY;
        for local in chain.into_iter().rev() {
            world *= local;
        }
        Some(world)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Quat, Vec3};

    use super::{DecomposedTransform, ModelNodeTree, NodeTransform};

    #[test]
    fn transform_roundtrip() {
        let decomposed = DecomposedTransform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let back = DecomposedTransform::from_matrix(&decomposed.to_matrix());
        assert!(back.approx_eq(&decomposed, 1e-5));
    }

    #[test]
    fn world_transform_composes_parent_first() {
        let mut tree = ModelNodeTree::default();
        let root = tree.push(
            "root".into(),
            None,
            NodeTransform::Decomposed(DecomposedTransform {
                scale: Vec3::splat(2.0),
                ..Default::default()
            }),
        );
        let child = tree.push(
            "child".into(),
            Some(root),
            NodeTransform::Decomposed(DecomposedTransform::from_translation(Vec3::X)),
        );
        let world = tree.world_transform(child).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        // Parent scale applies to the child translation.
        assert!(origin.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_eq!(tree.world_transform(root).unwrap(), Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn find_by_name_prefers_pre_order() {
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        let first = tree.push("twin".into(), Some(root), NodeTransform::default());
        let _second = tree.push("twin".into(), Some(root), NodeTransform::default());
        assert_eq!(tree.find_by_name("twin"), Some(first));
    }
}

//! Process-wide registry of builtin primitive meshes and models.
//!
//! The registry is generated once behind a `OnceLock` barrier and is
//! read-only afterwards, so concurrent reads are safe and first-time
//! population is serialized.

use std::{collections::BTreeMap, f32::consts::PI, sync::OnceLock};

use glam::Vec3;

use super::{
    mesh::Mesh,
    model::Model,
    node::{ModelNodeTree, NodeTransform},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveType {
    Quad,
    Plane,
    Cube,
    Sphere,
}

impl PrimitiveType {
    fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Quad => "Quad",
            PrimitiveType::Plane => "Plane",
            PrimitiveType::Cube => "Cube",
            PrimitiveType::Sphere => "Sphere",
        }
    }
}

#[derive(Debug)]
struct BuiltinRegistry {
    meshes: BTreeMap<PrimitiveType, Mesh>,
    models: BTreeMap<PrimitiveType, Model>,
}

static REGISTRY: OnceLock<BuiltinRegistry> = OnceLock::new();

fn registry() -> &'static BuiltinRegistry {
    REGISTRY.get_or_init(|| {
        let types = [
            PrimitiveType::Quad,
            PrimitiveType::Plane,
            PrimitiveType::Cube,
            PrimitiveType::Sphere,
        ];
        let mut meshes = BTreeMap::new();
        let mut models = BTreeMap::new();
        for primitive in types {
            let mesh = generate_mesh(primitive);
            models.insert(primitive, single_mesh_model(primitive, mesh.clone()));
            meshes.insert(primitive, mesh);
        }
        BuiltinRegistry { meshes, models }
    })
}

/// Forces registry population. Calling this during startup keeps the
/// generation cost out of the first lookup; lookups initialize lazily
/// anyway.
pub fn init() {
    let _ = registry();
}

pub fn builtin_mesh(primitive: PrimitiveType) -> &'static Mesh {
    &registry().meshes[&primitive]
}

pub fn builtin_model(primitive: PrimitiveType) -> &'static Model {
    &registry().models[&primitive]
}

fn single_mesh_model(primitive: PrimitiveType, mesh: Mesh) -> Model {
    let mut tree = ModelNodeTree::default();
    let root = tree.push(primitive.name().to_string(), None, NodeTransform::default());
    tree.get_mut(root)
        .map(|node| node.mesh_indices.push(0))
        .unwrap_or(());
    Model {
        name: primitive.name().to_string(),
        meshes: vec![mesh],
        materials: vec!["default".to_string()],
        material_index_per_mesh: vec![0],
        tree,
        ..Model::default()
    }
}

fn generate_mesh(primitive: PrimitiveType) -> Mesh {
    match primitive {
        PrimitiveType::Quad => quad(1.0, false),
        PrimitiveType::Plane => quad(10.0, true),
        PrimitiveType::Cube => cube(),
        PrimitiveType::Sphere => sphere(0.5, 24, 16),
    }
}

/// A unit quad in the XY plane facing +Z, or lying in the XZ plane facing
/// +Y when `flat` is set.
fn quad(size: f32, flat: bool) -> Mesh {
    let half = size * 0.5;
    let corners = [[-half, -half], [half, -half], [half, half], [-half, half]];
    let mut mesh = Mesh {
        name: if flat { "Plane" } else { "Quad" }.to_string(),
        indices: vec![0, 1, 2, 0, 2, 3],
        ..Mesh::default()
    };
    let mut normals = Vec::new();
    let mut tangents = Vec::new();
    let mut uvs = Vec::new();
    for (index, [x, y]) in corners.iter().enumerate() {
        if flat {
            mesh.positions.push([*x, 0.0, -*y]);
            normals.push([0.0, 1.0, 0.0]);
        } else {
            mesh.positions.push([*x, *y, 0.0]);
            normals.push([0.0, 0.0, 1.0]);
        }
        tangents.push([1.0, 0.0, 0.0, 1.0]);
        uvs.push([(index == 1 || index == 2) as u32 as f32, (index >= 2) as u32 as f32]);
    }
    mesh.normals = Some(normals);
    mesh.tangents = Some(tangents);
    mesh.uvs = Some(uvs);
    mesh
}

fn cube() -> Mesh {
    // One face per axis direction: normal, in-face u and v axes.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let mut mesh = Mesh {
        name: "Cube".to_string(),
        ..Mesh::default()
    };
    let mut normals = Vec::new();
    let mut tangents = Vec::new();
    let mut uvs = Vec::new();
    for (normal, u_axis, v_axis) in FACES {
        let normal = Vec3::from_array(normal);
        let u_axis = Vec3::from_array(u_axis);
        let v_axis = Vec3::from_array(v_axis);
        let base = mesh.positions.len() as u32;
        for (du, dv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = normal * 0.5 + u_axis * du + v_axis * dv;
            mesh.positions.push(position.to_array());
            normals.push(normal.to_array());
            tangents.push([u_axis.x, u_axis.y, u_axis.z, 1.0]);
            uvs.push([du + 0.5, dv + 0.5]);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh.normals = Some(normals);
    mesh.tangents = Some(tangents);
    mesh.uvs = Some(uvs);
    mesh
}

fn sphere(radius: f32, sectors: u32, stacks: u32) -> Mesh {
    let mut mesh = Mesh {
        name: "Sphere".to_string(),
        ..Mesh::default()
    };
    let mut normals = Vec::new();
    let mut tangents = Vec::new();
    let mut uvs = Vec::new();
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let phi = v * PI;
        for sector in 0..=sectors {
            let u = sector as f32 / sectors as f32;
            let theta = u * 2.0 * PI;
            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.positions.push((normal * radius).to_array());
            normals.push(normal.to_array());
            let tangent = Vec3::new(-theta.sin(), 0.0, theta.cos());
            tangents.push([tangent.x, tangent.y, tangent.z, 1.0]);
            uvs.push([u, v]);
        }
    }
    let ring = sectors + 1;
    for stack in 0..stacks {
        for sector in 0..sectors {
            let a = stack * ring + sector;
            let b = a + ring;
            mesh.indices
                .extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh.normals = Some(normals);
    mesh.tangents = Some(tangents);
    mesh.uvs = Some(uvs);
    mesh
}

#[cfg(test)]
mod tests {
    use super::{builtin_mesh, builtin_model, init, PrimitiveType};

    #[test]
    fn registry_hands_out_stable_references() {
        init();
        let first = builtin_mesh(PrimitiveType::Cube) as *const _;
        let second = builtin_mesh(PrimitiveType::Cube) as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn builtin_meshes_are_well_formed() {
        for primitive in [
            PrimitiveType::Quad,
            PrimitiveType::Plane,
            PrimitiveType::Cube,
            PrimitiveType::Sphere,
        ] {
            let mesh = builtin_mesh(primitive);
            assert!(!mesh.positions.is_empty());
            assert_eq!(mesh.indices.len() % 3, 0);
            let max = *mesh.indices.iter().max().unwrap() as usize;
            assert!(max < mesh.vertex_count());
            assert_eq!(mesh.normals.as_ref().unwrap().len(), mesh.vertex_count());
        }
    }

    #[test]
    fn builtin_model_wraps_one_mesh() {
        let model = builtin_model(PrimitiveType::Quad);
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.material_index_per_mesh.len(), 1);
        let root = model.tree.root().unwrap();
        assert_eq!(root.mesh_indices, vec![0]);
    }
}

use glam::Vec3;
use log::warn;

/// Per-vertex tangents from UV-space derivatives of the triangle basis,
/// Gram-Schmidt orthonormalized against the vertex normal, with the
/// bitangent handedness stored in `w`.
///
/// Tangent space is undefined without texture coordinates: in that case a
/// zero tangent buffer is returned and a warning is logged, never an
/// error.
pub fn calculate_tangents(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: Option<&[[f32; 2]]>,
    indices: &[u32],
) -> Vec<[f32; 4]> {
    let Some(uvs) = uvs else {
        warn!("tangent generation requested for a mesh without texture coordinates");
        return vec![[0.0; 4]; positions.len()];
    };

    let mut tangents = vec![Vec3::ZERO; positions.len()];
    let mut bitangents = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;

        let p0 = Vec3::from_array(positions[i0]);
        let p1 = Vec3::from_array(positions[i1]);
        let p2 = Vec3::from_array(positions[i2]);
        let e1 = p1 - p0;
        let e2 = p2 - p0;

        let duv1 = [uvs[i1][0] - uvs[i0][0], uvs[i1][1] - uvs[i0][1]];
        let duv2 = [uvs[i2][0] - uvs[i0][0], uvs[i2][1] - uvs[i0][1]];

        let det = duv1[0] * duv2[1] - duv2[0] * duv1[1];
        if det.abs() < 1e-8 {
            // Degenerate UV mapping for this triangle
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * duv2[1] - e2 * duv1[1]) * r;
        let bitangent = (e2 * duv1[0] - e1 * duv2[0]) * r;

        for &index in &[i0, i1, i2] {
            tangents[index] += tangent;
            bitangents[index] += bitangent;
        }
    }

    (0..positions.len())
        .map(|index| {
            let normal = Vec3::from_array(normals[index]);
            let tangent = tangents[index];
            // Gram-Schmidt orthonormalize against the normal
            let orthogonal = tangent - normal * normal.dot(tangent);
            if orthogonal.length_squared() <= 1e-12 {
                return [0.0, 0.0, 0.0, 0.0];
            }
            let orthogonal = orthogonal.normalize();
            let handedness = if normal.cross(orthogonal).dot(bitangents[index]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            [orthogonal.x, orthogonal.y, orthogonal.z, handedness]
        })
        .collect()
}

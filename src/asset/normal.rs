use glam::Vec3;

/// Per-vertex normals from area-weighted accumulation of triangle face
/// normals. The cross product of two triangle edges has twice the triangle
/// area as its length, so accumulating it unnormalized weights large faces
/// more, then a final normalize produces the vertex normal.
pub fn calculate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut buffer = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = Vec3::from_array(positions[i0]);
        let p1 = Vec3::from_array(positions[i1]);
        let p2 = Vec3::from_array(positions[i2]);
        let face = (p1 - p0).cross(p2 - p0);
        buffer[i0] += face;
        buffer[i1] += face;
        buffer[i2] += face;
    }
    buffer
        .into_iter()
        .map(|normal| {
            if normal.length_squared() > 0.0 {
                normal.normalize().to_array()
            } else {
                // Degenerate or unreferenced vertex
                [0.0, 0.0, 0.0]
            }
        })
        .collect()
}

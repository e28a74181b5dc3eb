use cgmath::Vector3;

use crate::geometry::MeshData;

pub fn build(center: Vector3<f32>) -> MeshData {
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let positions = corners
        .iter()
        .map(|&(x, y)| -> [f32; 4] { (center + Vector3::new(x, y, 0.0)).extend(1.0).into() })
        .collect();
    MeshData {
        positions,
        normals: vec![[0.0, 0.0, 1.0, 0.0]; 4],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

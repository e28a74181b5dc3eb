use cgmath::Vector3;

use crate::geometry::MeshData;

const HALF_EXTENT: f32 = 0.5;

/// Each face as `(normal, u, v)` with `u × v = normal`, so walking the corners
/// `-u-v, +u-v, +u+v, -u+v` is counter-clockwise seen from outside.
///
/// Order: front, right, back, left, bottom, top.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
];

const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// 24 vertices (4 per face, so every face gets flat normals) and 36 indices.
pub fn build(center: Vector3<f32>) -> MeshData {
    let mut mesh = MeshData {
        positions: Vec::with_capacity(24),
        normals: Vec::with_capacity(24),
        indices: Vec::with_capacity(36),
    };
    for (face, (normal, u, v)) in FACES.iter().enumerate() {
        let normal = Vector3::from(*normal);
        let u = Vector3::from(*u);
        let v = Vector3::from(*v);
        for (su, sv) in CORNERS {
            let corner = center + (normal + u * su + v * sv) * HALF_EXTENT;
            mesh.positions.push(corner.extend(1.0).into());
            mesh.normals.push(normal.extend(0.0).into());
        }
        let base = (face * CORNERS.len()) as u32;
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

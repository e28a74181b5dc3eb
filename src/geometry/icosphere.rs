use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3};

use crate::geometry::MeshData;

const X: f32 = 0.525_731_1;
const Z: f32 = 0.850_650_8;

const BASE_POSITIONS: [[f32; 3]; 12] = [
    [-X, 0.0, Z],
    [X, 0.0, Z],
    [-X, 0.0, -Z],
    [X, 0.0, -Z],
    [0.0, Z, X],
    [0.0, Z, -X],
    [0.0, -Z, X],
    [0.0, -Z, -X],
    [Z, X, 0.0],
    [-Z, X, 0.0],
    [Z, -X, 0.0],
    [-Z, -X, 0.0],
];

// Counter-clockwise seen from outside.
const BASE_TRIANGLES: [[u32; 3]; 20] = [
    [0, 1, 4],
    [0, 4, 9],
    [9, 4, 5],
    [4, 8, 5],
    [4, 1, 8],
    [8, 1, 10],
    [8, 10, 3],
    [5, 8, 3],
    [5, 3, 2],
    [2, 3, 7],
    [7, 3, 10],
    [7, 10, 6],
    [7, 6, 11],
    [11, 6, 0],
    [0, 6, 1],
    [6, 10, 1],
    [9, 11, 0],
    [9, 2, 11],
    [9, 5, 2],
    [7, 11, 2],
];

/// Unit-sphere directions plus a cache of already split edges so that
/// neighbouring triangles share their midpoints.
struct Subdivider {
    directions: Vec<Vector3<f32>>,
    midpoints: HashMap<(u32, u32), u32>,
}

impl Subdivider {
    fn midpoint(&mut self, a: u32, b: u32) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&index) = self.midpoints.get(&key) {
            return index;
        }
        let mid = (self.directions[a as usize] + self.directions[b as usize]).normalize();
        let index = self.directions.len() as u32;
        self.directions.push(mid);
        self.midpoints.insert(key, index);
        index
    }

    fn subdivide(&mut self, triangles: Vec<[u32; 3]>) -> Vec<[u32; 3]> {
        self.midpoints.clear();
        let mut out = Vec::with_capacity(triangles.len() * 4);
        for [a, b, c] in triangles {
            let ab = self.midpoint(a, b);
            let bc = self.midpoint(b, c);
            let ca = self.midpoint(c, a);
            out.push([a, ab, ca]);
            out.push([b, bc, ab]);
            out.push([c, ca, bc]);
            out.push([ab, bc, ca]);
        }
        out
    }
}

/// Vertex count of an icosphere with the given subdivision level.
pub fn expected_vertices(subdivisions: u32) -> usize {
    10 * 4usize.pow(subdivisions) + 2
}

/// Index count of an icosphere with the given subdivision level.
pub fn expected_indices(subdivisions: u32) -> usize {
    60 * 4usize.pow(subdivisions)
}

pub fn build(center: Vector3<f32>, radius: f32, subdivisions: u32) -> MeshData {
    let mut subdivider = Subdivider {
        directions: BASE_POSITIONS
            .iter()
            .map(|p| Vector3::from(*p).normalize())
            .collect(),
        midpoints: HashMap::new(),
    };
    let mut triangles = BASE_TRIANGLES.to_vec();
    for _ in 0..subdivisions {
        triangles = subdivider.subdivide(triangles);
    }

    let directions = subdivider.directions;
    MeshData {
        positions: directions
            .iter()
            .map(|d| -> [f32; 4] { (center + d * radius).extend(1.0).into() })
            .collect(),
        normals: directions
            .iter()
            .map(|d| -> [f32; 4] { d.extend(0.0).into() })
            .collect(),
        indices: triangles.into_iter().flatten().collect(),
    }
}

//! Procedural mesh generation.
//!
//! Every shape in the demo is described by a [`Shape`] and turned into plain
//! CPU-side vertex and index tables ([`MeshData`]). Uploading those tables to
//! the GPU is the job of [`crate::data_structures::drawable::Drawable`], so
//! everything in here is testable without a device.
//!
//! Layout of the generated tables:
//!
//! - positions are `[x, y, z, 1.0]`
//! - normals are `[x, y, z, 0.0]` and unit length
//! - indices are `u32` triangle lists with counter-clockwise outward winding

use cgmath::Vector3;

pub mod cube;
pub mod icosphere;
pub mod square;

/// Highest tessellation level the demo exposes for the icosphere.
pub const MAX_TESSELLATION: u32 = 8;

/// Vertex and index tables for one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 4]>,
    pub normals: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of indices, i.e. what a single indexed draw call consumes.
    pub fn element_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over the triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }
}

/// Tagged description of a procedural mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Unit cube (edge length 1) around `center`.
    Cube { center: Vector3<f32> },
    /// 2x2 quad in the xy-plane facing +z.
    Square { center: Vector3<f32> },
    /// Subdivided icosahedron projected onto a sphere.
    Icosphere {
        center: Vector3<f32>,
        radius: f32,
        subdivisions: u32,
    },
}

impl Shape {
    pub fn build(&self) -> MeshData {
        match *self {
            Shape::Cube { center } => cube::build(center),
            Shape::Square { center } => square::build(center),
            Shape::Icosphere {
                center,
                radius,
                subdivisions,
            } => icosphere::build(center, radius, subdivisions),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Cube { .. } => "cube",
            Shape::Square { .. } => "square",
            Shape::Icosphere { .. } => "icosphere",
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use cgmath::{InnerSpace, Vector3};

    use super::MeshData;

    pub(crate) fn xyz(v: [f32; 4]) -> Vector3<f32> {
        Vector3::new(v[0], v[1], v[2])
    }

    /// Asserts that every triangle is wound counter-clockwise when seen from
    /// the side its vertex normals point to.
    pub(crate) fn assert_outward_winding(mesh: &MeshData) {
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (
                xyz(mesh.positions[a as usize]),
                xyz(mesh.positions[b as usize]),
                xyz(mesh.positions[c as usize]),
            );
            let face_normal = (pb - pa).cross(pc - pa);
            let vertex_normal = xyz(mesh.normals[a as usize])
                + xyz(mesh.normals[b as usize])
                + xyz(mesh.normals[c as usize]);
            assert!(
                face_normal.dot(vertex_normal) > 0.0,
                "triangle {:?} is wound inwards",
                [a, b, c]
            );
        }
    }

    pub(crate) fn assert_indices_in_bounds(mesh: &MeshData) {
        let len = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < len));
    }

    pub(crate) fn assert_homogeneous(mesh: &MeshData) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert!(mesh.positions.iter().all(|p| p[3] == 1.0));
        assert!(mesh.normals.iter().all(|n| n[3] == 0.0));
        assert!(
            mesh.normals
                .iter()
                .all(|n| (xyz(*n).magnitude() - 1.0).abs() < 1e-5)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_dispatches_to_its_generator() {
        let origin = Vector3::new(0.0, 0.0, 0.0);
        assert_eq!(Shape::Cube { center: origin }.build().element_count(), 36);
        assert_eq!(Shape::Square { center: origin }.build().element_count(), 6);
        let sphere = Shape::Icosphere {
            center: origin,
            radius: 1.0,
            subdivisions: 1,
        };
        assert_eq!(sphere.build().element_count(), 240);
        assert_eq!(sphere.name(), "icosphere");
    }
}

//! GPU buffers for a single procedural mesh.
//!
//! A [`Drawable`] pairs a [`Shape`] with the index, position and normal buffers
//! generated from it. The buffers are written once on [`Drawable::create`] and
//! never updated in place: changing the shape drops them and the next
//! `create` uploads a fresh set.

use anyhow::bail;
use wgpu::util::DeviceExt;

use crate::geometry::{MeshData, Shape};

/// Bytes per vertex in both the position and the normal buffer (`[f32; 4]`).
pub const VERTEX_STRIDE: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as _;

/// Vertex-buffer slots a shader program expects the attributes in.
///
/// `None` means the program does not read the attribute, so its buffer is
/// not bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeSlots {
    pub position: Option<u32>,
    pub normal: Option<u32>,
}

/// Uploaded buffer set of a drawable.
#[derive(Debug)]
pub struct MeshBuffers {
    pub index: wgpu::Buffer,
    pub position: wgpu::Buffer,
    pub normal: wgpu::Buffer,
    pub count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, mesh: &MeshData, name: &str) -> Self {
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let position = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Position Buffer")),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normal = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Normal Buffer")),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            index,
            position,
            normal,
            count: mesh.element_count(),
        }
    }
}

#[derive(Debug)]
pub struct Drawable {
    shape: Shape,
    buffers: Option<MeshBuffers>,
}

impl Drawable {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            buffers: None,
        }
    }

    /// Generate the mesh for the current shape and upload it, replacing any
    /// previously uploaded buffers.
    pub fn create(&mut self, device: &wgpu::Device) {
        let mesh = self.shape.build();
        let buffers = MeshBuffers::upload(device, &mesh, self.shape.name());
        log::info!(
            "Created {} ({} vertices, {} indices)",
            self.shape.name(),
            mesh.vertex_count(),
            buffers.count
        );
        self.buffers = Some(buffers);
    }

    /// Swap the shape description. The old buffers are released right away,
    /// so the drawable has to be `create`d again before it can be drawn.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.buffers = None;
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_created(&self) -> bool {
        self.buffers.is_some()
    }

    /// Number of indices drawn by [`Drawable::draw`], zero before `create`.
    pub fn element_count(&self) -> u32 {
        self.buffers.as_ref().map_or(0, |b| b.count)
    }

    pub fn buffers(&self) -> Option<&MeshBuffers> {
        self.buffers.as_ref()
    }

    /// Bind the vertex and index buffers and issue one indexed triangle-list draw.
    ///
    /// The pipeline and its bind groups must already be set on `render_pass`.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        slots: &AttributeSlots,
    ) -> anyhow::Result<()> {
        let Some(buffers) = &self.buffers else {
            let name = self.shape.name();
            bail!("{name} was drawn before create() uploaded its buffers");
        };
        if let Some(slot) = slots.position {
            render_pass.set_vertex_buffer(slot, buffers.position.slice(..));
        }
        if let Some(slot) = slots.normal {
            render_pass.set_vertex_buffer(slot, buffers.normal.slice(..));
        }
        render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..buffers.count, 0, 0..1);
        Ok(())
    }
}

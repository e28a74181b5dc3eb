//! Per-pass uniform computation and draw submission.
//!
//! A frame is one [`Renderer::clear`] followed by any number of
//! [`Renderer::render`] calls. Every call computes a [`PassUniforms`] from the
//! camera, the frame counter and the mesh colour, writes it into the program
//! and draws the given drawables on top of what is already in the target.
//!
//! Each call is submitted on its own, so two passes through the same program
//! in one frame still see their own uniform values.

use anyhow::Context;
use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{camera::Camera, data_structures::drawable::Drawable, pipelines::ShaderProgram};

/// Radius of the sun's circular orbit in the xy-plane.
pub const SUN_ORBIT_RADIUS: f32 = 3.5;
/// Frames per radian of the sun's orbit.
pub const SUN_ORBIT_FRAMES_PER_RADIAN: f32 = 400.0;
/// Scale of the mesh standing in for the sun in rotating passes.
pub const SUN_PROXY_SCALE: f32 = 2.0;

/// Position of the sun after `time` frames (w = 1).
pub fn sun_position(time: f32) -> Vector4<f32> {
    let angle = time / SUN_ORBIT_FRAMES_PER_RADIAN;
    Vector4::new(
        SUN_ORBIT_RADIUS * angle.cos(),
        SUN_ORBIT_RADIUS * angle.sin(),
        0.0,
        1.0,
    )
}

/// Map `[r, g, b]` from 0–255 to 0–1. Alpha is passed through unchanged.
pub fn normalize_color(color: [f32; 4]) -> Vector4<f32> {
    let [r, g, b, a] = color;
    Vector4::new(r / 255.0, g / 255.0, b / 255.0, a)
}

/// Everything one pass writes into a program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassUniforms {
    pub model: Matrix4<f32>,
    pub view_proj: Matrix4<f32>,
    pub color: Vector4<f32>,
    pub time: f32,
    pub cam_pos: Vector4<f32>,
    pub light_pos: Vector4<f32>,
}

impl PassUniforms {
    /// `rotates` turns the pass into the sun pass: the model is scaled and
    /// moved onto the sun's orbit and the light sits at the camera.
    pub fn compute(camera: &Camera, time: u32, mesh_color: [f32; 4], rotates: bool) -> Self {
        let time = time as f32;
        let sun = sun_position(time);
        let cam_pos = camera.eye_position();
        let (model, light_pos) = if rotates {
            let model = Matrix4::from_scale(SUN_PROXY_SCALE)
                * Matrix4::from_translation(Vector3::new(sun.x, sun.y, sun.z));
            (model, cam_pos)
        } else {
            (Matrix4::identity(), sun)
        };
        Self {
            model,
            view_proj: camera.projection_matrix() * camera.view_matrix(),
            color: normalize_color(mesh_color),
            time,
            cam_pos,
            light_pos,
        }
    }

    /// Write every uniform. Uniforms the program doesn't declare are skipped.
    pub fn apply(&self, program: &ShaderProgram, queue: &wgpu::Queue) {
        program.set_model_matrix(queue, &self.model);
        program.set_view_proj_matrix(queue, &self.view_proj);
        program.set_geometry_color(queue, &self.color);
        program.set_time(queue, self.time);
        program.set_cam_pos(queue, &self.cam_pos);
        program.set_light_pos(queue, &self.light_pos);
    }
}

/// Colour and depth views a frame is drawn into.
#[derive(Debug, Clone, Copy)]
pub struct RenderTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    clear_color: wgpu::Color,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
        }
    }

    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    /// Clear colour to the configured clear colour and depth to 1.0.
    pub fn clear(&self, device: &wgpu::Device, queue: &wgpu::Queue, target: RenderTarget<'_>) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Clear Encoder"),
        });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draw `drawables` with `program` into `target`.
    ///
    /// Fails without submitting anything if one of the drawables has not been
    /// created yet.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: RenderTarget<'_>,
        camera: &Camera,
        time: u32,
        mesh_color: [f32; 4],
        program: &ShaderProgram,
        drawables: &[&Drawable],
        rotates: bool,
    ) -> anyhow::Result<()> {
        if let Some(missing) = drawables.iter().find(|d| !d.is_created()) {
            anyhow::bail!(
                "pass `{}` got a {} that was never created",
                program.label(),
                missing.shape().name()
            );
        }

        PassUniforms::compute(camera, time, mesh_color, rotates).apply(program, queue);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(program.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            for drawable in drawables {
                program
                    .draw(&mut render_pass, drawable)
                    .with_context(|| format!("pass `{}` failed", program.label()))?;
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

use std::{borrow::Cow, collections::BTreeMap};

use anyhow::{Context, ensure};
use cgmath::{Matrix4, Vector4};

use crate::{
    data_structures::drawable::{AttributeSlots, Drawable, VERTEX_STRIDE},
    pipelines::reflect::{self, Attribute, ProgramInterface, Stage, Uniform},
};

/// One stage of a shader program.
#[derive(Debug, Clone)]
pub struct Shader {
    pub stage: Stage,
    pub source: Cow<'static, str>,
}

impl Shader {
    pub fn new(stage: Stage, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// A linked vertex + fragment pair with its uniform buffers.
///
/// Every uniform the shaders declare gets its own small buffer in bind group
/// [`reflect::UNIFORM_GROUP`]. Setters for uniforms the shaders don't declare
/// do nothing, so one render loop can drive programs that only use part of
/// the uniform set.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    stages: Vec<(Stage, wgpu::ShaderModule)>,
    interface: ProgramInterface,
    uniforms: BTreeMap<Uniform, wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    slots: AttributeSlots,
}

impl ShaderProgram {
    /// Compile and link `shaders` into a render pipeline.
    ///
    /// Requires exactly one vertex and one fragment stage. Compile and link
    /// errors carry the shader diagnostics and are meant to abort startup.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        shaders: &[Shader],
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> anyhow::Result<Self> {
        let vertex = single_stage(shaders, label, Stage::Vertex)?;
        let fragment = single_stage(shaders, label, Stage::Fragment)?;

        let vertex_interface = reflect::compile(Stage::Vertex, &vertex.source)
            .and_then(|module| reflect::reflect(&module, Stage::Vertex))
            .with_context(|| format!("failed to compile `{label}`"))?;
        let fragment_interface = reflect::compile(Stage::Fragment, &fragment.source)
            .and_then(|module| reflect::reflect(&module, Stage::Fragment))
            .with_context(|| format!("failed to compile `{label}`"))?;
        let interface = reflect::link(&vertex_interface, &fragment_interface)
            .with_context(|| format!("failed to link `{label}`"))?;

        let stages: Vec<(Stage, wgpu::ShaderModule)> = shaders
            .iter()
            .map(|shader| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{label} {:?} Shader", shader.stage)),
                    source: wgpu::ShaderSource::Wgsl(shader.source.clone()),
                });
                (shader.stage, module)
            })
            .collect();

        let uniforms: BTreeMap<Uniform, wgpu::Buffer> = interface
            .uniforms
            .keys()
            .map(|uniform| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{label} {} Buffer", uniform.name())),
                    size: uniform.buffer_size(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (*uniform, buffer)
            })
            .collect();

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = interface
            .uniforms
            .values()
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding: *binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} uniform_bind_group_layout")),
            entries: &layout_entries,
        });
        let group_entries: Vec<wgpu::BindGroupEntry> = interface
            .uniforms
            .iter()
            .filter_map(|(uniform, binding)| {
                uniforms.get(uniform).map(|buffer| wgpu::BindGroupEntry {
                    binding: *binding,
                    resource: buffer.as_entire_binding(),
                })
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} uniform_bind_group")),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        // Positions and normals live in separate buffers, one slot each, in
        // attribute order.
        let mut slots = AttributeSlots::default();
        let attribute_formats: Vec<[wgpu::VertexAttribute; 1]> = interface
            .attributes
            .iter()
            .enumerate()
            .map(|(slot, (attribute, location))| {
                match attribute {
                    Attribute::Position => slots.position = Some(slot as u32),
                    Attribute::Normal => slots.normal = Some(slot as u32),
                }
                [wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: *location,
                    format: wgpu::VertexFormat::Float32x4,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout> = attribute_formats
            .iter()
            .map(|attributes| wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let module_of = |stage: Stage| {
            stages
                .iter()
                .find(|(s, _)| *s == stage)
                .map(|(_, module)| module)
                .with_context(|| format!("program `{label}` lost its {stage:?} module"))
        };
        let vertex_module = module_of(Stage::Vertex)?;
        let fragment_module = module_of(Stage::Fragment)?;
        let vertex_entry = vertex_interface.entry_point.as_str();
        let fragment_entry = fragment_interface.entry_point.as_str();
        let pipeline = mk_render_pipeline(
            device,
            label,
            &pipeline_layout,
            color_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_format,
            &vertex_layouts,
            (vertex_module, vertex_entry),
            (fragment_module, fragment_entry),
        );

        let uniform_names: Vec<_> = interface.uniforms.keys().map(|u| u.name()).collect();
        let attribute_names: Vec<_> = interface.attributes.keys().map(|a| a.name()).collect();
        log::info!("Linked `{label}`: {uniform_names:?} {attribute_names:?}");

        Ok(Self {
            label: label.to_string(),
            pipeline,
            stages,
            interface,
            uniforms,
            bind_group,
            slots,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the linked shaders declare `uniform`.
    pub fn has_uniform(&self, uniform: Uniform) -> bool {
        self.uniforms.contains_key(&uniform)
    }

    /// Binding index of `uniform`, `None` if the shaders don't declare it.
    pub fn uniform_location(&self, uniform: Uniform) -> Option<u32> {
        self.interface.uniforms.get(&uniform).copied()
    }

    /// Shader location of `attribute`, `None` if the vertex stage doesn't read it.
    pub fn attribute_location(&self, attribute: Attribute) -> Option<u32> {
        self.interface.attributes.get(&attribute).copied()
    }

    pub fn attribute_slots(&self) -> AttributeSlots {
        self.slots
    }

    /// Shader modules in the order the stages were passed in.
    pub fn stages(&self) -> impl Iterator<Item = (Stage, &wgpu::ShaderModule)> {
        self.stages.iter().map(|(stage, module)| (*stage, module))
    }

    pub fn set_model_matrix(&self, queue: &wgpu::Queue, model: &Matrix4<f32>) {
        self.write_matrix(queue, Uniform::Model, model);
    }

    pub fn set_view_proj_matrix(&self, queue: &wgpu::Queue, view_proj: &Matrix4<f32>) {
        self.write_matrix(queue, Uniform::ViewProj, view_proj);
    }

    pub fn set_geometry_color(&self, queue: &wgpu::Queue, color: &Vector4<f32>) {
        self.write_vector(queue, Uniform::GeometryColor, color);
    }

    pub fn set_time(&self, queue: &wgpu::Queue, time: f32) {
        let padded = [time, 0.0, 0.0, 0.0];
        self.write(queue, Uniform::Time, bytemuck::cast_slice(&padded));
    }

    pub fn set_cam_pos(&self, queue: &wgpu::Queue, position: &Vector4<f32>) {
        self.write_vector(queue, Uniform::CamPos, position);
    }

    pub fn set_light_pos(&self, queue: &wgpu::Queue, position: &Vector4<f32>) {
        self.write_vector(queue, Uniform::LightPos, position);
    }

    /// Bind this program and draw `drawable` with it.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        drawable: &Drawable,
    ) -> anyhow::Result<()> {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(reflect::UNIFORM_GROUP, &self.bind_group, &[]);
        drawable
            .draw(render_pass, &self.slots)
            .with_context(|| format!("program `{}` could not draw", self.label))
    }

    fn write_matrix(&self, queue: &wgpu::Queue, uniform: Uniform, matrix: &Matrix4<f32>) {
        let raw: [[f32; 4]; 4] = (*matrix).into();
        self.write(queue, uniform, bytemuck::cast_slice(&raw));
    }

    fn write_vector(&self, queue: &wgpu::Queue, uniform: Uniform, vector: &Vector4<f32>) {
        let raw: [f32; 4] = (*vector).into();
        self.write(queue, uniform, bytemuck::cast_slice(&raw));
    }

    fn write(&self, queue: &wgpu::Queue, uniform: Uniform, bytes: &[u8]) {
        if let Some(buffer) = self.uniforms.get(&uniform) {
            queue.write_buffer(buffer, 0, bytes);
        }
    }
}

fn single_stage<'a>(
    shaders: &'a [Shader],
    label: &str,
    stage: Stage,
) -> anyhow::Result<&'a Shader> {
    let mut matching = shaders.iter().filter(|s| s.stage == stage);
    let shader = matching
        .next()
        .with_context(|| format!("program `{label}` has no {stage:?} stage"))?;
    ensure!(
        matching.next().is_none(),
        "program `{label}` has more than one {stage:?} stage"
    );
    Ok(shader)
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    (vertex, vertex_entry): (&wgpu::ShaderModule, &str),
    (fragment, fragment_entry): (&wgpu::ShaderModule, &str),
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(&format!("{label} Render Pipeline")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some(vertex_entry),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // The square is single sided and the passes are layered on top of
            // each other, so nothing is culled.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}

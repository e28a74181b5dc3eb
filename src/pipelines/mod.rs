//! Shader programs used by the demo.
//!
//! - `reflect` compiles WGSL with naga and resolves uniform/attribute locations
//! - `program` links stages into a [`ShaderProgram`] and sets its uniforms
//!
//! [`Programs`] bundles the three programs drawn every frame.

pub mod program;
pub mod reflect;

pub use program::{Shader, ShaderProgram};
pub use reflect::{Attribute, Stage, Uniform};

/// The lambert, passthrough and gradient programs.
#[derive(Debug)]
pub struct Programs {
    pub lambert: ShaderProgram,
    pub passthrough: ShaderProgram,
    pub gradient: ShaderProgram,
}

impl Programs {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> anyhow::Result<Self> {
        let build = |label: &str, shaders: [Shader; 2]| {
            ShaderProgram::new(device, label, &shaders, color_format, depth_format)
        };
        Ok(Self {
            lambert: build("lambert", lambert_shaders())?,
            passthrough: build("passthrough", passthrough_shaders())?,
            gradient: build("gradient", gradient_shaders())?,
        })
    }
}

pub fn lambert_shaders() -> [Shader; 2] {
    bundled(
        include_str!("../shaders/lambert.vert.wgsl"),
        include_str!("../shaders/lambert.frag.wgsl"),
    )
}

pub fn passthrough_shaders() -> [Shader; 2] {
    bundled(
        include_str!("../shaders/passthrough.vert.wgsl"),
        include_str!("../shaders/passthrough.frag.wgsl"),
    )
}

pub fn gradient_shaders() -> [Shader; 2] {
    bundled(
        include_str!("../shaders/gradient.vert.wgsl"),
        include_str!("../shaders/gradient.frag.wgsl"),
    )
}

fn bundled(vertex: &'static str, fragment: &'static str) -> [Shader; 2] {
    [
        Shader::new(Stage::Vertex, vertex),
        Shader::new(Stage::Fragment, fragment),
    ]
}

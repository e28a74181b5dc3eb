#![cfg(feature = "integration-tests")]

mod common;

use cgmath::{Matrix4, SquareMatrix, Vector4};
use sunflow::{
    data_structures::texture::Texture,
    pipelines::{Attribute, Programs, Shader, ShaderProgram, Stage, Uniform, lambert_shaders},
};

const PLAIN_VERTEX: &str = r#"
@group(0) @binding(0) var<uniform> u_Model: mat4x4<f32>;
@group(0) @binding(1) var<uniform> u_ViewProj: mat4x4<f32>;

@vertex
fn main(@location(0) vs_Pos: vec4<f32>) -> @builtin(position) vec4<f32> {
    return u_ViewProj * u_Model * vs_Pos;
}
"#;

const PLAIN_FRAGMENT: &str = r#"
@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

#[test]
fn bundled_programs_link_on_a_device() {
    let Some(gpu) = common::gpu() else { return };
    let depth = Some(Texture::DEPTH_FORMAT);
    let programs = Programs::new(&gpu.device, common::FORMAT, depth).unwrap();

    let lambert = &programs.lambert;
    assert_eq!(lambert.uniform_location(Uniform::Model), Some(0));
    assert_eq!(lambert.uniform_location(Uniform::GeometryColor), Some(2));
    assert!(lambert.attribute_location(Attribute::Normal).is_some());
    assert!(!programs.passthrough.has_uniform(Uniform::GeometryColor));
    assert!(programs.gradient.has_uniform(Uniform::Time));
    assert_eq!(programs.gradient.stages().count(), 2);
}

#[test]
fn setters_skip_missing_uniforms() {
    let Some(gpu) = common::gpu() else { return };
    let program = ShaderProgram::new(
        &gpu.device,
        "plain",
        &[
            Shader::new(Stage::Vertex, PLAIN_VERTEX),
            Shader::new(Stage::Fragment, PLAIN_FRAGMENT),
        ],
        common::FORMAT,
        Some(Texture::DEPTH_FORMAT),
    )
    .unwrap();

    assert!(!program.has_uniform(Uniform::Time));
    assert_eq!(program.attribute_slots().normal, None);
    program.set_model_matrix(&gpu.queue, &Matrix4::identity());
    program.set_time(&gpu.queue, 3.0);
    program.set_geometry_color(&gpu.queue, &Vector4::new(1.0, 0.0, 0.0, 1.0));
    program.set_light_pos(&gpu.queue, &Vector4::new(0.0, 0.0, 0.0, 1.0));
    gpu.queue.submit([]);
}

#[test]
fn needs_one_shader_per_stage() {
    let Some(gpu) = common::gpu() else { return };
    let [vertex, _] = lambert_shaders();
    let only_vertex = ShaderProgram::new(
        &gpu.device,
        "vertex only",
        &[vertex.clone()],
        common::FORMAT,
        None,
    );
    assert!(only_vertex.is_err());

    let fragment = Shader::new(Stage::Fragment, PLAIN_FRAGMENT);
    let twice = ShaderProgram::new(
        &gpu.device,
        "two vertex stages",
        &[vertex.clone(), vertex, fragment],
        common::FORMAT,
        None,
    );
    let message = format!("{:#}", twice.unwrap_err());
    assert!(message.contains("more than one"), "{message}");
}

#[test]
fn compile_errors_name_the_program() {
    let Some(gpu) = common::gpu() else { return };
    let result = ShaderProgram::new(
        &gpu.device,
        "broken",
        &[
            Shader::new(Stage::Vertex, "@vertex fn main( -> {"),
            Shader::new(Stage::Fragment, PLAIN_FRAGMENT),
        ],
        common::FORMAT,
        None,
    );
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("broken"), "{message}");
}

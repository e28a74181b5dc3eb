//! WGSL compilation and interface reflection.
//!
//! Shader stages are parsed and validated with `naga` before they ever reach
//! the device. The parsed module is then inspected for the uniforms and
//! vertex attributes the demo knows about, which gives each program a
//! location table comparable to `glGetUniformLocation`/`glGetAttribLocation`.
//! Linking two stages checks that their interfaces fit together.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, bail, ensure};
use naga::valid::{Capabilities, ValidationFlags, Validator};

/// Bind group every uniform has to live in.
pub const UNIFORM_GROUP: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// The fixed set of uniforms a program may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Uniform {
    Model,
    ViewProj,
    GeometryColor,
    Time,
    CamPos,
    LightPos,
}

impl Uniform {
    pub const ALL: [Uniform; 6] = [
        Uniform::Model,
        Uniform::ViewProj,
        Uniform::GeometryColor,
        Uniform::Time,
        Uniform::CamPos,
        Uniform::LightPos,
    ];

    /// Variable name the uniform is declared under in WGSL.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Model => "u_Model",
            Uniform::ViewProj => "u_ViewProj",
            Uniform::GeometryColor => "u_Color",
            Uniform::Time => "u_Time",
            Uniform::CamPos => "u_CamPos",
            Uniform::LightPos => "u_LightPos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.name() == name)
    }

    /// Size of the backing buffer. Scalars are padded to 16 bytes so every
    /// uniform block satisfies WebGL2's std140 rules.
    pub fn buffer_size(self) -> wgpu::BufferAddress {
        match self {
            Uniform::Model | Uniform::ViewProj => 64,
            _ => 16,
        }
    }

    fn accepts(self, inner: &naga::TypeInner) -> bool {
        use naga::{TypeInner, VectorSize};
        match (self, inner) {
            (
                Uniform::Model | Uniform::ViewProj,
                TypeInner::Matrix {
                    columns: VectorSize::Quad,
                    rows: VectorSize::Quad,
                    ..
                },
            ) => true,
            (
                Uniform::GeometryColor | Uniform::CamPos | Uniform::LightPos,
                TypeInner::Vector {
                    size: VectorSize::Quad,
                    ..
                },
            ) => true,
            (Uniform::Time, TypeInner::Scalar(scalar)) => scalar.kind == naga::ScalarKind::Float,
            _ => false,
        }
    }

    fn expected_type(self) -> &'static str {
        match self {
            Uniform::Model | Uniform::ViewProj => "mat4x4<f32>",
            Uniform::GeometryColor | Uniform::CamPos | Uniform::LightPos => "vec4<f32>",
            Uniform::Time => "f32",
        }
    }
}

/// Per-vertex inputs the drawables can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Position,
    Normal,
}

impl Attribute {
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Position => "vs_Pos",
            Attribute::Normal => "vs_Nor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Attribute::Position, Attribute::Normal]
            .into_iter()
            .find(|a| a.name() == name)
    }
}

/// What a single compiled stage declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageInterface {
    pub entry_point: String,
    pub uniforms: BTreeMap<Uniform, u32>,
    pub attributes: BTreeMap<Attribute, u32>,
    pub inputs: BTreeSet<u32>,
    pub outputs: BTreeSet<u32>,
}

/// Resolved locations of a linked vertex + fragment pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    /// Uniform to binding index within [`UNIFORM_GROUP`].
    pub uniforms: BTreeMap<Uniform, u32>,
    /// Attribute to `@location` of the vertex stage.
    pub attributes: BTreeMap<Attribute, u32>,
}

/// Parse and validate one WGSL stage.
pub fn compile(stage: Stage, source: &str) -> anyhow::Result<naga::Module> {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => {
            let report = e.emit_to_string(source);
            bail!("{stage:?} shader failed to parse:\n{report}");
        }
    };
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::empty());
    if let Err(e) = validator.validate(&module) {
        bail!("{stage:?} shader failed validation: {e}");
    }
    let wanted = stage.naga();
    ensure!(
        module.entry_points.iter().any(|ep| ep.stage == wanted),
        "{stage:?} shader has no {stage:?} entry point"
    );
    Ok(module)
}

/// Collect the uniforms, attributes and stage I/O locations of `module`.
pub fn reflect(module: &naga::Module, stage: Stage) -> anyhow::Result<StageInterface> {
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga())
        .with_context(|| format!("no {:?} entry point", stage))?;
    let mut interface = StageInterface {
        entry_point: entry.name.clone(),
        ..Default::default()
    };

    for (_, var) in module.global_variables.iter() {
        let Some(uniform) = var.name.as_deref().and_then(Uniform::from_name) else {
            continue;
        };
        ensure!(
            var.space == naga::AddressSpace::Uniform,
            "`{}` must be declared as var<uniform>",
            uniform.name()
        );
        let binding = var
            .binding
            .as_ref()
            .with_context(|| format!("`{}` has no @group/@binding", uniform.name()))?;
        ensure!(
            binding.group == UNIFORM_GROUP,
            "`{}` is in group {} but uniforms belong to group {}",
            uniform.name(),
            binding.group,
            UNIFORM_GROUP
        );
        ensure!(
            uniform.accepts(&module.types[var.ty].inner),
            "`{}` must have type {}",
            uniform.name(),
            uniform.expected_type()
        );
        interface.uniforms.insert(uniform, binding.binding);
    }

    for (name, binding) in entry_inputs(module, &entry.function) {
        let Some(naga::Binding::Location { location, .. }) = binding else {
            continue;
        };
        interface.inputs.insert(*location);
        if stage == Stage::Vertex {
            let attribute = name.and_then(Attribute::from_name).with_context(|| {
                format!(
                    "vertex input at @location({}) is neither {} nor {}",
                    location,
                    Attribute::Position.name(),
                    Attribute::Normal.name()
                )
            })?;
            interface.attributes.insert(attribute, *location);
        }
    }

    if let Some(result) = &entry.function.result {
        for binding in bindings_of(module, result.ty, result.binding.as_ref()) {
            if let naga::Binding::Location { location, .. } = binding {
                interface.outputs.insert(*location);
            }
        }
    }

    Ok(interface)
}

/// Check that a vertex and a fragment stage fit together and merge their
/// location tables.
pub fn link(
    vertex: &StageInterface,
    fragment: &StageInterface,
) -> anyhow::Result<ProgramInterface> {
    if let Some(missing) = fragment.inputs.difference(&vertex.outputs).next() {
        bail!(
            "fragment input @location({}) is not written by the vertex stage",
            missing
        );
    }

    let mut uniforms = vertex.uniforms.clone();
    for (uniform, binding) in &fragment.uniforms {
        if let Some(existing) = uniforms.get(uniform).copied() {
            ensure!(
                existing == *binding,
                "`{}` is bound to {} in the vertex stage but {} in the fragment stage",
                uniform.name(),
                existing,
                binding
            );
        }
        uniforms.insert(*uniform, *binding);
    }

    let mut seen: BTreeMap<u32, Uniform> = BTreeMap::new();
    for (uniform, binding) in &uniforms {
        if let Some(other) = seen.insert(*binding, *uniform) {
            bail!(
                "`{}` and `{}` share binding {}",
                other.name(),
                uniform.name(),
                binding
            );
        }
    }

    Ok(ProgramInterface {
        uniforms,
        attributes: vertex.attributes.clone(),
    })
}

/// Named bindings of every entry point argument, flattening struct arguments.
fn entry_inputs<'m>(
    module: &'m naga::Module,
    function: &'m naga::Function,
) -> Vec<(Option<&'m str>, Option<&'m naga::Binding>)> {
    let mut inputs = Vec::new();
    for arg in &function.arguments {
        match (&arg.binding, &module.types[arg.ty].inner) {
            (None, naga::TypeInner::Struct { members, .. }) => inputs.extend(
                members
                    .iter()
                    .map(|m| (m.name.as_deref(), m.binding.as_ref())),
            ),
            (binding, _) => inputs.push((arg.name.as_deref(), binding.as_ref())),
        }
    }
    inputs
}

fn bindings_of<'m>(
    module: &'m naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&'m naga::Binding>,
) -> Vec<&'m naga::Binding> {
    match (binding, &module.types[ty].inner) {
        (Some(binding), _) => vec![binding],
        (None, naga::TypeInner::Struct { members, .. }) => {
            members.iter().filter_map(|m| m.binding.as_ref()).collect()
        }
        (None, _) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
@group(0) @binding(0) var<uniform> u_Model: mat4x4<f32>;
@group(0) @binding(1) var<uniform> u_ViewProj: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) fs_Nor: vec4<f32>,
};

@vertex
fn vs_main(@location(0) vs_Pos: vec4<f32>, @location(1) vs_Nor: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.fs_Nor = vs_Nor;
    out.clip_position = u_ViewProj * u_Model * vs_Pos;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@group(0) @binding(2) var<uniform> u_Color: vec4<f32>;

@fragment
fn fs_main(@location(0) fs_Nor: vec4<f32>) -> @location(0) vec4<f32> {
    return u_Color * abs(fs_Nor.z);
}
"#;

    fn stage(stage: Stage, source: &str) -> StageInterface {
        let module = compile(stage, source).unwrap();
        reflect(&module, stage).unwrap()
    }

    #[test]
    fn resolves_declared_uniforms_and_attributes() {
        let vertex = stage(Stage::Vertex, VERTEX);
        assert_eq!(vertex.entry_point, "vs_main");
        assert_eq!(
            vertex.uniforms,
            BTreeMap::from([(Uniform::Model, 0), (Uniform::ViewProj, 1)])
        );
        assert_eq!(
            vertex.attributes,
            BTreeMap::from([(Attribute::Position, 0), (Attribute::Normal, 1)])
        );
        assert_eq!(vertex.outputs, BTreeSet::from([0]));
    }

    #[test]
    fn link_merges_uniform_tables() {
        let vertex = stage(Stage::Vertex, VERTEX);
        let fragment = stage(Stage::Fragment, FRAGMENT);
        let program = link(&vertex, &fragment).unwrap();
        assert_eq!(program.uniforms.len(), 3);
        assert_eq!(program.uniforms.get(&Uniform::GeometryColor), Some(&2));
        assert!(!program.uniforms.contains_key(&Uniform::Time));
        assert!(!program.uniforms.contains_key(&Uniform::LightPos));
    }

    #[test]
    fn struct_inputs_are_flattened() {
        let source = r#"
struct VertexInput {
    @location(3) vs_Pos: vec4<f32>,
    @builtin(vertex_index) index: u32,
};

@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return in.vs_Pos;
}
"#;
        let vertex = stage(Stage::Vertex, source);
        let expected = BTreeMap::from([(Attribute::Position, 3)]);
        assert_eq!(vertex.attributes, expected);
        assert!(vertex.uniforms.is_empty());
    }

    #[test]
    fn rejects_syntax_errors() {
        let err = compile(Stage::Fragment, "@fragment fn fs_main( -> {").unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn rejects_missing_entry_point() {
        let err = compile(Stage::Fragment, VERTEX).unwrap_err();
        assert!(err.to_string().contains("entry point"));
    }

    #[test]
    fn rejects_uniform_of_the_wrong_type() {
        let source = r#"
@group(0) @binding(3) var<uniform> u_Time: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u_Time;
}
"#;
        let module = compile(Stage::Fragment, source).unwrap();
        let err = reflect(&module, Stage::Fragment).unwrap_err();
        assert!(err.to_string().contains("f32"));
    }

    #[test]
    fn rejects_unknown_vertex_inputs() {
        let source = r#"
@vertex
fn vs_main(
    @location(0) vs_Pos: vec4<f32>,
    @location(1) vs_Uv: vec2<f32>,
) -> @builtin(position) vec4<f32> {
    return vs_Pos + vec4<f32>(vs_Uv, 0.0, 0.0);
}
"#;
        let module = compile(Stage::Vertex, source).unwrap();
        assert!(reflect(&module, Stage::Vertex).is_err());
    }

    #[test]
    fn link_rejects_unwritten_fragment_inputs() {
        let fragment = r#"
@fragment
fn fs_main(@location(0) a: vec4<f32>, @location(4) b: vec4<f32>) -> @location(0) vec4<f32> {
    return a + b;
}
"#;
        let vertex = stage(Stage::Vertex, VERTEX);
        let fragment = stage(Stage::Fragment, fragment);
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.to_string().contains("@location(4)"));
    }

    #[test]
    fn link_rejects_conflicting_bindings() {
        let fragment = r#"
@group(0) @binding(1) var<uniform> u_Color: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u_Color;
}
"#;
        let vertex = stage(Stage::Vertex, VERTEX);
        let fragment = stage(Stage::Fragment, fragment);
        let err = link(&vertex, &fragment).unwrap_err();
        assert!(err.to_string().contains("share binding 1"));
    }
}

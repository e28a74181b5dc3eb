//! sunflow
//!
//! A small procedural-mesh demo on wgpu that runs natively and in the browser.
//! A tessellated icosphere is drawn three times per frame: diffusely lit by an
//! orbiting sun, coloured by its normals, and as the sun itself with an
//! animated gradient.
//!
//! High-level modules
//! - `geometry`: CPU-side generation of the cube, square and icosphere meshes
//! - `data_structures`: GPU-side drawables and the depth texture
//! - `pipelines`: WGSL shader programs with reflected uniform/attribute locations
//! - `render`: per-pass uniforms and draw submission
//! - `camera`: perspective camera and mouse orbit controller
//! - `scene`: the demo's drawables and user controls
//! - `context`: window, surface, device and queue
//! - `flow`: event loop and frame driver
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod geometry;
pub mod pipelines;
pub mod render;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    flow::run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

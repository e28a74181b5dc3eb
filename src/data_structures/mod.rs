//! GPU-resident data owned by the demo.
//!
//! - `drawable` uploads procedural meshes and issues their indexed draw calls
//! - `texture` wraps the depth attachment shared by all render passes

pub mod drawable;
pub mod texture;

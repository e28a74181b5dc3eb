//! Demo scene: the drawables and the user-editable controls.

use cgmath::Vector3;

use crate::{
    data_structures::drawable::Drawable,
    geometry::{MAX_TESSELLATION, Shape},
};

pub const DEFAULT_TESSELLATIONS: u32 = 5;
pub const DEFAULT_MESH_COLOR: [f32; 4] = [0.0, 0.0, 255.0, 0.5];
/// Amount a colour channel moves per key press.
pub const CHANNEL_STEP: f32 = 16.0;
pub const ALPHA_STEP: f32 = 0.1;

/// Colour channel addressed by [`Controls::step_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Values the user can change while the demo runs.
///
/// `mesh_color` holds r, g, b in 0–255 and alpha in 0–1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    tessellations: u32,
    pub mesh_color: [f32; 4],
}

impl Controls {
    pub fn tessellations(&self) -> u32 {
        self.tessellations
    }

    /// Values above [`MAX_TESSELLATION`] are clamped.
    pub fn set_tessellations(&mut self, tessellations: u32) {
        self.tessellations = tessellations.min(MAX_TESSELLATION);
    }

    pub fn adjust_tessellations(&mut self, delta: i32) {
        let next = self.tessellations.saturating_add_signed(delta);
        self.set_tessellations(next);
    }

    /// Step a channel by `steps` * [`CHANNEL_STEP`], wrapping around within 0..=255.
    pub fn step_channel(&mut self, channel: Channel, steps: i32) {
        let value = &mut self.mesh_color[channel.index()];
        *value = (*value + steps as f32 * CHANNEL_STEP).rem_euclid(256.0);
    }

    pub fn step_alpha(&mut self, steps: i32) {
        let alpha = self.mesh_color[3] + steps as f32 * ALPHA_STEP;
        // Snap to a tenth so repeated steps don't drift.
        self.mesh_color[3] = ((alpha * 10.0).round() / 10.0).clamp(0.0, 1.0);
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            tessellations: DEFAULT_TESSELLATIONS,
            mesh_color: DEFAULT_MESH_COLOR,
        }
    }
}

/// All meshes of the demo. Only the icosphere is drawn every frame; the
/// square and the cube are generated and uploaded along with it.
#[derive(Debug)]
pub struct Scene {
    pub icosphere: Drawable,
    pub square: Drawable,
    pub cube: Drawable,
    loaded_tessellations: u32,
}

fn icosphere_shape(tessellations: u32) -> Shape {
    Shape::Icosphere {
        center: Vector3::new(0.0, 0.0, 0.0),
        radius: 1.0,
        subdivisions: tessellations.min(MAX_TESSELLATION),
    }
}

impl Scene {
    /// Build and upload every drawable.
    pub fn load(device: &wgpu::Device, tessellations: u32) -> Self {
        let origin = Vector3::new(0.0, 0.0, 0.0);
        let mut scene = Self {
            icosphere: Drawable::new(icosphere_shape(tessellations)),
            square: Drawable::new(Shape::Square { center: origin }),
            cube: Drawable::new(Shape::Cube { center: origin }),
            loaded_tessellations: tessellations.min(MAX_TESSELLATION),
        };
        scene.create_all(device);
        scene
    }

    /// Regenerate every drawable, using `tessellations` for the icosphere.
    pub fn reload(&mut self, device: &wgpu::Device, tessellations: u32) {
        let tessellations = tessellations.min(MAX_TESSELLATION);
        log::info!("Loading scene with {tessellations} tessellations");
        self.icosphere.set_shape(icosphere_shape(tessellations));
        self.loaded_tessellations = tessellations;
        self.create_all(device);
    }

    /// Rebuild the icosphere if `tessellations` differs from what is loaded.
    /// Returns whether anything was rebuilt.
    pub fn sync_tessellations(&mut self, device: &wgpu::Device, tessellations: u32) -> bool {
        let tessellations = tessellations.min(MAX_TESSELLATION);
        if tessellations == self.loaded_tessellations {
            return false;
        }
        self.icosphere.set_shape(icosphere_shape(tessellations));
        self.icosphere.create(device);
        self.loaded_tessellations = tessellations;
        true
    }

    pub fn loaded_tessellations(&self) -> u32 {
        self.loaded_tessellations
    }

    fn create_all(&mut self, device: &wgpu::Device) {
        self.icosphere.create(device);
        self.square.create(device);
        self.cube.create(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let controls = Controls::default();
        assert_eq!(controls.tessellations(), 5);
        assert_eq!(controls.mesh_color, [0.0, 0.0, 255.0, 0.5]);
    }

    #[test]
    fn tessellations_stay_in_range() {
        let mut controls = Controls::default();
        controls.set_tessellations(42);
        assert_eq!(controls.tessellations(), MAX_TESSELLATION);
        controls.adjust_tessellations(1);
        assert_eq!(controls.tessellations(), MAX_TESSELLATION);
        controls.set_tessellations(0);
        controls.adjust_tessellations(-1);
        assert_eq!(controls.tessellations(), 0);
        controls.adjust_tessellations(3);
        assert_eq!(controls.tessellations(), 3);
    }

    #[test]
    fn channels_wrap_around() {
        let mut controls = Controls::default();
        controls.step_channel(Channel::Blue, 1);
        assert_eq!(controls.mesh_color[2], 15.0);
        controls.step_channel(Channel::Red, -1);
        assert_eq!(controls.mesh_color[0], 240.0);
        controls.step_channel(Channel::Green, 2);
        assert_eq!(controls.mesh_color[1], 32.0);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut controls = Controls::default();
        for _ in 0..10 {
            controls.step_alpha(1);
        }
        assert_eq!(controls.mesh_color[3], 1.0);
        controls.step_alpha(-3);
        assert_eq!(controls.mesh_color[3], 0.7);
        for _ in 0..20 {
            controls.step_alpha(-1);
        }
        assert_eq!(controls.mesh_color[3], 0.0);
    }

    #[test]
    fn icosphere_shape_clamps_subdivisions() {
        match icosphere_shape(20) {
            Shape::Icosphere { subdivisions, .. } => assert_eq!(subdivisions, MAX_TESSELLATION),
            other => panic!("unexpected shape {other:?}"),
        }
    }
}

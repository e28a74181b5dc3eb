//! Orbit camera.
//!
//! [`Camera`] caches its view and projection matrices; call
//! [`Camera::update`] after moving the eye and
//! [`Camera::update_projection_matrix`] after changing the aspect ratio.
//! [`OrbitController`] turns mouse drags and scrolling into rotations of the
//! eye around the target.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, Vector4};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

/// wgpu's clip space has z in [0, 1] while cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    aspect: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(eye: impl Into<Point3<f32>>, target: impl Into<Point3<f32>>) -> Self {
        let mut camera = Self {
            eye: eye.into(),
            target: target.into(),
            up: Vector3::unit_y(),
            fovy: Deg(45.0).into(),
            znear: 0.1,
            zfar: 1000.0,
            aspect: 1.0,
            view: Matrix4::from_scale(1.0),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update();
        camera.update_projection_matrix();
        camera
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn update_projection_matrix(&mut self) {
        let perspective = cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar);
        self.projection = OPENGL_TO_WGPU_MATRIX * perspective;
    }

    /// Recompute the view matrix from eye, target and up.
    pub fn update(&mut self) {
        self.view = Matrix4::look_at_rh(self.eye, self.target, self.up);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_proj_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Eye position as a homogeneous point (w = 1).
    pub fn eye_position(&self) -> Vector4<f32> {
        Vector4::new(self.eye.x, self.eye.y, self.eye.z, 1.0)
    }
}

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 100.0;
// Keeps the eye off the poles where look_at degenerates.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Mouse-driven orbit around the camera target.
///
/// Input is accumulated from window events and applied in [`OrbitController::update`].
#[derive(Debug, Clone)]
pub struct OrbitController {
    rotate_speed: f32,
    zoom_speed: f32,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
    yaw: f32,
    pitch: f32,
    zoom: f32,
}

impl OrbitController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            dragging: false,
            cursor: None,
            yaw: 0.0,
            pitch: 0.0,
            zoom: 0.0,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.dragging = *state == ElementState::Pressed,
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(previous)) = (self.dragging, self.cursor) {
                    self.handle_mouse(position.x - previous.x, position.y - previous.y);
                }
                self.cursor = Some(*position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }
            _ => {}
        }
    }

    /// Queue a rotation from a mouse movement in pixels.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.yaw += dx as f32;
        self.pitch += dy as f32;
    }

    /// Apply and clear the accumulated input.
    pub fn update(&mut self, camera: &mut Camera) {
        if self.yaw == 0.0 && self.pitch == 0.0 && self.zoom == 0.0 {
            return;
        }
        let offset = camera.eye - camera.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        let yaw = offset.x.atan2(offset.z) - self.yaw * self.rotate_speed;
        let pitch = ((offset.y / distance).asin() + self.pitch * self.rotate_speed)
            .clamp(-MAX_PITCH, MAX_PITCH);
        let distance =
            (distance * (1.0 - self.zoom * self.zoom_speed)).clamp(MIN_DISTANCE, MAX_DISTANCE);

        camera.eye = camera.target
            + Vector3::new(
                distance * pitch.cos() * yaw.sin(),
                distance * pitch.sin(),
                distance * pitch.cos() * yaw.cos(),
            );
        camera.update();

        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = 0.0;
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(0.005, 0.1)
    }
}

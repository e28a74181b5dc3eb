//! Application event loop.
//!
//! [`run`] opens a window and drives the demo through winit's
//! [`ApplicationHandler`]. Each redraw advances the frame counter, applies
//! pending camera and tessellation changes and draws the icosphere three
//! times: lit by the sun, with the normal-colour passthrough program, and as
//! the orbiting gradient sun.
//!
//! # Controls
//!
//! | Key | Effect |
//! |-----|--------|
//! | Up / Down | more / fewer tessellations |
//! | R, G, B (Shift: backwards) | step a colour channel |
//! | `]` / `[` | raise / lower alpha |
//! | L | load the scene again |
//! | Esc | quit |
//!
//! Dragging with the left mouse button orbits the camera, the wheel zooms.

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::Window,
};

use crate::{
    camera::Camera,
    context::{Context, report_fatal},
    data_structures::texture::Texture,
    pipelines::Programs,
    render::{RenderTarget, Renderer},
    scene::{Channel, Controls, Scene},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything drawn each frame, independent of the window it is drawn into.
#[derive(Debug)]
pub struct Demo {
    pub renderer: Renderer,
    pub programs: Programs,
    pub scene: Scene,
    pub controls: Controls,
    /// Frames drawn so far.
    pub time: u32,
}

impl Demo {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        let programs = Programs::new(device, color_format, Some(Texture::DEPTH_FORMAT))?;
        let controls = Controls::default();
        let scene = Scene::load(device, controls.tessellations());
        Ok(Self {
            renderer: Renderer::new(),
            programs,
            scene,
            controls,
            time: 0,
        })
    }

    /// Advance one frame and rebuild the icosphere if the tessellation
    /// control changed.
    pub fn tick(&mut self, device: &wgpu::Device) {
        self.time = self.time.wrapping_add(1);
        if self
            .scene
            .sync_tessellations(device, self.controls.tessellations())
        {
            log::info!(
                "Icosphere now has {} tessellations",
                self.scene.loaded_tessellations()
            );
        }
    }

    /// Regenerate every drawable from the current controls.
    pub fn load_scene(&mut self, device: &wgpu::Device) {
        self.scene.reload(device, self.controls.tessellations());
    }

    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: RenderTarget<'_>,
        camera: &Camera,
    ) -> anyhow::Result<()> {
        self.renderer.clear(device, queue, target);
        let drawables = [&self.scene.icosphere];
        let passes = [
            (&self.programs.lambert, false),
            (&self.programs.passthrough, false),
            (&self.programs.gradient, true),
        ];
        for (program, rotates) in passes {
            self.renderer.render(
                device,
                queue,
                target,
                camera,
                self.time,
                self.controls.mesh_color,
                program,
                &drawables,
                rotates,
            )?;
        }
        Ok(())
    }

    /// Apply a key press. Reloads the scene for [`KeyAction::LoadScene`].
    pub fn handle_key(&mut self, device: &wgpu::Device, code: KeyCode, shift: bool) -> KeyAction {
        let action = apply_key(&mut self.controls, code, shift);
        match action {
            KeyAction::Adjusted => log::debug!(
                "tessellations: {}, colour: {:?}",
                self.controls.tessellations(),
                self.controls.mesh_color
            ),
            KeyAction::LoadScene => self.load_scene(device),
            KeyAction::Quit | KeyAction::Ignored => {}
        }
        action
    }
}

/// What a key press asks of the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The controls were changed in place.
    Adjusted,
    LoadScene,
    Quit,
    Ignored,
}

/// Map a key press onto `controls`. Shift reverses the colour channel keys.
pub fn apply_key(controls: &mut Controls, code: KeyCode, shift: bool) -> KeyAction {
    let steps = if shift { -1 } else { 1 };
    match code {
        KeyCode::ArrowUp => controls.adjust_tessellations(1),
        KeyCode::ArrowDown => controls.adjust_tessellations(-1),
        KeyCode::KeyR => controls.step_channel(Channel::Red, steps),
        KeyCode::KeyG => controls.step_channel(Channel::Green, steps),
        KeyCode::KeyB => controls.step_channel(Channel::Blue, steps),
        KeyCode::BracketRight => controls.step_alpha(1),
        KeyCode::BracketLeft => controls.step_alpha(-1),
        KeyCode::KeyL => return KeyAction::LoadScene,
        KeyCode::Escape => return KeyAction::Quit,
        _ => return KeyAction::Ignored,
    }
    KeyAction::Adjusted
}

pub struct AppState {
    pub ctx: Context,
    pub demo: Demo,
    is_surface_configured: bool,
}

impl AppState {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let demo = Demo::new(&ctx.device, ctx.config.format)?;
        Ok(Self {
            ctx,
            demo,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.ctx.controller.update(&mut self.ctx.camera);
        self.demo.tick(&self.ctx.device);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let target = RenderTarget {
            color: &view,
            depth: &self.ctx.depth_texture.view,
        };
        self.demo
            .draw(&self.ctx.device, &self.ctx.queue, target, &self.ctx.camera)?;
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    initializing: bool,
    modifiers: ModifiersState,
    frames_since_report: u32,
    last_report: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            state: None,
            initializing: false,
            modifiers: ModifiersState::empty(),
            frames_since_report: 0,
            last_report: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        report_fatal(&error);
        self.state = None;
        event_loop.exit();
    }

    fn initialized(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.initializing = false;
    }

    fn count_frame(&mut self) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed >= Duration::from_secs(5) {
            log::debug!(
                "{:.1} fps",
                self.frames_since_report as f64 / elapsed.as_secs_f64()
            );
            self.frames_since_report = 0;
            self.last_report = Instant::now();
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("sunflow");

        #[cfg(target_arch = "wasm32")]
        {
            use web_sys::HtmlCanvasElement;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok());
            if canvas.is_none() {
                log::warn!("No #{CANVAS_ID} element found, creating a new canvas");
            }
            window_attributes = window_attributes.with_canvas(canvas).with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.initializing = true;

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window)) {
                Ok(state) => self.initialized(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match AppState::new(window).await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the renderer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(state) => self.initialized(*state),
            FlowEvent::Failed(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let shift = self.modifiers.shift_key();
                if state.demo.handle_key(&state.ctx.device, code, shift) == KeyAction::Quit {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => match state.render() {
                Ok(()) => self.count_frame(),
                Err(e) => match e.downcast_ref::<wgpu::SurfaceError>() {
                    // Reconfigure the surface if it's lost or outdated
                    Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Some(wgpu::SurfaceError::OutOfMemory) => self.fail(event_loop, e),
                    Some(_) => log::warn!("Skipping frame: {e}"),
                    None => log::error!("Unable to render {e:#}"),
                },
            },
            _ => {}
        }
    }
}

/// Open the window and run the demo until it is closed.
pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

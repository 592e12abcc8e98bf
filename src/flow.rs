//! Application event loop.
//!
//! A [`GraphicsFlow`] builds a [`Scene`] once the GPU context exists, then
//! receives window events and per-frame updates. [`run`] owns the winit event
//! loop, the [`Context`] and the [`Renderer`] that draws the flow's scene.
//!
//! # Lifecycle
//!
//! 1. `resumed`: create the window and the context (async setup driven by a
//!    tokio runtime), call [`GraphicsFlow::on_init`]
//! 2. every window event goes to [`GraphicsFlow::on_window_events`]
//! 3. on resize the context and the active camera are resized
//! 4. on redraw [`GraphicsFlow::on_update`] runs, then the scene is rendered
//!    and another redraw is requested
//!
//! Render errors are logged and the frame is retried on the next redraw. A
//! lost or outdated surface is reconfigured first.

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    context::Context,
    data_structures::scene_graph::Scene,
    error::RenderError,
    render::{Renderer, RendererConfig},
};

/// A self-contained scene with its own update logic.
pub trait GraphicsFlow {
    /// Builds the scene. Called once, after the context is created.
    fn on_init(&mut self, ctx: &Context) -> anyhow::Result<Scene>;

    /// Called every frame before rendering.
    fn on_update(&mut self, _scene: &mut Scene, _dt: Duration) {}

    fn on_window_events(&mut self, _scene: &mut Scene, _event: &WindowEvent) {}

    fn renderer_config(&self) -> RendererConfig {
        RendererConfig::default()
    }

    fn title(&self) -> &str {
        "phong-ngin"
    }
}

struct AppState {
    window: Arc<Window>,
    renderer: Renderer<Context>,
    scene: Scene,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.renderer.device_mut().resize(width, height);
        if let Some(camera) = self.scene.camera_mut() {
            camera.resize(width, height);
        }
    }
}

pub struct App<F: GraphicsFlow> {
    async_runtime: tokio::runtime::Runtime,
    flow: F,
    state: Option<AppState>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl<F: GraphicsFlow> App<F> {
    fn new(flow: F) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            flow,
            state: None,
            last_time: Instant::now(),
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes().with_title(self.flow.title());
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let ctx = self.async_runtime.block_on(Context::new(window.clone()))?;
        let mut scene = self.flow.on_init(&ctx)?;
        let (width, height) = ctx.size();
        if let Some(camera) = scene.camera_mut() {
            camera.resize(width, height);
        }
        let renderer = Renderer::with_config(ctx, self.flow.renderer_config());

        Ok(AppState {
            window,
            renderer,
            scene,
        })
    }
}

impl<F: GraphicsFlow> ApplicationHandler for App<F> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => {
                log::error!("App initialization failed: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        self.flow.on_window_events(&mut state.scene, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                self.flow.on_update(&mut state.scene, dt);
                match state.renderer.render(&mut state.scene) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = state.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Opens a window and runs `flow` until the window is closed.
///
/// Logging goes through `env_logger`; filter it with `RUST_LOG`.
pub fn run<F: GraphicsFlow>(flow: F) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(flow)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

//! Windowed host: winit event loop, orbit camera, and click-to-spawn.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::camera::OrbitCamera;
use crate::config::FireworksConfig;
use crate::error::AppError;
use crate::fireworks::Fireworks;
use crate::gpu::{GpuBurst, GpuState};
use crate::sky::SkyParameters;
use crate::spawner::InputEvent;
use crate::textures::TexturePool;
use crate::time::{FrameTimer, SystemClock};
use crate::viewport::Viewport;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::{sky_panel, EguiIntegration, PanelStats};

/// Pointer travel in physical pixels above which a press becomes a drag.
const DRAG_THRESHOLD: f64 = 4.0;

/// Open a window and run until it is closed.
pub fn run(config: FireworksConfig) -> Result<(), AppError> {
    let textures = if config.textures.paths.is_empty() {
        TexturePool::procedural(
            config.textures.procedural_count,
            config.textures.procedural_size,
        )
    } else {
        TexturePool::from_files(&config.textures.paths)?
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, textures);
    event_loop.run_app(&mut app)?;
    app.finish()
}

#[derive(Debug, Default)]
struct Pointer {
    position: PhysicalPosition<f64>,
    pressed_at: Option<PhysicalPosition<f64>>,
    dragging: bool,
}

pub struct App {
    config: FireworksConfig,
    textures: TexturePool,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    fireworks: Fireworks<GpuBurst>,
    camera: OrbitCamera,
    sky: SkyParameters,
    timer: FrameTimer,
    pointer: Pointer,
    error: Option<AppError>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
}

impl App {
    pub fn new(config: FireworksConfig, textures: TexturePool) -> Self {
        Self {
            fireworks: Fireworks::from_config(&config, SystemClock::new()),
            camera: OrbitCamera::new(config.camera),
            sky: config.sky.clamped(),
            config,
            textures,
            window: None,
            gpu: None,
            timer: FrameTimer::new(),
            pointer: Pointer::default(),
            error: None,
            #[cfg(feature = "egui")]
            egui: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn finish(self) -> Result<(), AppError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = pollster::block_on(GpuState::new(window.clone(), &self.textures))?;

        let size = window.inner_size();
        self.fireworks.set_viewport(Viewport::from_physical(
            size.width,
            size.height,
            window.scale_factor(),
        ));

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(&gpu, &window));
        }

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn spawn_at_pointer(&mut self) {
        let (Some(gpu), Some(window)) = (&self.gpu, &self.window) else {
            return;
        };
        let logical = self.pointer.position.to_logical::<f32>(window.scale_factor());
        let event = InputEvent::click(logical.x, logical.y);
        if let Err(e) = self.fireworks.spawn_from_input(&mut gpu.bursts(), &event) {
            log::warn!("dropped spawn at ({:.0}, {:.0}): {e}", logical.x, logical.y);
        }
    }

    fn on_mouse_button(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.pointer.pressed_at = Some(self.pointer.position);
                self.pointer.dragging = false;
            }
            ElementState::Released => {
                let clicked = self.pointer.pressed_at.take().is_some() && !self.pointer.dragging;
                self.pointer.dragging = false;
                if clicked {
                    self.spawn_at_pointer();
                }
            }
        }
    }

    fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let last = self.pointer.position;
        self.pointer.position = position;

        let Some(pressed_at) = self.pointer.pressed_at else {
            return;
        };
        if !self.pointer.dragging {
            let dx = position.x - pressed_at.x;
            let dy = position.y - pressed_at.y;
            self.pointer.dragging = dx.hypot(dy) > DRAG_THRESHOLD;
        }
        if self.pointer.dragging {
            self.camera
                .rotate((position.x - last.x) as f32, (position.y - last.y) as f32);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) else {
            return;
        };

        self.camera.update();
        let report = self.fireworks.tick(&mut gpu.bursts());
        if !report.completed.is_empty() {
            log::trace!("{} bursts completed", report.completed.len());
        }

        if self.timer.tick() {
            window.set_title(&format!(
                "{} - {:.0} fps",
                self.config.window.title,
                self.timer.fps()
            ));
        }

        #[cfg(feature = "egui")]
        let ui_output = self.egui.as_mut().map(|egui| {
            let stats = PanelStats {
                fps: self.timer.fps(),
                active_bursts: self.fireworks.active_count(),
            };
            let sky = &mut self.sky;
            egui.run(window, |ctx| {
                sky_panel(ctx, sky, stats);
            })
        });

        gpu.update(&self.camera, &self.sky);

        match gpu.begin_frame() {
            Ok(mut frame) => {
                gpu.draw_scene(&mut frame, self.fireworks.scene());
                #[cfg(feature = "egui")]
                if let (Some(egui), Some(output)) = (self.egui.as_mut(), ui_output) {
                    egui.paint(gpu, &mut frame, output);
                }
                gpu.finish(frame);
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::error!("render error: {e:?}"),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(egui), Some(window)) = (self.egui.as_mut(), self.window.as_ref()) {
            let consumed = egui.on_window_event(window, &event);
            let pointer_event = matches!(
                event,
                WindowEvent::MouseInput { .. } | WindowEvent::MouseWheel { .. }
            );
            if consumed || (pointer_event && egui.wants_pointer()) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(gpu) = &self.gpu {
                    let cancelled = self.fireworks.cancel_all(&mut gpu.bursts());
                    log::debug!("cancelled {cancelled} bursts on close");
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                if let Some(window) = &self.window {
                    self.fireworks.set_viewport(Viewport::from_physical(
                        physical_size.width,
                        physical_size.height,
                        window.scale_factor(),
                    ));
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.on_mouse_button(state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(position),
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

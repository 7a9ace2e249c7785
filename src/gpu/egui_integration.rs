//! Debug panel for tweaking the sky at runtime.
//!
//! Only built with the `egui` feature.

use std::sync::Arc;

use winit::window::Window;

use super::{Frame, GpuState};
use crate::sky::SkyParameters;

/// Egui integration state.
///
/// Wraps egui context, winit state, and wgpu renderer.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Output from egui frame processing.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Numbers shown at the top of the panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStats {
    pub fps: f32,
    pub active_bursts: usize,
}

impl EguiIntegration {
    pub fn new(gpu: &GpuState, window: &Arc<Window>) -> Self {
        let ctx = egui::Context::default();

        let mut style = egui::Style::default();
        style.visuals = egui::Visuals::dark();
        style.visuals.window_shadow = egui::Shadow::NONE;
        style.visuals.popup_shadow = egui::Shadow::NONE;
        ctx.set_style(style);

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let renderer = egui_wgpu::Renderer::new(
            gpu.device(),
            gpu.format(),
            None,  // depth format
            1,     // msaa samples
            false, // dithering
        );

        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feed a winit event to egui.
    ///
    /// Returns true if egui consumed it; the click must not spawn a burst or
    /// move the camera then.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over a panel.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area()
    }

    /// Run one UI frame.
    pub fn run(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) -> EguiFrameOutput {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, ui);

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        EguiFrameOutput {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Paint the UI on top of the recorded scene.
    pub fn paint(&mut self, gpu: &GpuState, frame: &mut Frame, output: EguiFrameOutput) {
        let (width, height) = gpu.size();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: output.pixels_per_point,
        };

        for (id, image_delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(gpu.device(), gpu.queue(), *id, image_delta);
        }
        let callbacks = self.renderer.update_buffers(
            gpu.device(),
            gpu.queue(),
            &mut frame.encoder,
            &output.paint_jobs,
            &screen,
        );
        if !callbacks.is_empty() {
            gpu.queue().submit(callbacks);
        }

        {
            let render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer
                .render(&mut render_pass.forget_lifetime(), &output.paint_jobs, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Sky sliders. Returns true if any parameter changed.
pub fn sky_panel(ctx: &egui::Context, sky: &mut SkyParameters, stats: PanelStats) -> bool {
    let mut changed = false;
    egui::Window::new("Sky")
        .default_width(340.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!(
                "{:.0} fps, {} bursts",
                stats.fps, stats.active_bursts
            ));
            ui.separator();

            let mut slider = |ui: &mut egui::Ui,
                              value: &mut f32,
                              range: std::ops::RangeInclusive<f32>,
                              step: f64,
                              label: &str| {
                changed |= ui
                    .add(egui::Slider::new(value, range).step_by(step).text(label))
                    .changed();
            };

            slider(ui, &mut sky.turbidity, SkyParameters::TURBIDITY_RANGE, 0.1, "turbidity");
            slider(ui, &mut sky.rayleigh, SkyParameters::RAYLEIGH_RANGE, 0.001, "rayleigh");
            slider(
                ui,
                &mut sky.mie_coefficient,
                SkyParameters::MIE_COEFFICIENT_RANGE,
                0.001,
                "mie coefficient",
            );
            slider(
                ui,
                &mut sky.mie_directional_g,
                SkyParameters::MIE_DIRECTIONAL_G_RANGE,
                0.001,
                "mie directional g",
            );
            slider(ui, &mut sky.elevation, SkyParameters::ELEVATION_RANGE, 0.01, "elevation");
            slider(ui, &mut sky.azimuth, SkyParameters::AZIMUTH_RANGE, 0.1, "azimuth");
            slider(ui, &mut sky.exposure, SkyParameters::EXPOSURE_RANGE, 0.0001, "exposure");
        });
    changed
}

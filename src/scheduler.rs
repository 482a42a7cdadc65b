//! Frame scheduler.
//!
//! Drives exactly one simulation tick per display refresh and owns the
//! generation index that orients every stage's reads and writes. There is
//! no pause, no catch-up and no variable timestep: one redraw is one tick of
//! fixed logical time, whatever the wall clock did.

use std::sync::Arc;

use rand::{rngs::SmallRng, SeedableRng};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::agent;
use crate::buffers::Generation;
use crate::config::SimConfig;
use crate::error::SimulationError;
use crate::gpu::GpuState;

/// Run the simulation until the window closes.
///
/// Startup failures (no adapter, missing capability, kernel build failure)
/// are reported once and returned; the tick loop never starts.
pub fn run(config: SimConfig) -> Result<(), SimulationError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: SimConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    generation: Generation,
    startup_error: Option<SimulationError>,
}

impl App {
    fn new(config: SimConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            generation: Generation::A,
            startup_error: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("myxo")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {}", err);
                self.startup_error = Some(err.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let mut rng = SmallRng::from_entropy();
        let agents = agent::spawn(self.config.agent_count, &mut rng);

        match pollster::block_on(GpuState::new(window, &self.config, &agents)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                log::error!("failed to start simulation: {}", err);
                self.startup_error = Some(err.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu) = &mut self.gpu {
                    match gpu.tick(self.generation) {
                        Ok(()) => {
                            self.generation = self.generation.flip();
                        }
                        Err(wgpu::SurfaceError::Lost) => {
                            let size = winit::dpi::PhysicalSize {
                                width: gpu.surface_config.width,
                                height: gpu.surface_config.height,
                            };
                            gpu.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(err) => log::warn!("dropped frame: {:?}", err),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

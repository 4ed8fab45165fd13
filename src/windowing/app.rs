use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gfx::{Gfx, GfxError, GfxResult};

/// Tick interval while the output is occluded. Rendering is pointless
/// when nothing is visible, so the loop idles between acquire retries.
const REDUCED_TICK: Duration = Duration::from_millis(100);

/// Hooks a client implements to run under the windowing runtime.
pub trait ClientApp: Sized {
    fn init(&mut self, gfx: &mut Gfx) -> GfxResult<()>;

    /// Renders one frame. The frame is already open; the runtime
    /// presents it afterwards.
    fn draw(&mut self, gfx: &mut Gfx) -> GfxResult<()>;

    fn resized(&mut self, _gfx: &mut Gfx, _width: u32, _height: u32) {}

    /// Called after the GPU context was rebuilt; all previously held
    /// resource handles are stale and assets must be re-uploaded.
    fn context_restored(&mut self, _gfx: &mut Gfx) -> GfxResult<()> {
        Ok(())
    }
}

pub struct AppSettings<S: ClientApp> {
    pub window: WindowAttributes,
    pub state: S,
}

impl<S: ClientApp> AppSettings<S> {
    pub fn new(title: &str, width: u32, height: u32, state: S) -> Self {
        AppSettings {
            window: WindowAttributes::default()
                .with_title(title)
                .with_inner_size(winit::dpi::PhysicalSize::new(width, height)),
            state,
        }
    }

    pub fn run(self) -> Result<(), Box<dyn Error>> {
        let event_loop = match EventLoop::new() {
            Err(EventLoopError::NotSupported(_)) => {
                return Err("no windowing backend could be used".into());
            }
            e => e?,
        };
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            gfx: None,
            window_attributes: self.window,
            state: self.state,
        };
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

pub struct App<S: ClientApp> {
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    window_attributes: WindowAttributes,
    state: S,
}

impl<S: ClientApp> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        info!("(re)initializing graphics context");
        let window = match event_loop.create_window(self.window_attributes.clone()) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut gfx = match Gfx::new(window.clone()) {
            Ok(g) => g,
            Err(e) => {
                error!("failed to create graphics context: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.state.init(&mut gfx) {
            error!("client init failed: {e}");
            event_loop.exit();
            return;
        }

        window.request_redraw();
        self.window = Some(window);
        self.gfx = Some(gfx);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if event_loop.exiting() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window_id != window.id() {
            return;
        }
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };

        match event {
            WindowEvent::RedrawRequested => {
                match render_frame(gfx, &mut self.state) {
                    Ok(()) => {}
                    Err(GfxError::SurfaceOccluded) => {
                        // Nothing visible; idle and retry.
                        std::thread::sleep(REDUCED_TICK);
                    }
                    Err(e) => {
                        warn!("frame failed ({e}), attempting context restore");
                        let restored = gfx
                            .try_restore_context()
                            .and_then(|_| self.state.context_restored(gfx));
                        if let Err(e) = restored {
                            error!("context restore failed: {e}");
                            event_loop.exit();
                            return;
                        }
                    }
                }
                window.request_redraw();
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                gfx.resize(size.width, size.height);
                self.state.resized(gfx, size.width, size.height);
            }
            _ => {}
        }
    }
}

fn render_frame<S: ClientApp>(gfx: &mut Gfx, state: &mut S) -> GfxResult<()> {
    gfx.begin_frame()?;
    state.draw(gfx)?;
    gfx.end_frame()
}

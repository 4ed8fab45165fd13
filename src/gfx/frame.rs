//! Surface and render target management.

use crate::gfx::error::{GfxResult, SurfaceAcquireErr, SurfaceOccludedErr};
use crate::gfx::pipeline::DEPTH_FORMAT;
use log::{debug, warn};
use snafu::{ResultExt, ensure};
use wgpu::{
    Adapter, Device, PresentMode, Surface, SurfaceConfiguration, SurfaceError, SurfaceTexture,
    Texture, TextureDescriptor, TextureDimension, TextureUsages, TextureView,
    TextureViewDescriptor,
};

/// Swap chain and depth buffer for one output window.
pub struct FrameTargets {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    depth_view: Option<TextureView>,
    depth_texture: Option<Texture>,
}

impl FrameTargets {
    pub fn new(
        surface: Surface<'static>,
        adapter: &Adapter,
        device: &Device,
        width: u32,
        height: u32,
    ) -> Self {
        let caps = surface.get_capabilities(adapter);
        let format = caps.formats[0];

        let config = SurfaceConfiguration {
            // COPY_SRC so the presented image can be read back for
            // screenshots.
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
        };

        let mut targets = FrameTargets {
            surface,
            config,
            depth_view: None,
            depth_texture: None,
        };
        targets.surface.configure(device, &targets.config);
        targets.create_depth(device);
        targets
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn depth_view(&self) -> &TextureView {
        self.depth_view
            .as_ref()
            .expect("depth target missing outside of a resize")
    }

    fn create_depth(&mut self, device: &Device) {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("depth target"),
            size: wgpu::Extent3d {
                width: self.config.width,
                height: self.config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        self.depth_view = Some(texture.create_view(&TextureViewDescriptor::default()));
        self.depth_texture = Some(texture);
    }

    /// Resizes the output. Old targets are released before the swap
    /// chain grows into the new size, then recreated.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.depth_view = None;
        self.depth_texture = None;

        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(device, &self.config);

        self.create_depth(device);
        debug!("resized targets to {}x{}", self.config.width, self.config.height);
    }

    pub fn set_vsync(&mut self, device: &Device, enabled: bool) {
        let mode = if enabled {
            PresentMode::Fifo
        } else {
            PresentMode::Immediate
        };
        if self.config.present_mode == mode {
            return;
        }
        self.config.present_mode = mode;
        self.surface.configure(device, &self.config);
    }

    /// Acquires the next output image. A lost or outdated swap chain
    /// is reconfigured and retried once; a timeout means the output is
    /// not currently visible and the caller should throttle.
    pub fn acquire(&mut self, device: &Device) -> GfxResult<SurfaceTexture> {
        ensure!(self.config.width > 1 || self.config.height > 1, SurfaceOccludedErr);

        match self.surface.get_current_texture() {
            Ok(frame) if frame.suboptimal => {
                drop(frame);
                self.surface.configure(device, &self.config);
                self.surface.get_current_texture().context(SurfaceAcquireErr)
            }
            Ok(frame) => Ok(frame),
            Err(SurfaceError::Timeout) => SurfaceOccludedErr.fail(),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.surface.configure(device, &self.config);
                self.surface.get_current_texture().context(SurfaceAcquireErr)
            }
            Err(e) => Err(e).context(SurfaceAcquireErr),
        }
    }
}

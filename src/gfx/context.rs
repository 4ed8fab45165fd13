//! The immediate-mode graphics context.
//!
//! [`Gfx`] owns the device, the output targets, the pipeline state
//! multiplexer and every GPU resource. Rendering is driven through
//! small state setters plus bind/draw calls; state resolution happens
//! lazily right before each draw so redundant setter calls cost a
//! comparison and nothing else.

use std::sync::Arc;
use std::sync::mpsc;

use futures::executor::block_on;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::{debug, warn};
use nalgebra::{Matrix4, Vector2};
use snafu::{OptionExt, ResultExt};
use winit::window::Window;

use crate::gfx::error::{
    AdapterRequestErr, DeviceRequestErr, GfxResult, NoActiveFrameErr, ScreenshotErr,
    SurfaceCreationErr,
};
use crate::gfx::frame::FrameTargets;
use crate::gfx::handle::Handle;
use crate::gfx::matrix::MatrixType;
use crate::gfx::pipeline::{
    FogMode, PipelineResources, PipelineSelector, PsConstants, UNIFORM_SLOT_SIZE, UNIFORM_SLOTS,
    VsConstants, offset_is_active,
};
use crate::gfx::resources::{IbRes, Resources, TextureRes, VbRes, make_quad_indices};
use crate::gfx::vertex::{PackedCol, VertexFormat};
use crate::stream::{PngEncodeErr, Stream, StreamError, StreamWriter};

/// Indices consumed when drawing `vertices` worth of quads.
pub const fn icount(vertices: u32) -> u32 {
    vertices / 4 * 6
}

/// Default index buffer capacity, enough for the largest terrain batch.
const DEFAULT_IB_INDICES: usize = 65536 / 4 * 6;

struct ActiveFrame {
    surface_tex: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    pass: Option<wgpu::RenderPass<'static>>,
}

pub struct Gfx {
    window: Arc<Window>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    targets: FrameTargets,
    pipeline: PipelineResources,
    selector: PipelineSelector,
    pub resources: Resources,

    frame: Option<ActiveFrame>,
    clear_color: wgpu::Color,
    reduced_performance: bool,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    vs_constants: VsConstants,
    ps_constants: PsConstants,
    fog_end: f32,
    fog_density: f32,
    vs_dirty: bool,
    ps_dirty: bool,
    vs_slots: u64,
    ps_slots: u64,
    vs_offset: u32,
    ps_offset: u32,

    bound_tex: Handle<TextureRes>,
    bound_vb: Handle<VbRes>,
    bound_ib: Handle<IbRes>,
    bindings_dirty: bool,
    default_tex_group: wgpu::BindGroup,
    pub default_ib: Handle<IbRes>,
}

impl Gfx {
    /// Initializes the GPU context against `window`. This blocks on
    /// adapter and device acquisition; call it before the first frame.
    pub fn new(window: Arc<Window>) -> GfxResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context(SurfaceCreationErr)?;

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .context(AdapterRequestErr)?;
        debug!("using adapter: {:?}", adapter.get_info());

        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gfx device"),
            ..Default::default()
        }))
        .context(DeviceRequestErr)?;

        let size = window.inner_size();
        let targets = FrameTargets::new(surface, &adapter, &device, size.width, size.height);
        let pipeline = PipelineResources::new(&device, targets.color_format());
        let default_tex_group = create_default_texture(&device, &queue, &pipeline);

        let mut resources = Resources::new();
        let default_ib = resources.create_ib(&device, &make_quad_indices(DEFAULT_IB_INDICES));

        let mut gfx = Gfx {
            window,
            adapter,
            device,
            queue,
            targets,
            pipeline,
            selector: PipelineSelector::new(),
            resources,
            frame: None,
            clear_color: wgpu::Color::BLACK,
            reduced_performance: false,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            vs_constants: VsConstants::default(),
            ps_constants: PsConstants::default(),
            fog_end: 16.0,
            fog_density: 1.0,
            vs_dirty: true,
            ps_dirty: true,
            vs_slots: 0,
            ps_slots: 0,
            vs_offset: 0,
            ps_offset: 0,
            bound_tex: Handle::NONE,
            bound_vb: Handle::NONE,
            bound_ib: Handle::NONE,
            bindings_dirty: true,
            default_tex_group,
            default_ib,
        };
        gfx.bound_ib = gfx.default_ib;
        Ok(gfx)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn width(&self) -> u32 {
        self.targets.width()
    }

    pub fn height(&self) -> u32 {
        self.targets.height()
    }

    /// True after an occluded present. Hosts drop to a reduced tick
    /// rate until a frame presents normally again.
    pub fn reduced_performance(&self) -> bool {
        self.reduced_performance
    }

    // --- frame lifecycle ------------------------------------------------

    /// Opens a frame: acquires the backbuffer and starts a cleared
    /// render pass. On occlusion the frame is skipped and the context
    /// switches to reduced performance mode.
    pub fn begin_frame(&mut self) -> GfxResult<()> {
        if self.frame.is_some() {
            warn!("begin_frame with a frame already open, dropping it");
            self.frame = None;
        }

        let surface_tex = match self.targets.acquire(&self.device) {
            Ok(t) => t,
            Err(e) => {
                self.reduced_performance = true;
                return Err(e);
            }
        };
        let view = surface_tex
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.frame = Some(ActiveFrame {
            surface_tex,
            view,
            encoder,
            pass: None,
        });
        self.vs_slots = 0;
        self.ps_slots = 0;
        self.vs_dirty = true;
        self.ps_dirty = true;
        self.begin_pass(true);
        Ok(())
    }

    /// Clears the colour and depth buffers mid-frame.
    pub fn clear_buffers(&mut self) -> GfxResult<()> {
        self.frame.as_ref().context(NoActiveFrameErr)?;
        self.begin_pass(true);
        Ok(())
    }

    pub fn set_clear_color(&mut self, color: PackedCol) {
        self.clear_color = wgpu::Color {
            r: color.r() as f64 / 255.0,
            g: color.g() as f64 / 255.0,
            b: color.b() as f64 / 255.0,
            a: 1.0,
        };
    }

    /// Submits the frame and presents it.
    pub fn end_frame(&mut self) -> GfxResult<()> {
        let mut frame = self.frame.take().context(NoActiveFrameErr)?;
        frame.pass = None;
        self.queue.submit([frame.encoder.finish()]);
        frame.surface_tex.present();
        self.reduced_performance = false;
        Ok(())
    }

    /// Resizes the output targets. Old targets are released before the
    /// swap chain is regrown; never call with a frame open.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug_assert!(self.frame.is_none(), "resize during an open frame");
        self.frame = None;
        self.targets.resize(&self.device, width, height);
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.targets.set_vsync(&self.device, enabled);
    }

    /// Rebuilds the whole GPU side after device loss. Everything is
    /// recreated from scratch: pipelines, constant buffers, targets,
    /// and all arena resources; callers re-upload their assets
    /// afterwards and any handle from before the loss is stale.
    pub fn try_restore_context(&mut self) -> GfxResult<()> {
        warn!("restoring lost graphics context");
        self.frame = None;

        let (device, queue) = block_on(self.adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gfx device"),
            ..Default::default()
        }))
        .context(DeviceRequestErr)?;
        self.device = device;
        self.queue = queue;

        let size = self.window.inner_size();
        self.targets.resize(&self.device, size.width, size.height);
        self.pipeline = PipelineResources::new(&self.device, self.targets.color_format());
        self.default_tex_group = create_default_texture(&self.device, &self.queue, &self.pipeline);

        self.resources.clear();
        self.default_ib = self
            .resources
            .create_ib(&self.device, &make_quad_indices(DEFAULT_IB_INDICES));

        self.selector.invalidate();
        self.bound_tex = Handle::NONE;
        self.bound_vb = Handle::NONE;
        self.bound_ib = self.default_ib;
        self.bindings_dirty = true;
        self.vs_dirty = true;
        self.ps_dirty = true;
        Ok(())
    }

    fn begin_pass(&mut self, clear: bool) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        frame.pass = None;

        let (color_load, depth_load, stencil_load) = if clear {
            (
                wgpu::LoadOp::Clear(self.clear_color),
                wgpu::LoadOp::Clear(1.0),
                wgpu::LoadOp::Clear(0),
            )
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };

        let pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.targets.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: stencil_load,
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        frame.pass = Some(pass);
        self.selector.invalidate();
        self.bindings_dirty = true;
    }

    // --- pipeline state -------------------------------------------------

    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        self.selector.set_format(format);
    }

    pub fn set_face_culling(&mut self, enabled: bool) {
        self.selector.set_face_culling(enabled);
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.selector.set_alpha_test(enabled);
    }

    pub fn set_alpha_blending(&mut self, enabled: bool) {
        self.selector.set_alpha_blending(enabled);
    }

    pub fn set_colour_write(&mut self, enabled: bool) {
        self.selector.set_colour_write(enabled);
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.selector.set_depth_test(enabled);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.selector.set_depth_write(enabled);
    }

    pub fn set_fog(&mut self, enabled: bool) {
        self.selector.set_fog(enabled);
    }

    pub fn set_fog_mode(&mut self, mode: FogMode) {
        if self.selector.set_fog_mode(mode) {
            self.update_fog_value();
        }
    }

    pub fn set_fog_color(&mut self, color: PackedCol) {
        let rgb = [
            color.r() as f32 / 255.0,
            color.g() as f32 / 255.0,
            color.b() as f32 / 255.0,
        ];
        if self.ps_constants.fog_color != rgb {
            self.ps_constants.fog_color = rgb;
            self.ps_dirty = true;
        }
    }

    pub fn set_fog_end(&mut self, end: f32) {
        if self.fog_end != end {
            self.fog_end = end;
            self.update_fog_value();
        }
    }

    pub fn set_fog_density(&mut self, density: f32) {
        if self.fog_density != density {
            self.fog_density = density;
            self.update_fog_value();
        }
    }

    fn update_fog_value(&mut self) {
        // A single shader constant serves both distance models: the
        // end distance for linear fog, the negated density for exp.
        let value = match self.selector.fog_mode() {
            FogMode::Linear => self.fog_end,
            FogMode::Exp => -self.fog_density,
            FogMode::None => return,
        };
        if self.ps_constants.fog_value != value {
            self.ps_constants.fog_value = value;
            self.ps_dirty = true;
        }
    }

    // --- matrices and texture offset ------------------------------------

    pub fn load_matrix(&mut self, kind: MatrixType, matrix: &Matrix4<f32>) {
        match kind {
            MatrixType::View => self.view = *matrix,
            MatrixType::Projection => self.projection = *matrix,
        }
        self.vs_constants.mvp = self.projection * self.view;
        self.vs_dirty = true;
    }

    pub fn load_identity(&mut self, kind: MatrixType) {
        self.load_matrix(kind, &Matrix4::identity());
    }

    pub fn enable_texture_offset(&mut self, x: f32, y: f32) {
        self.vs_constants.tex_offset = Vector2::new(x, y);
        self.vs_dirty = true;
        self.selector.set_tex_offset(offset_is_active(x, y));
    }

    /// Switches back to the offset-free shader variant. The stale
    /// offset stays in the constant buffer; the plain variant never
    /// reads it.
    pub fn disable_texture_offset(&mut self) {
        self.selector.set_tex_offset(false);
    }

    // --- resources ------------------------------------------------------

    pub fn create_texture(&mut self, image: &image::RgbaImage, mipmaps: bool) -> Handle<TextureRes> {
        self.resources
            .create_texture(&self.device, &self.queue, &self.pipeline, image, mipmaps)
    }

    pub fn update_texture(
        &mut self,
        handle: Handle<TextureRes>,
        x: u32,
        y: u32,
        part: &image::RgbaImage,
    ) {
        self.resources.update_texture(&self.queue, handle, x, y, part);
    }

    pub fn delete_texture(&mut self, handle: Handle<TextureRes>) {
        if self.bound_tex == handle {
            self.bound_tex = Handle::NONE;
            self.bindings_dirty = true;
        }
        self.resources.delete_texture(handle);
    }

    pub fn create_vb(&mut self, format: VertexFormat, count: u32) -> Handle<VbRes> {
        self.resources.create_vb(format, count)
    }

    pub fn create_dynamic_vb(&mut self, format: VertexFormat, max_vertices: u32) -> Handle<VbRes> {
        self.resources.create_dynamic_vb(&self.device, format, max_vertices)
    }

    pub fn lock_vb(&mut self, handle: Handle<VbRes>, count: u32) -> Option<&mut [u8]> {
        self.resources.lock_vb(handle, count)
    }

    /// Commits staged vertex data. Unlocking a dynamic buffer also
    /// binds it, matching the usual fill-then-draw sequence.
    pub fn unlock_vb(&mut self, handle: Handle<VbRes>) {
        self.resources.unlock_vb(&self.device, &self.queue, handle);
        let dynamic = self
            .resources
            .vbs
            .get(handle)
            .is_some_and(|vb| vb.dynamic);
        if dynamic {
            self.bind_vb(handle);
        }
    }

    pub fn set_dynamic_vb_data(&mut self, handle: Handle<VbRes>, data: &[u8]) {
        self.resources.set_dynamic_vb_data(&self.queue, handle, data);
        self.bind_vb(handle);
    }

    pub fn delete_vb(&mut self, handle: Handle<VbRes>) {
        if self.bound_vb == handle {
            self.bound_vb = Handle::NONE;
            self.bindings_dirty = true;
        }
        self.resources.delete_vb(handle);
    }

    pub fn create_ib(&mut self, indices: &[u16]) -> Handle<IbRes> {
        self.resources.create_ib(&self.device, indices)
    }

    pub fn delete_ib(&mut self, handle: Handle<IbRes>) {
        if self.bound_ib == handle {
            self.bound_ib = self.default_ib;
            self.bindings_dirty = true;
        }
        self.resources.delete_ib(handle);
    }

    // --- resource binding -----------------------------------------------

    pub fn bind_texture(&mut self, handle: Handle<TextureRes>) {
        if self.bound_tex != handle {
            self.bound_tex = handle;
            self.bindings_dirty = true;
        }
    }

    pub fn bind_vb(&mut self, handle: Handle<VbRes>) {
        if self.bound_vb != handle {
            self.bound_vb = handle;
            self.bindings_dirty = true;
        }
    }

    pub fn bind_ib(&mut self, handle: Handle<IbRes>) {
        if self.bound_ib != handle {
            self.bound_ib = handle;
            self.bindings_dirty = true;
        }
    }

    // --- drawing --------------------------------------------------------

    /// Draws `vertices` quad vertices as indexed triangles through the
    /// bound index buffer.
    pub fn draw_vb_indexed_tris(&mut self, vertices: u32) -> GfxResult<()> {
        self.draw_vb_indexed_tris_range(vertices, 0)
    }

    /// Same as [`Gfx::draw_vb_indexed_tris`] but offset by
    /// `start_vertex` into the bound vertex buffer.
    pub fn draw_vb_indexed_tris_range(&mut self, vertices: u32, start_vertex: u32) -> GfxResult<()> {
        self.prepare_draw()?;
        let frame = self.frame.as_mut().context(NoActiveFrameErr)?;
        if let Some(pass) = frame.pass.as_mut() {
            pass.draw_indexed(0..icount(vertices), start_vertex as i32, 0..1);
        }
        Ok(())
    }

    /// Draws `vertices` as a line list, restoring triangle topology
    /// afterwards.
    pub fn draw_vb_lines(&mut self, vertices: u32) -> GfxResult<()> {
        self.selector.set_line_topology(true);
        let result = self.draw_lines_inner(vertices);
        self.selector.set_line_topology(false);
        result
    }

    fn draw_lines_inner(&mut self, vertices: u32) -> GfxResult<()> {
        self.prepare_draw()?;
        let frame = self.frame.as_mut().context(NoActiveFrameErr)?;
        if let Some(pass) = frame.pass.as_mut() {
            pass.draw(0..vertices, 0..1);
        }
        Ok(())
    }

    /// Resolves all pending state onto the active pass.
    fn prepare_draw(&mut self) -> GfxResult<()> {
        let frame = self.frame.as_mut().context(NoActiveFrameErr)?;
        let Some(pass) = frame.pass.as_mut() else {
            return NoActiveFrameErr.fail();
        };

        let (key, rebind) = self.selector.select();
        if rebind {
            pass.set_pipeline(self.pipeline.pipeline(&self.device, key));
        }

        let mut group_dirty = rebind;
        if self.vs_dirty {
            self.vs_offset = push_slot(
                &self.queue,
                &self.pipeline.vs_buffer,
                &mut self.vs_slots,
                bytemuck::bytes_of(&self.vs_constants),
            );
            self.vs_dirty = false;
            group_dirty = true;
        }
        if self.ps_dirty {
            self.ps_offset = push_slot(
                &self.queue,
                &self.pipeline.ps_buffer,
                &mut self.ps_slots,
                bytemuck::bytes_of(&self.ps_constants),
            );
            self.ps_dirty = false;
            group_dirty = true;
        }
        if group_dirty || self.bindings_dirty {
            pass.set_bind_group(
                0,
                &self.pipeline.uniform_group,
                &[self.vs_offset, self.ps_offset],
            );
        }

        if self.bindings_dirty {
            match self.resources.textures.get(self.bound_tex) {
                Some(tex) => {
                    pass.set_bind_group(1, &tex.group, &[]);
                    pass.set_bind_group(2, &self.pipeline.sampler_groups[tex.mipmaps as usize], &[]);
                }
                None => {
                    pass.set_bind_group(1, &self.default_tex_group, &[]);
                    pass.set_bind_group(2, &self.pipeline.sampler_groups[0], &[]);
                }
            }
            if let Some(vb) = self.resources.vbs.get(self.bound_vb) {
                if let Some(buffer) = &vb.buffer {
                    pass.set_vertex_buffer(0, buffer.slice(..));
                }
            }
            if let Some(ib) = self.resources.ibs.get(self.bound_ib) {
                pass.set_index_buffer(ib.buffer.slice(..), wgpu::IndexFormat::Uint16);
            }
            self.bindings_dirty = false;
        }
        Ok(())
    }

    // --- screenshot -----------------------------------------------------

    /// Encodes the frame rendered so far as a PNG into `stream`.
    ///
    /// The pass is flushed and the work submitted early; drawing may
    /// continue afterwards on a fresh pass over the same backbuffer.
    pub fn take_screenshot(&mut self, stream: &mut dyn Stream) -> GfxResult<()> {
        let width = self.targets.width();
        let height = self.targets.height();
        let bytes_per_row = (4 * width).div_ceil(256) * 256;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("screenshot readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        {
            let frame = self.frame.as_mut().context(NoActiveFrameErr)?;
            frame.pass = None;
            frame.encoder.copy_texture_to_buffer(
                frame.surface_tex.texture.as_image_copy(),
                wgpu::TexelCopyBufferInfo {
                    buffer: &readback,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bytes_per_row),
                        rows_per_image: Some(height),
                    },
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );

            let encoder = std::mem::replace(
                &mut frame.encoder,
                self.device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("frame encoder"),
                    }),
            );
            self.queue.submit([encoder.finish()]);
        }
        // Drawing continues over the already rendered contents.
        self.begin_pass(false);

        let pixels = self
            .map_readback(&readback, width, height, bytes_per_row)
            .context(ScreenshotErr)?;

        let writer = StreamWriter(stream);
        PngEncoder::new(writer)
            .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
            .context(PngEncodeErr)
            .context(ScreenshotErr)?;
        Ok(())
    }

    fn map_readback(
        &self,
        readback: &wgpu::Buffer,
        width: u32,
        height: u32,
        bytes_per_row: u32,
    ) -> Result<Vec<u8>, StreamError> {
        let slice = readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::Wait);

        let mapped = matches!(rx.recv(), Ok(Ok(())));
        if !mapped {
            return Err(StreamError::Io {
                source: std::io::Error::other("failed to map screenshot buffer"),
            });
        }

        let swizzle = matches!(
            self.targets.color_format(),
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        );

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            let row_data = &data[start..start + width as usize * 4];
            if swizzle {
                for px in row_data.chunks_exact(4) {
                    pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            } else {
                pixels.extend_from_slice(row_data);
            }
        }
        drop(data);
        readback.unmap();
        Ok(pixels)
    }
}

fn push_slot(queue: &wgpu::Queue, buffer: &wgpu::Buffer, slots: &mut u64, bytes: &[u8]) -> u32 {
    if *slots >= UNIFORM_SLOTS {
        warn!("uniform slot ring exhausted, reusing last slot");
        *slots = UNIFORM_SLOTS - 1;
    }
    let offset = *slots * UNIFORM_SLOT_SIZE;
    queue.write_buffer(buffer, offset, bytes);
    *slots += 1;
    offset as u32
}

fn create_default_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &PipelineResources,
) -> wgpu::BindGroup {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("default texture"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        &[255u8; 4],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    pipeline.texture_group(device, &view)
}

#[cfg(test)]
mod tests {
    use super::icount;

    #[test]
    fn quad_vertices_to_index_count() {
        assert_eq!(icount(0), 0);
        assert_eq!(icount(4), 6);
        assert_eq!(icount(64), 96);
        // Partial quads round down to whole ones.
        assert_eq!(icount(6), 6);
    }
}

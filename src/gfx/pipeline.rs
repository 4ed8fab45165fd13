//! Pipeline state multiplexer.
//!
//! The engine sets rendering state through small guarded setters;
//! this module resolves the current flag tuple into one native
//! pipeline configuration. Shader variant *selection* is a pure index
//! computation (see [`vs_index`]/[`ps_index`]); the wgpu pipeline
//! objects completing a selection are kept in a dense table indexed by
//! the packed state word and created at most once per distinct key,
//! never repeatedly at draw time.

use crate::gfx::vertex::{VertexFormat, vertex_layout};
use nalgebra::{Matrix4, Vector2};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendComponent,
    BlendFactor, BlendOperation, BlendState, Buffer, BufferBinding, BufferBindingType, BufferSize,
    BufferUsages,
    ColorTargetState, ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, Device,
    Face, FilterMode, FragmentState, FrontFace, PipelineCompilationOptions, PipelineLayout,
    PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology, RenderPipeline,
    RenderPipelineDescriptor, Sampler, SamplerBindingType, SamplerDescriptor, ShaderModule,
    ShaderStages, StencilState, TextureFormat, TextureSampleType, TextureView,
    TextureViewDimension, VertexState,
};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;
pub const DEPTH_BITS: u32 = 24;

/// Constant pushes are suballocated from a per-frame ring of uniform
/// slots, bound through dynamic offsets. 256 covers the required
/// offset alignment on every backend.
pub const UNIFORM_SLOT_SIZE: u64 = 256;
pub const UNIFORM_SLOTS: u64 = 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FogMode {
    None,
    Linear,
    Exp,
}

const VS_ENTRY_POINTS: [&str; 3] = ["vs_coloured", "vs_textured", "vs_textured_offset"];

const FS_ENTRY_POINTS: [&str; 12] = [
    "fs_coloured",
    "fs_textured",
    "fs_coloured_test",
    "fs_textured_test",
    "fs_coloured_linear",
    "fs_textured_linear",
    "fs_coloured_test_linear",
    "fs_textured_test_linear",
    "fs_coloured_density",
    "fs_textured_density",
    "fs_coloured_test_density",
    "fs_textured_test_density",
];

/// Whether an offset pair actually shifts texture coordinates. A zero
/// pair keeps the plain textured variant selected.
pub fn offset_is_active(x: f32, y: f32) -> bool {
    x != 0.0 || y != 0.0
}

/// Vertex shader variant for the current format. A nonzero texture
/// offset selects a distinct variant so the common path pays no
/// per-draw uniform branch.
pub fn vs_index(format: VertexFormat, has_offset: bool) -> usize {
    match format {
        VertexFormat::Coloured => 0,
        VertexFormat::Textured if has_offset => 2,
        VertexFormat::Textured => 1,
    }
}

/// Pixel shader variant index into the 12-entry table.
pub fn ps_index(format: VertexFormat, alpha_test: bool, fog_enabled: bool, fog_mode: FogMode) -> usize {
    let mut idx = if format == VertexFormat::Coloured { 0 } else { 1 };
    if alpha_test {
        idx += 2;
    }
    if fog_enabled {
        if fog_mode == FogMode::Linear {
            idx += 4;
        }
        if fog_mode == FogMode::Exp {
            idx += 8;
        }
    }
    idx
}

/// Packed pipeline state word. Also the index into the dense pipeline
/// table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipelineKey(pub u16);

pub const PIPELINE_KEY_SPACE: usize = 1 << 12;

impl PipelineKey {
    fn vs(self) -> usize {
        (self.0 & 0x3) as usize
    }
    fn ps(self) -> usize {
        ((self.0 >> 2) & 0xF) as usize
    }
    fn raster(self) -> usize {
        ((self.0 >> 6) & 0x1) as usize
    }
    fn depth(self) -> usize {
        ((self.0 >> 7) & 0x3) as usize
    }
    fn blend(self) -> usize {
        ((self.0 >> 9) & 0x3) as usize
    }
    fn line_topology(self) -> bool {
        (self.0 >> 11) & 0x1 != 0
    }
}

/// CPU-side state cache. Every setter is guarded: handing it the value
/// it already holds is a no-op, so steady-state per-frame cost for
/// unchanged state is an integer comparison.
pub struct PipelineSelector {
    format: VertexFormat,
    alpha_test: bool,
    fog_enabled: bool,
    fog_mode: FogMode,
    tex_offset: bool,
    culling: bool,
    depth_test: bool,
    depth_write: bool,
    colour_write: bool,
    alpha_blend: bool,
    line_topology: bool,

    bound: Option<PipelineKey>,
    rebinds: u64,
}

impl PipelineSelector {
    pub fn new() -> Self {
        PipelineSelector {
            format: VertexFormat::Coloured,
            alpha_test: false,
            fog_enabled: false,
            fog_mode: FogMode::None,
            tex_offset: false,
            culling: false,
            depth_test: false,
            depth_write: false,
            colour_write: true,
            alpha_blend: false,
            line_topology: false,
            bound: None,
            rebinds: 0,
        }
    }

    pub fn format(&self) -> VertexFormat {
        self.format
    }

    pub fn fog_mode(&self) -> FogMode {
        self.fog_mode
    }

    pub fn fog_enabled(&self) -> bool {
        self.fog_enabled
    }

    pub fn set_format(&mut self, format: VertexFormat) -> bool {
        if self.format == format {
            return false;
        }
        self.format = format;
        true
    }

    pub fn set_alpha_test(&mut self, enabled: bool) -> bool {
        if self.alpha_test == enabled {
            return false;
        }
        self.alpha_test = enabled;
        true
    }

    pub fn set_fog(&mut self, enabled: bool) -> bool {
        if self.fog_enabled == enabled {
            return false;
        }
        self.fog_enabled = enabled;
        true
    }

    pub fn set_fog_mode(&mut self, mode: FogMode) -> bool {
        if self.fog_mode == mode {
            return false;
        }
        self.fog_mode = mode;
        true
    }

    pub fn set_tex_offset(&mut self, active: bool) -> bool {
        if self.tex_offset == active {
            return false;
        }
        self.tex_offset = active;
        true
    }

    pub fn set_face_culling(&mut self, enabled: bool) -> bool {
        if self.culling == enabled {
            return false;
        }
        self.culling = enabled;
        true
    }

    pub fn set_depth_test(&mut self, enabled: bool) -> bool {
        if self.depth_test == enabled {
            return false;
        }
        self.depth_test = enabled;
        true
    }

    pub fn set_depth_write(&mut self, enabled: bool) -> bool {
        if self.depth_write == enabled {
            return false;
        }
        self.depth_write = enabled;
        true
    }

    pub fn set_colour_write(&mut self, enabled: bool) -> bool {
        if self.colour_write == enabled {
            return false;
        }
        self.colour_write = enabled;
        true
    }

    pub fn set_alpha_blending(&mut self, enabled: bool) -> bool {
        if self.alpha_blend == enabled {
            return false;
        }
        self.alpha_blend = enabled;
        true
    }

    pub fn set_line_topology(&mut self, enabled: bool) -> bool {
        if self.line_topology == enabled {
            return false;
        }
        self.line_topology = enabled;
        true
    }

    pub fn key(&self) -> PipelineKey {
        let vs = vs_index(self.format, self.tex_offset) as u16;
        let ps = ps_index(self.format, self.alpha_test, self.fog_enabled, self.fog_mode) as u16;
        let raster = self.culling as u16;
        let depth = self.depth_test as u16 | (self.depth_write as u16) << 1;
        let blend = self.colour_write as u16 | (self.alpha_blend as u16) << 1;
        let topology = self.line_topology as u16;

        PipelineKey(vs | ps << 2 | raster << 6 | depth << 7 | blend << 9 | topology << 11)
    }

    /// Resolves the current state, reporting whether the native
    /// pipeline must be re-bound. Only an actual key change counts.
    pub fn select(&mut self) -> (PipelineKey, bool) {
        let key = self.key();
        if self.bound == Some(key) {
            return (key, false);
        }
        self.bound = Some(key);
        self.rebinds += 1;
        (key, true)
    }

    /// Forces the next `select` to rebind. Used after state recreation
    /// and at the start of every render pass.
    pub fn invalidate(&mut self) {
        self.bound = None;
    }

    pub fn rebinds(&self) -> u64 {
        self.rebinds
    }
}

impl Default for PipelineSelector {
    fn default() -> Self {
        PipelineSelector::new()
    }
}

/// Vertex stage constants, pushed whenever a matrix or the texture
/// offset changes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VsConstants {
    pub mvp: Matrix4<f32>,
    pub tex_offset: Vector2<f32>,
    pub _pad: [f32; 2],
}

impl Default for VsConstants {
    fn default() -> Self {
        VsConstants {
            mvp: Matrix4::identity(),
            tex_offset: Vector2::new(0.0, 0.0),
            _pad: [0.0; 2],
        }
    }
}

/// Fragment stage constants. `fog_value` holds the linear fog end
/// distance, or the negated density for exp fog.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PsConstants {
    pub fog_value: f32,
    pub _pad0: [f32; 3],
    pub fog_color: [f32; 3],
    pub _pad1: f32,
}

/// GPU-side pipeline state: shader module, fixed-state tables,
/// samplers, constant buffers, and the dense pipeline table.
///
/// Context restoration replaces this wholesale; partial recreation is
/// not permitted, so no stale native handle can survive a restore.
pub struct PipelineResources {
    shader: ShaderModule,
    layout: PipelineLayout,
    color_format: TextureFormat,
    blend_states: [(Option<BlendState>, ColorWrites); 4],
    pipelines: Vec<Option<RenderPipeline>>,

    pub bgl_texture: BindGroupLayout,
    pub samplers: [Sampler; 2],
    pub sampler_groups: [BindGroup; 2],
    pub vs_buffer: Buffer,
    pub ps_buffer: Buffer,
    pub uniform_group: BindGroup,
}

impl PipelineResources {
    pub fn new(device: &Device, color_format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gfx shaders"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let bgl_uniforms = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("gfx uniforms"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bgl_texture = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("gfx texture"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let bgl_sampler = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("gfx sampler"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("gfx pipeline layout"),
            bind_group_layouts: &[&bgl_uniforms, &bgl_texture, &bgl_sampler],
            push_constant_ranges: &[],
        });

        // Sampler 0 is pure point sampling, sampler 1 adds linear
        // filtering between mip levels.
        let samplers = [
            Self::create_sampler(device, FilterMode::Nearest),
            Self::create_sampler(device, FilterMode::Linear),
        ];
        let sampler_groups = [
            Self::sampler_group(device, &bgl_sampler, &samplers[0]),
            Self::sampler_group(device, &bgl_sampler, &samplers[1]),
        ];

        let vs_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vs constants"),
            size: UNIFORM_SLOT_SIZE * UNIFORM_SLOTS,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ps_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ps constants"),
            size: UNIFORM_SLOT_SIZE * UNIFORM_SLOTS,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("gfx uniforms"),
            layout: &bgl_uniforms,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::Buffer(BufferBinding {
                        buffer: &vs_buffer,
                        offset: 0,
                        size: BufferSize::new(size_of::<VsConstants>() as u64),
                    }),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Buffer(BufferBinding {
                        buffer: &ps_buffer,
                        offset: 0,
                        size: BufferSize::new(size_of::<PsConstants>() as u64),
                    }),
                },
            ],
        });

        let blend = BlendState {
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
        };
        // Index bit 0: colour writes enabled, bit 1: alpha blending.
        let blend_states = [
            (None, ColorWrites::empty()),
            (None, ColorWrites::ALL),
            (Some(blend), ColorWrites::empty()),
            (Some(blend), ColorWrites::ALL),
        ];

        let mut pipelines = Vec::with_capacity(PIPELINE_KEY_SPACE);
        pipelines.resize_with(PIPELINE_KEY_SPACE, || None);

        PipelineResources {
            shader,
            layout,
            color_format,
            blend_states,
            pipelines,
            bgl_texture,
            samplers,
            sampler_groups,
            vs_buffer,
            ps_buffer,
            uniform_group,
        }
    }

    fn create_sampler(device: &Device, mipmap_filter: FilterMode) -> Sampler {
        device.create_sampler(&SamplerDescriptor {
            label: None,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter,
            ..Default::default()
        })
    }

    fn sampler_group(device: &Device, layout: &BindGroupLayout, sampler: &Sampler) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("gfx sampler"),
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Sampler(sampler),
            }],
        })
    }

    pub fn texture_group(&self, device: &Device, view: &TextureView) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("gfx texture"),
            layout: &self.bgl_texture,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(view),
            }],
        })
    }

    /// Fetches the pipeline for `key`, completing it from the fixed
    /// state tables on first use.
    pub fn pipeline(&mut self, device: &Device, key: PipelineKey) -> &RenderPipeline {
        let idx = key.0 as usize;
        if self.pipelines[idx].is_none() {
            self.pipelines[idx] = Some(self.create_pipeline(device, key));
        }
        self.pipelines[idx].as_ref().unwrap()
    }

    fn create_pipeline(&self, device: &Device, key: PipelineKey) -> RenderPipeline {
        let vertex_format = if key.vs() == 0 {
            VertexFormat::Coloured
        } else {
            VertexFormat::Textured
        };
        let (blend, write_mask) = self.blend_states[key.blend()];
        let depth_idx = key.depth();

        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("gfx pipeline"),
            layout: Some(&self.layout),
            vertex: VertexState {
                module: &self.shader,
                entry_point: Some(VS_ENTRY_POINTS[key.vs()]),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[vertex_layout(vertex_format)],
            },
            primitive: PrimitiveState {
                topology: if key.line_topology() {
                    PrimitiveTopology::LineList
                } else {
                    PrimitiveTopology::TriangleList
                },
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: if key.raster() != 0 {
                    Some(Face::Back)
                } else {
                    None
                },
                unclipped_depth: false,
                polygon_mode: PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_idx & 2 != 0,
                depth_compare: if depth_idx & 1 != 0 {
                    CompareFunction::LessEqual
                } else {
                    CompareFunction::Always
                },
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &self.shader,
                entry_point: Some(FS_ENTRY_POINTS[key.ps()]),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: self.color_format,
                    blend,
                    write_mask,
                })],
            }),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_fog_modes() -> [(bool, FogMode); 5] {
        [
            (false, FogMode::None),
            (false, FogMode::Linear),
            (true, FogMode::None),
            (true, FogMode::Linear),
            (true, FogMode::Exp),
        ]
    }

    #[test]
    fn ps_index_is_injective_over_the_variant_table() {
        let mut seen = [false; 12];
        for format in [VertexFormat::Coloured, VertexFormat::Textured] {
            for alpha_test in [false, true] {
                for fog_mode in [FogMode::Linear, FogMode::Exp, FogMode::None] {
                    let idx = ps_index(format, alpha_test, fog_mode != FogMode::None, fog_mode);
                    assert!(idx < 12);
                    assert!(!seen[idx], "variant index {idx} selected twice");
                    seen[idx] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn ps_index_formula() {
        assert_eq!(ps_index(VertexFormat::Coloured, false, false, FogMode::None), 0);
        assert_eq!(ps_index(VertexFormat::Textured, false, false, FogMode::None), 1);
        assert_eq!(ps_index(VertexFormat::Textured, true, false, FogMode::None), 3);
        assert_eq!(ps_index(VertexFormat::Coloured, false, true, FogMode::Linear), 4);
        assert_eq!(ps_index(VertexFormat::Textured, true, true, FogMode::Linear), 7);
        assert_eq!(ps_index(VertexFormat::Coloured, false, true, FogMode::Exp), 8);
        assert_eq!(ps_index(VertexFormat::Textured, true, true, FogMode::Exp), 11);
        // Fog disabled ignores the mode entirely.
        assert_eq!(ps_index(VertexFormat::Coloured, false, false, FogMode::Exp), 0);
    }

    #[test]
    fn vs_index_formula() {
        assert_eq!(vs_index(VertexFormat::Coloured, false), 0);
        assert_eq!(vs_index(VertexFormat::Coloured, true), 0);
        assert_eq!(vs_index(VertexFormat::Textured, false), 1);
        assert_eq!(vs_index(VertexFormat::Textured, true), 2);
    }

    #[test]
    fn zero_offset_keeps_the_plain_textured_variant() {
        assert!(!offset_is_active(0.0, 0.0));
        assert!(offset_is_active(0.5, 0.0));
        assert!(offset_is_active(0.0, -0.25));
        assert_eq!(
            vs_index(VertexFormat::Textured, offset_is_active(0.0, 0.0)),
            1
        );
        assert_eq!(
            vs_index(VertexFormat::Textured, offset_is_active(0.125, 0.0)),
            2
        );
    }

    #[test]
    fn selection_is_stable_under_repeated_identical_state() {
        let mut s = PipelineSelector::new();
        let (first, changed) = s.select();
        assert!(changed);

        for _ in 0..100 {
            let (key, changed) = s.select();
            assert_eq!(key, first);
            assert!(!changed, "rebind without a state change");
        }
        assert_eq!(s.rebinds(), 1);
    }

    #[test]
    fn rebind_only_on_actual_change() {
        let mut s = PipelineSelector::new();
        s.select();

        // Same value: guarded, no rebind.
        assert!(!s.set_alpha_test(false));
        assert_eq!(s.select().1, false);

        assert!(s.set_alpha_test(true));
        assert_eq!(s.select().1, true);
        assert_eq!(s.rebinds(), 2);

        // Fog values change the key only when fog is enabled.
        assert!(s.set_fog_mode(FogMode::Linear));
        assert_eq!(s.select().1, false);
        assert!(s.set_fog(true));
        assert_eq!(s.select().1, true);
    }

    #[test]
    fn keys_are_unique_per_state_tuple() {
        let mut keys = std::collections::HashSet::new();
        let mut count = 0usize;

        for format in [VertexFormat::Coloured, VertexFormat::Textured] {
            for (fog_enabled, fog_mode) in all_fog_modes() {
                for alpha_test in [false, true] {
                    for tex_offset in [false, true] {
                        for culling in [false, true] {
                            let mut s = PipelineSelector::new();
                            s.set_format(format);
                            s.set_fog(fog_enabled);
                            s.set_fog_mode(fog_mode);
                            s.set_alpha_test(alpha_test);
                            s.set_tex_offset(tex_offset);
                            s.set_face_culling(culling);
                            keys.insert(s.key().0);
                            count += 1;
                        }
                    }
                }
            }
        }

        assert_eq!(count, 80);
        // Coloured ignores the offset bit and the three fog tuples
        // without a distance model all fold together, so of the 80
        // combinations exactly 36 distinct keys remain:
        //   coloured: 1 vs * 6 ps * 2 cull = 12
        //   textured: 2 vs * 6 ps * 2 cull = 24
        assert_eq!(keys.len(), 36);
    }

    #[test]
    fn key_roundtrip_decodes_fields() {
        let mut s = PipelineSelector::new();
        s.set_format(VertexFormat::Textured);
        s.set_tex_offset(true);
        s.set_alpha_test(true);
        s.set_fog(true);
        s.set_fog_mode(FogMode::Exp);
        s.set_face_culling(true);
        s.set_depth_test(true);
        s.set_depth_write(true);
        s.set_alpha_blending(true);
        s.set_line_topology(true);

        let key = s.key();
        assert_eq!(key.vs(), 2);
        assert_eq!(key.ps(), 11);
        assert_eq!(key.raster(), 1);
        assert_eq!(key.depth(), 3);
        assert_eq!(key.blend(), 3);
        assert!(key.line_topology());
        assert!((key.0 as usize) < PIPELINE_KEY_SPACE);
    }
}

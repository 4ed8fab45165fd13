//! GPU resource management: textures, vertex buffers, index buffers.
//!
//! All resources are owned by generation-checked arenas, so callers
//! hold plain [`Handle`]s and a stale or doubly deleted handle is a
//! harmless no-op rather than a use-after-free.

use crate::gfx::handle::{Arena, Handle};
use crate::gfx::mipmaps::{calc_mipmaps_levels, downsample, next_mip_size};
use crate::gfx::pipeline::PipelineResources;
use crate::gfx::vertex::VertexFormat;
use image::RgbaImage;
use log::warn;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroup, Buffer, BufferUsages, Device, Extent3d, Origin3d, Queue, TexelCopyBufferLayout,
    TexelCopyTextureInfo, Texture, TextureAspect, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureViewDescriptor,
};

pub type TextureId = Handle<TextureRes>;
pub type VertexBufferId = Handle<VbRes>;
pub type IndexBufferId = Handle<IbRes>;

pub struct TextureRes {
    texture: Texture,
    pub group: BindGroup,
    pub width: u32,
    pub height: u32,
    pub mipmaps: bool,
}

pub struct VbRes {
    pub buffer: Option<Buffer>,
    pub format: VertexFormat,
    pub max_vertices: u32,
    pub dynamic: bool,
    staging: Option<Vec<u8>>,
}

pub struct IbRes {
    pub buffer: Buffer,
}

/// Expands `count` indices worth of the standard quad pattern
/// (0,1,2, 2,3,0 per four vertices).
pub fn make_quad_indices(count: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(count);
    let mut base = 0u16;
    while indices.len() < count {
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        base = base.wrapping_add(4);
    }
    indices.truncate(count);
    indices
}

#[derive(Default)]
pub struct Resources {
    pub textures: Arena<TextureRes>,
    pub vbs: Arena<VbRes>,
    pub ibs: Arena<IbRes>,
}

impl Resources {
    pub fn new() -> Self {
        Resources::default()
    }

    /// Drops every GPU resource but keeps the arenas alive, so handles
    /// held by callers go stale instead of dangling.
    pub fn clear(&mut self) {
        self.textures.clear();
        self.vbs.clear();
        self.ibs.clear();
    }

    // --- textures -------------------------------------------------------

    /// Uploads `image` as a new 2D texture. With `mipmaps`, the full
    /// chain is box-downsampled on the CPU and uploaded level by
    /// level; non power-of-two images fall back to a single level.
    pub fn create_texture(
        &mut self,
        device: &Device,
        queue: &Queue,
        pipeline: &PipelineResources,
        image: &RgbaImage,
        mipmaps: bool,
    ) -> Handle<TextureRes> {
        let (width, height) = image.dimensions();
        let pot = width.is_power_of_two() && height.is_power_of_two();
        if mipmaps && !pot {
            warn!("ignoring mipmaps for non power-of-two texture {width}x{height}");
        }
        let mipmaps = mipmaps && pot;

        let levels = if mipmaps {
            1 + calc_mipmaps_levels(width, height)
        } else {
            1
        };

        let texture = device.create_texture(&TextureDescriptor {
            label: Some("texture"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        upload_level(queue, &texture, 0, 0, 0, image);
        if mipmaps {
            let mut level_image = image.clone();
            for level in 1..levels {
                level_image = downsample(&level_image);
                upload_level(queue, &texture, level, 0, 0, &level_image);
            }
        }

        let view = texture.create_view(&TextureViewDescriptor::default());
        let group = pipeline.texture_group(device, &view);

        self.textures.insert(TextureRes {
            texture,
            group,
            width,
            height,
            mipmaps,
        })
    }

    /// Overwrites the region at (`x`, `y`) with `part`. Mipmapped
    /// textures get the matching region of each level refreshed from
    /// a downsampled copy of the part.
    pub fn update_texture(
        &mut self,
        queue: &Queue,
        handle: Handle<TextureRes>,
        x: u32,
        y: u32,
        part: &RgbaImage,
    ) {
        let Some(tex) = self.textures.get(handle) else {
            return;
        };

        upload_level(queue, &tex.texture, 0, x, y, part);
        if !tex.mipmaps {
            return;
        }

        let levels = tex.texture.mip_level_count();
        let mut level_part = part.clone();
        for (level, x, y) in affected_mip_regions(levels, x, y, part.width(), part.height()) {
            level_part = downsample(&level_part);
            upload_level(queue, &tex.texture, level, x, y, &level_part);
        }
    }

    pub fn delete_texture(&mut self, handle: Handle<TextureRes>) {
        self.textures.remove(handle);
    }

    // --- vertex buffers -------------------------------------------------

    /// Declares a static vertex buffer. The GPU buffer itself is only
    /// created once the staging contents are committed by
    /// [`Resources::unlock_vb`].
    pub fn create_vb(&mut self, format: VertexFormat, count: u32) -> Handle<VbRes> {
        self.vbs.insert(VbRes {
            buffer: None,
            format,
            max_vertices: count,
            dynamic: false,
            staging: None,
        })
    }

    /// Creates a dynamic vertex buffer with space for `max_vertices`.
    pub fn create_dynamic_vb(
        &mut self,
        device: &Device,
        format: VertexFormat,
        max_vertices: u32,
    ) -> Handle<VbRes> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dynamic vertex buffer"),
            size: max_vertices as u64 * format.stride() as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.vbs.insert(VbRes {
            buffer: Some(buffer),
            format,
            max_vertices,
            dynamic: true,
            staging: None,
        })
    }

    /// Opens a write-only staging window over the buffer. The previous
    /// contents are discarded, never read back.
    pub fn lock_vb(&mut self, handle: Handle<VbRes>, count: u32) -> Option<&mut [u8]> {
        let vb = self.vbs.get_mut(handle)?;
        let count = count.min(vb.max_vertices);
        let bytes = count as usize * vb.format.stride();
        vb.staging = Some(vec![0u8; bytes]);
        vb.staging.as_deref_mut()
    }

    /// Commits the staged contents. Static buffers materialize here;
    /// dynamic buffers are overwritten in place.
    pub fn unlock_vb(&mut self, device: &Device, queue: &Queue, handle: Handle<VbRes>) {
        let Some(vb) = self.vbs.get_mut(handle) else {
            return;
        };
        let Some(staging) = vb.staging.take() else {
            return;
        };

        if vb.dynamic {
            if let Some(buffer) = &vb.buffer {
                queue.write_buffer(buffer, 0, &staging);
            }
        } else {
            vb.buffer = Some(device.create_buffer_init(&BufferInitDescriptor {
                label: Some("vertex buffer"),
                contents: &staging,
                usage: BufferUsages::VERTEX,
            }));
        }
    }

    /// Convenience for fill-and-draw usage of dynamic buffers.
    pub fn set_dynamic_vb_data(&mut self, queue: &Queue, handle: Handle<VbRes>, data: &[u8]) {
        let Some(vb) = self.vbs.get(handle) else {
            return;
        };
        let max = vb.max_vertices as usize * vb.format.stride();
        if let Some(buffer) = &vb.buffer {
            queue.write_buffer(buffer, 0, &data[..data.len().min(max)]);
        }
    }

    pub fn delete_vb(&mut self, handle: Handle<VbRes>) {
        self.vbs.remove(handle);
    }

    // --- index buffers --------------------------------------------------

    pub fn create_ib(&mut self, device: &Device, indices: &[u16]) -> Handle<IbRes> {
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: BufferUsages::INDEX,
        });
        self.ibs.insert(IbRes { buffer })
    }

    pub fn delete_ib(&mut self, handle: Handle<IbRes>) {
        self.ibs.remove(handle);
    }
}

/// Levels below the base touched by a partial update of the given
/// region, with the origin of the region on each level. The march
/// keeps going while a dimension sits collapsed at 1 and only stops
/// once the whole region is a single texel, so narrow parts still
/// refresh every level they cover.
fn affected_mip_regions(levels: u32, x: u32, y: u32, width: u32, height: u32) -> Vec<(u32, u32, u32)> {
    let mut regions = Vec::new();
    let (mut x, mut y, mut width, mut height) = (x, y, width, height);
    for level in 1..levels {
        if width == 1 && height == 1 {
            break;
        }
        (width, height) = next_mip_size(width, height);
        x /= 2;
        y /= 2;
        regions.push((level, x, y));
    }
    regions
}

fn upload_level(queue: &Queue, texture: &Texture, level: u32, x: u32, y: u32, image: &RgbaImage) {
    queue.write_texture(
        TexelCopyTextureInfo {
            texture,
            mip_level: level,
            origin: Origin3d { x, y, z: 0 },
            aspect: TextureAspect::All,
        },
        image.as_raw(),
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width()),
            rows_per_image: Some(image.height()),
        },
        Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        },
    );
}

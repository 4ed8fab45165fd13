use nalgebra::{Vector2, Vector3};
use static_assertions::const_assert_eq;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

/// RGBA colour packed as four bytes, the order textures use on upload.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedCol(pub [u8; 4]);

impl PackedCol {
    pub const WHITE: PackedCol = PackedCol::new(255, 255, 255, 255);
    pub const BLACK: PackedCol = PackedCol::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        PackedCol([r, g, b, a])
    }

    pub const fn r(self) -> u8 {
        self.0[0]
    }
    pub const fn g(self) -> u8 {
        self.0[1]
    }
    pub const fn b(self) -> u8 {
        self.0[2]
    }
    pub const fn a(self) -> u8 {
        self.0[3]
    }

    /// Scales the colour channels, leaving alpha. Used for per-face
    /// block shading.
    pub fn scale(self, t: f32) -> PackedCol {
        PackedCol([
            (self.r() as f32 * t) as u8,
            (self.g() as f32 * t) as u8,
            (self.b() as f32 * t) as u8,
            self.a(),
        ])
    }
}

/// Per-vertex byte layout of the currently bound vertex buffer.
///
/// Selecting a format re-selects the input layout and both shader
/// stages, since stride/offset metadata and attribute sets differ.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Coloured = 0,
    Textured = 1,
}

impl VertexFormat {
    pub const fn stride(self) -> usize {
        STRIDE_SIZES[self as usize]
    }
}

pub const STRIDE_SIZES: [usize; 2] = [
    std::mem::size_of::<VertexColoured>(),
    std::mem::size_of::<VertexTextured>(),
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexColoured {
    pub pos: Vector3<f32>,
    pub col: PackedCol,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexTextured {
    pub pos: Vector3<f32>,
    pub col: PackedCol,
    pub uv: Vector2<f32>,
}

const_assert_eq!(std::mem::size_of::<VertexColoured>(), 16);
const_assert_eq!(std::mem::size_of::<VertexTextured>(), 24);

const COLOURED_ATTRS: [VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Unorm8x4,
];

const TEXTURED_ATTRS: [VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Unorm8x4,
    2 => Float32x2,
];

pub const fn vertex_layout(format: VertexFormat) -> VertexBufferLayout<'static> {
    match format {
        VertexFormat::Coloured => VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexColoured>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &COLOURED_ATTRS,
        },
        VertexFormat::Textured => VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexTextured>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &TEXTURED_ATTRS,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_layouts() {
        assert_eq!(VertexFormat::Coloured.stride(), 16);
        assert_eq!(VertexFormat::Textured.stride(), 24);
        assert_eq!(
            vertex_layout(VertexFormat::Coloured).array_stride,
            16 as BufferAddress
        );
        assert_eq!(
            vertex_layout(VertexFormat::Textured).array_stride,
            24 as BufferAddress
        );
    }

    #[test]
    fn attribute_offsets() {
        let layout = vertex_layout(VertexFormat::Textured);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 16);
    }

    #[test]
    fn colour_scale_keeps_alpha() {
        let c = PackedCol::new(200, 100, 50, 128).scale(0.5);
        assert_eq!(c, PackedCol::new(100, 50, 25, 128));
    }
}

//! Isometric block drawer for hotbar and inventory UIs.
//!
//! Blocks are drawn as three textured quads (top, left and right
//! faces) projected with the classic 30/45 degree isometric rotation.
//! Vertices are batched on the CPU and flushed in one indexed draw.

use nalgebra::{Rotation3, Vector2, Vector3};

use crate::gfx::handle::Handle;
use crate::gfx::resources::VbRes;
use crate::gfx::vertex::{PackedCol, VertexFormat, VertexTextured};
use crate::gfx::{Gfx, GfxResult};

/// Upper bound on vertices a single block contributes to a batch.
pub const MAX_VERTICES_PER_BLOCK: usize = 16;

/// Side faces are darkened to fake directional light.
const SHADE_X: f32 = 0.6;
const SHADE_Z: f32 = 0.8;

/// Texture rectangle in normalized atlas coordinates.
#[derive(Copy, Clone, Debug)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

/// Atlas rectangles for the three visible faces of a block.
#[derive(Copy, Clone, Debug)]
pub struct BlockFaces {
    pub top: UvRect,
    pub left: UvRect,
    pub right: UvRect,
}

pub struct IsometricDrawer {
    verts: Vec<VertexTextured>,
    vb: Handle<VbRes>,
    capacity: usize,
    transform: Rotation3<f32>,
}

impl IsometricDrawer {
    /// Starts a batch targeting the dynamic buffer `vb`, which must
    /// hold at least `capacity` textured vertices.
    pub fn begin(vb: Handle<VbRes>, capacity: usize) -> Self {
        let transform = Rotation3::from_axis_angle(&Vector3::x_axis(), (-30f32).to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), 45f32.to_radians());
        IsometricDrawer {
            verts: Vec::with_capacity(capacity),
            vb,
            capacity,
            transform,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    /// Buffers one block of side `size` centred on screen position
    /// (`x`, `y`). Silently drops the block once the batch is full.
    pub fn draw_block(&mut self, faces: &BlockFaces, size: f32, x: f32, y: f32) {
        if self.verts.len() + 12 > self.capacity {
            return;
        }

        let top = PackedCol::WHITE;
        let left = PackedCol::WHITE.scale(SHADE_X);
        let right = PackedCol::WHITE.scale(SHADE_Z);

        // Unit cube corners, rotated into the isometric frame and
        // projected by dropping depth.
        self.quad(
            [c(-1, 1, -1), c(-1, 1, 1), c(1, 1, 1), c(1, 1, -1)],
            faces.top,
            top,
            size,
            x,
            y,
        );
        self.quad(
            [c(-1, 1, -1), c(-1, 1, 1), c(-1, -1, 1), c(-1, -1, -1)],
            faces.left,
            left,
            size,
            x,
            y,
        );
        self.quad(
            [c(-1, 1, 1), c(1, 1, 1), c(1, -1, 1), c(-1, -1, 1)],
            faces.right,
            right,
            size,
            x,
            y,
        );
    }

    fn quad(
        &mut self,
        corners: [Vector3<f32>; 4],
        uv: UvRect,
        col: PackedCol,
        size: f32,
        x: f32,
        y: f32,
    ) {
        let uvs = [
            Vector2::new(uv.u1, uv.v1),
            Vector2::new(uv.u2, uv.v1),
            Vector2::new(uv.u2, uv.v2),
            Vector2::new(uv.u1, uv.v2),
        ];
        for (corner, uv) in corners.into_iter().zip(uvs) {
            let p = self.transform * (corner * (size * 0.5));
            self.verts.push(VertexTextured {
                pos: Vector3::new(x + p.x, y - p.y, 0.0),
                col,
                uv,
            });
        }
    }

    /// Uploads the batch and draws it, leaving the vertex format set
    /// for further 2D drawing.
    pub fn end(self, gfx: &mut Gfx) -> GfxResult<()> {
        if self.verts.is_empty() {
            return Ok(());
        }
        gfx.set_vertex_format(VertexFormat::Textured);
        gfx.set_dynamic_vb_data(self.vb, bytemuck::cast_slice(&self.verts));
        gfx.draw_vb_indexed_tris(self.verts.len() as u32)
    }
}

fn c(x: i32, y: i32, z: i32) -> Vector3<f32> {
    Vector3::new(x as f32, y as f32, z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces() -> BlockFaces {
        let uv = UvRect {
            u1: 0.0,
            v1: 0.0,
            u2: 1.0,
            v2: 1.0,
        };
        BlockFaces {
            top: uv,
            left: uv,
            right: uv,
        }
    }

    #[test]
    fn block_contributes_three_quads() {
        let mut drawer = IsometricDrawer::begin(Handle::NONE, 64);
        drawer.draw_block(&faces(), 16.0, 100.0, 100.0);
        assert_eq!(drawer.vertex_count(), 12);
        assert!(12 <= MAX_VERTICES_PER_BLOCK);
    }

    #[test]
    fn faces_are_shaded_by_axis() {
        let mut drawer = IsometricDrawer::begin(Handle::NONE, 64);
        drawer.draw_block(&faces(), 16.0, 0.0, 0.0);

        let v = &drawer.verts;
        assert_eq!(v[0].col, PackedCol::WHITE);
        assert_eq!(v[4].col, PackedCol::WHITE.scale(SHADE_X));
        assert_eq!(v[8].col, PackedCol::WHITE.scale(SHADE_Z));
        // Shading never touches alpha.
        assert!(v.iter().all(|v| v.col.a() == 255));
    }

    #[test]
    fn batch_refuses_overflow() {
        let mut drawer = IsometricDrawer::begin(Handle::NONE, 20);
        drawer.draw_block(&faces(), 16.0, 0.0, 0.0);
        drawer.draw_block(&faces(), 16.0, 32.0, 0.0);
        assert_eq!(drawer.vertex_count(), 12);
    }

    #[test]
    fn blocks_land_around_their_anchor() {
        let mut drawer = IsometricDrawer::begin(Handle::NONE, 64);
        drawer.draw_block(&faces(), 10.0, 50.0, 80.0);

        let cx: f32 = drawer.verts.iter().map(|v| v.pos.x).sum::<f32>() / 12.0;
        let cy: f32 = drawer.verts.iter().map(|v| v.pos.y).sum::<f32>() / 12.0;
        // Top face pulls the centroid up a little; it must stay near
        // the anchor relative to the block size.
        assert!((cx - 50.0).abs() < 10.0);
        assert!((cy - 80.0).abs() < 10.0);
    }
}

//! Debug gizmo showing the world axes at the player position.

use nalgebra::Vector3;

use crate::gfx::handle::Handle;
use crate::gfx::resources::VbRes;
use crate::gfx::vertex::{PackedCol, VertexColoured, VertexFormat};
use crate::gfx::{Gfx, GfxResult};

const NUM_VERTICES: u32 = 12;
const THICKNESS: f32 = 1.0 / 32.0;
const LENGTH: f32 = 3.0;

/// Each vertex picks its X/Y/Z from one of five lattice coordinates
/// around the anchor point: 0 = -length, 1 = -thickness, 2 = centre,
/// 3 = +thickness, 4 = +length.
const LATTICE: [[usize; 3]; NUM_VERTICES as usize] = [
    [2, 2, 1], [2, 2, 3], [4, 2, 3], [4, 2, 1], // X arrow
    [1, 2, 2], [1, 2, 4], [3, 2, 4], [3, 2, 2], // Z arrow
    [1, 2, 3], [1, 4, 3], [3, 4, 1], [3, 2, 1], // Y arrow
];

const COLORS: [PackedCol; 3] = [
    PackedCol::new(255, 0, 0, 255),
    PackedCol::new(0, 0, 255, 255),
    PackedCol::new(0, 255, 0, 255),
];

#[derive(Default)]
pub struct AxisLinesRenderer {
    pub enabled: bool,
    vb: Handle<VbRes>,
}

impl AxisLinesRenderer {
    pub fn new() -> Self {
        AxisLinesRenderer::default()
    }

    /// Draws the axis arrows anchored at `pos`. The vertical arrow is
    /// only visible from a third person camera, so in first person the
    /// last quad is skipped.
    pub fn render(&mut self, gfx: &mut Gfx, pos: Vector3<f32>, third_person: bool) -> GfxResult<()> {
        if !self.enabled {
            return Ok(());
        }
        // Created on first use rather than on context restore, so the
        // buffer only exists while the gizmo is actually shown.
        if self.vb.is_none() {
            self.vb = gfx.create_dynamic_vb(VertexFormat::Coloured, NUM_VERTICES);
        }

        let pos = pos + Vector3::new(0.0, 0.05, 0.0);
        let count = if third_person { 12 } else { 8 };

        let coords = [
            pos.add_scalar(-LENGTH),
            pos.add_scalar(-THICKNESS),
            pos,
            pos.add_scalar(THICKNESS),
            pos.add_scalar(LENGTH),
        ];

        let verts: Vec<VertexColoured> = LATTICE[..count]
            .iter()
            .enumerate()
            .map(|(i, idx)| VertexColoured {
                pos: Vector3::new(coords[idx[0]].x, coords[idx[1]].y, coords[idx[2]].z),
                col: COLORS[i >> 2],
            })
            .collect();

        gfx.set_vertex_format(VertexFormat::Coloured);
        if let Some(buf) = gfx.lock_vb(self.vb, count as u32) {
            buf.copy_from_slice(bytemuck::cast_slice(&verts));
        }
        gfx.unlock_vb(self.vb);
        gfx.draw_vb_indexed_tris(count as u32)
    }

    pub fn on_context_lost(&mut self, gfx: &mut Gfx) {
        gfx.delete_vb(self.vb);
        self.vb = Handle::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pos: Vector3<f32>, count: usize) -> Vec<VertexColoured> {
        let pos = pos + Vector3::new(0.0, 0.05, 0.0);
        let coords = [
            pos.add_scalar(-LENGTH),
            pos.add_scalar(-THICKNESS),
            pos,
            pos.add_scalar(THICKNESS),
            pos.add_scalar(LENGTH),
        ];
        LATTICE[..count]
            .iter()
            .enumerate()
            .map(|(i, idx)| VertexColoured {
                pos: Vector3::new(coords[idx[0]].x, coords[idx[1]].y, coords[idx[2]].z),
                col: COLORS[i >> 2],
            })
            .collect()
    }

    #[test]
    fn arrows_are_axis_aligned_strips() {
        let verts = build(Vector3::new(10.0, 20.0, 30.0), 12);

        // X arrow spans the full length along X and stays thin in Z.
        let xs: Vec<f32> = verts[..4].iter().map(|v| v.pos.x).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 10.0 + LENGTH);
        for v in &verts[..4] {
            assert!((v.pos.z - 30.0).abs() <= THICKNESS + 1e-6);
            assert_eq!(v.col, COLORS[0]);
        }

        // Z arrow mirrors that along Z.
        for v in &verts[4..8] {
            assert!((v.pos.x - 10.0).abs() <= THICKNESS + 1e-6);
            assert_eq!(v.col, COLORS[1]);
        }

        // Y arrow rises from the anchor height.
        let max_y = verts[8..].iter().map(|v| v.pos.y).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 20.05 + LENGTH);
    }

    #[test]
    fn first_person_drops_the_vertical_arrow() {
        let verts = build(Vector3::zeros(), 8);
        assert_eq!(verts.len(), 8);
        assert!(verts.iter().all(|v| v.col != COLORS[2]));
    }
}

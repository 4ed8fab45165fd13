//! Client-side mipmap synthesis.
//!
//! Mip levels are generated on the CPU by iterative 2x2 box
//! downsampling of the base level and uploaded per-level, instead of
//! asking the driver. Partial texture updates regenerate every
//! affected level from the just-uploaded region.

use image::RgbaImage;

/// Number of additional mip levels below the base level for a texture
/// of the given size: the full chain down to 1x1.
pub fn calc_mipmaps_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    31 - largest.leading_zeros()
}

/// Halves each dimension, with a floor of 1.
pub fn next_mip_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Produces the next mip level by averaging 2x2 pixel blocks. When a
/// dimension has already collapsed to 1, the missing neighbours are
/// clamped to the edge.
pub fn downsample(prev: &RgbaImage) -> RgbaImage {
    let (width, height) = next_mip_size(prev.width(), prev.height());
    let mut cur = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let x0 = (x * 2).min(prev.width() - 1);
            let x1 = (x * 2 + 1).min(prev.width() - 1);
            let y0 = (y * 2).min(prev.height() - 1);
            let y1 = (y * 2 + 1).min(prev.height() - 1);

            let mut sum = [0u32; 4];
            for (sx, sy) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
                let p = prev.get_pixel(sx, sy);
                for (acc, &channel) in sum.iter_mut().zip(p.0.iter()) {
                    *acc += channel as u32;
                }
            }

            cur.put_pixel(
                x,
                y,
                image::Rgba(sum.map(|channel| (channel / 4) as u8)),
            );
        }
    }
    cur
}

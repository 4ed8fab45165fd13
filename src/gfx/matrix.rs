//! Camera matrix helpers targeting wgpu's 0..1 clip depth.

use nalgebra::Matrix4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatrixType {
    View,
    Projection,
}

pub const ORTHO_NEAR: f32 = -10_000.0;
pub const ORTHO_FAR: f32 = 10_000.0;

/// Near-plane distance as a function of field-of-view and depth buffer
/// precision.
///
/// With sufficient depth precision the near plane can sit much closer,
/// which reduces clipping at high FOV without sacrificing precision
/// for faraway geometry. At low FOV the near plane stays put to keep
/// that extra precision. The bands are fixed constants; visual parity
/// across backends depends on them.
pub fn calc_z_near(fov_rad: f32, depth_bits: u32) -> f32 {
    if depth_bits < 24 || fov_rad <= 70f32.to_radians() {
        return 0.05;
    }
    if fov_rad <= 100f32.to_radians() {
        return 0.025;
    }
    if fov_rad <= 150f32.to_radians() {
        return 0.0125;
    }
    0.00390625
}

/// Right-handed perspective projection mapping depth to 0..1.
pub fn perspective_matrix(fov_rad: f32, aspect: f32, z_near: f32, z_far: f32) -> Matrix4<f32> {
    let c = 1.0 / (fov_rad / 2.0).tan();
    Matrix4::new(
        c / aspect, 0.0, 0.0, 0.0,
        0.0, c, 0.0, 0.0,
        0.0, 0.0, z_far / (z_near - z_far), z_near * z_far / (z_near - z_far),
        0.0, 0.0, -1.0, 0.0,
    )
}

/// Orthographic projection for 2D drawing: x right, y down from the
/// top-left corner, depth mapped to 0..1 over a generous z range.
pub fn ortho_matrix(width: f32, height: f32) -> Matrix4<f32> {
    let (n, f) = (ORTHO_NEAR, ORTHO_FAR);
    Matrix4::new(
        2.0 / width, 0.0, 0.0, -1.0,
        0.0, -2.0 / height, 0.0, 1.0,
        0.0, 0.0, 1.0 / (n - f), n / (n - f),
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    #[test]
    fn z_near_exact_band_constants() {
        assert_eq!(calc_z_near(60f32.to_radians(), 24), 0.05);
        assert_eq!(calc_z_near(70f32.to_radians(), 24), 0.05);
        assert_eq!(calc_z_near(90f32.to_radians(), 24), 0.025);
        assert_eq!(calc_z_near(100f32.to_radians(), 24), 0.025);
        assert_eq!(calc_z_near(120f32.to_radians(), 24), 0.0125);
        assert_eq!(calc_z_near(150f32.to_radians(), 24), 0.0125);
        assert_eq!(calc_z_near(179f32.to_radians(), 24), 0.00390625);
    }

    #[test]
    fn z_near_non_increasing_in_fov() {
        let mut prev = f32::MAX;
        for fov_deg in 1..180 {
            let near = calc_z_near((fov_deg as f32).to_radians(), 24);
            assert!(near <= prev, "near plane grew at {fov_deg} degrees");
            prev = near;
        }
    }

    #[test]
    fn shallow_depth_buffer_pins_near_plane() {
        for fov_deg in [30.0f32, 90.0, 179.0] {
            assert_eq!(calc_z_near(fov_deg.to_radians(), 16), 0.05);
        }
    }

    #[test]
    fn perspective_maps_near_to_zero_far_to_one() {
        let m = perspective_matrix(90f32.to_radians(), 1.0, 0.05, 100.0);

        let near = m * Vector4::new(0.0, 0.0, -0.05, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);

        let far = m * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn ortho_maps_client_rect_to_clip_space() {
        let m = ortho_matrix(800.0, 600.0);

        let top_left = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!((top_left.x, top_left.y), (-1.0, 1.0));

        let bottom_right = m * Vector4::new(800.0, 600.0, 0.0, 1.0);
        assert_eq!((bottom_right.x, bottom_right.y), (1.0, -1.0));
    }
}

//! Planar coordinate transforms shared by the camera models.
//!
//! Two coordinate systems are used throughout the crate:
//!
//! * **Default CS** `(x0, y0)`: pixel indexing. Origin at the upper left corner
//!   of the sensor, x points right and y points down.
//! * **Central CS** `(x, y)`: origin at the frame center, x points right and
//!   y points up.
//!
//! The map between them is a fixed affine transform. It is stored as a pair of
//! homogeneous 3x3 matrices whose inverse is written in closed form, so the two
//! directions are exact inverses of each other up to floating point rounding.

use nalgebra::{Matrix3, Point2};

/// Default CS <-> Central CS transform for a frame of a given size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransform {
    /// Default -> Central, acting on column vectors `[x0, y0, 1]`.
    to_central: Matrix3<f64>,
    /// Central -> Default.
    to_default: Matrix3<f64>,
}

impl FrameTransform {
    /// Builds the transform pair for a `width` x `height` frame.
    ///
    /// `x = x0 - width / 2`, `y = height / 2 - y0` and the inverse
    /// `x0 = x + width / 2`, `y0 = height / 2 - y`.
    pub fn new(width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        #[rustfmt::skip]
        let to_central = Matrix3::new(
            1.0,  0.0, -half_w,
            0.0, -1.0,  half_h,
            0.0,  0.0,  1.0,
        );
        #[rustfmt::skip]
        let to_default = Matrix3::new(
            1.0,  0.0, half_w,
            0.0, -1.0, half_h,
            0.0,  0.0, 1.0,
        );

        FrameTransform {
            to_central,
            to_default,
        }
    }

    /// Maps a Default CS point into the Central CS. No bounds checks.
    pub fn apply(&self, point: &Point2<f64>) -> Point2<f64> {
        self.to_central.transform_point(point)
    }

    /// Maps a Central CS point back into the Default CS.
    pub fn apply_inverse(&self, point: &Point2<f64>) -> Point2<f64> {
        self.to_default.transform_point(point)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.to_central
    }

    pub fn inverse_matrix(&self) -> &Matrix3<f64> {
        &self.to_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_transform_is_exact_inverse() {
        let transform = FrameTransform::new(2048.0, 1080.0);
        let product = transform.inverse_matrix() * transform.matrix();
        assert_eq!(product, Matrix3::identity());
    }

    #[test]
    fn test_frame_transform_corners() {
        let transform = FrameTransform::new(2048.0, 1080.0);

        let top_left = transform.apply(&Point2::new(0.0, 0.0));
        assert_eq!(top_left, Point2::new(-1024.0, 540.0));

        let bottom_right = transform.apply(&Point2::new(2048.0, 1080.0));
        assert_eq!(bottom_right, Point2::new(1024.0, -540.0));

        let center = transform.apply(&Point2::new(1024.0, 540.0));
        assert_eq!(center, Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_frame_transform_round_trip() {
        let transform = FrameTransform::new(752.0, 480.0);
        for &(x0, y0) in &[(0.0, 0.0), (13.0, 471.0), (376.5, 240.25), (752.0, 480.0)] {
            let p = Point2::new(x0, y0);
            let back = transform.apply_inverse(&transform.apply(&p));
            assert_relative_eq!(back.x, x0, epsilon = 1e-12);
            assert_relative_eq!(back.y, y0, epsilon = 1e-12);
        }
    }
}

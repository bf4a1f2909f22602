//! Two-camera triangulation.
//!
//! [`DoubleCameraModel`] combines the bearings measured by a left and a right
//! [`CameraModel`] separated by a known baseline into a depth estimate, a depth
//! error estimate and the object's position as seen by a virtual camera placed
//! in the middle of the baseline.
//!
//! All queries are pure functions of their inputs, so a single model can be
//! shared freely between threads.

pub mod config;

pub use config::StereoConfig;

use crate::camera::{CameraModel, CameraModelError};
use log::{debug, info};
use nalgebra::Point2;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StereoError {
    #[error(transparent)]
    Camera(#[from] CameraModelError),
    #[error("Incorrect coordinate values. Lines of sight of cameras do not cross.")]
    LinesOfSightDoNotCross { tl: f64, tr: f64 },
    #[error("Baseline distance must be positive and finite, got {0}")]
    InvalidBaseline(f64),
}

impl StereoError {
    /// True when a pixel coordinate fell outside its camera's frame.
    pub fn is_range_error(&self) -> bool {
        matches!(self, StereoError::Camera(e) if e.is_range_error())
    }

    /// True when the two lines of sight do not converge in front of the rig.
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, StereoError::LinesOfSightDoNotCross { .. })
    }
}

/// Object position reported in the center camera's Default CS.
///
/// `x0` and `y0` are truncated toward zero to whole pixels; `depth` is in the
/// baseline's length unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPosition {
    pub x0: i64,
    pub y0: i64,
    pub depth: f64,
}

/// A calibrated stereo rig.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleCameraModel {
    pub left: CameraModel,
    pub right: CameraModel,
    /// Hypothetical camera in the middle of the baseline, sharing the
    /// orientation of the physical cameras.
    pub center: CameraModel,
    /// Distance between the left and right cameras.
    pub distance: f64,
}

impl DoubleCameraModel {
    /// # Errors
    ///
    /// [`StereoError::InvalidBaseline`] if `distance` is not a positive finite number.
    pub fn new(
        left: CameraModel,
        right: CameraModel,
        center: CameraModel,
        distance: f64,
    ) -> Result<Self, StereoError> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(StereoError::InvalidBaseline(distance));
        }
        info!(
            "Stereo rig: baseline {}, left {}x{}, right {}x{}",
            distance,
            left.resolution.width,
            left.resolution.height,
            right.resolution.width,
            right.resolution.height
        );
        Ok(DoubleCameraModel {
            left,
            right,
            center,
            distance,
        })
    }

    pub fn from_config(config: &StereoConfig) -> Result<Self, StereoError> {
        Self::new(
            config.left.clone(),
            config.right.clone(),
            config.center.clone(),
            config.baseline,
        )
    }

    fn bearings(
        &self,
        left_coords: &Point2<f64>,
        right_coords: &Point2<f64>,
    ) -> Result<(f64, f64), StereoError> {
        let tl = self.left.obj_angle(left_coords)?;
        let tr = self.right.obj_angle(right_coords)?;
        Ok((tl, tr))
    }

    /// Estimates the distance to the object from its pixel coordinates in
    /// both cameras: `distance / (tl - tr)`.
    ///
    /// # Errors
    ///
    /// * [`StereoError::Camera`]: a coordinate lies outside its frame.
    /// * [`StereoError::LinesOfSightDoNotCross`]: `tl - tr <= 0`, parallel
    ///   lines of sight included.
    pub fn obj_dist(
        &self,
        left_coords: &Point2<f64>,
        right_coords: &Point2<f64>,
    ) -> Result<f64, StereoError> {
        let (tl, tr) = self.bearings(left_coords, right_coords)?;
        let diff = tl - tr;
        if diff.is_nan() || diff <= 0.0 {
            return Err(StereoError::LinesOfSightDoNotCross { tl, tr });
        }

        let dist = self.distance / diff;
        debug!("tl = {tl}, tr = {tr}, distance = {dist}");
        Ok(dist)
    }

    /// First order error of [`DoubleCameraModel::obj_dist`] caused by one pixel
    /// of quantization in each camera, combined in quadrature.
    ///
    /// Defined for diverging lines of sight too, so swapping the left and right
    /// coordinates of a rig with identical cameras gives the same value. A
    /// diverging pair therefore returns a value here while
    /// [`DoubleCameraModel::obj_dist`] rejects it.
    ///
    /// # Errors
    ///
    /// * [`StereoError::Camera`]: a coordinate lies outside its frame.
    /// * [`StereoError::LinesOfSightDoNotCross`]: `tl == tr`, the derivative
    ///   is unbounded.
    pub fn obj_dist_err(
        &self,
        left_coords: &Point2<f64>,
        right_coords: &Point2<f64>,
    ) -> Result<f64, StereoError> {
        let (tl, tr) = self.bearings(left_coords, right_coords)?;
        if tl == tr {
            return Err(StereoError::LinesOfSightDoNotCross { tl, tr });
        }

        let tl_err = self.left.obj_angle_err();
        let tr_err = self.right.obj_angle_err();
        let dd_dtan = self.distance / (tl - tr).powi(2);

        Ok((dd_dtan * tl_err).hypot(dd_dtan * tr_err))
    }

    /// Position of the object in the center camera's Default CS plus its depth.
    ///
    /// The vertical coordinate is the mean of both inputs' `y0`; vertical
    /// parallax is not modelled.
    ///
    /// # Errors
    ///
    /// Same as [`DoubleCameraModel::obj_dist`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nalgebra::Point2;
    /// use stereo_photogrammetry::{DoubleCameraModel, StereoConfig};
    ///
    /// let rig = DoubleCameraModel::from_config(&StereoConfig::default()).unwrap();
    /// let pos = rig
    ///     .obj_coords(&Point2::new(1045.0, 0.0), &Point2::new(648.0, 0.0))
    ///     .unwrap();
    /// assert_eq!((pos.x0, pos.y0), (846, 0));
    /// assert!(pos.depth > 0.0);
    /// ```
    pub fn obj_coords(
        &self,
        left_coords: &Point2<f64>,
        right_coords: &Point2<f64>,
    ) -> Result<ObjectPosition, StereoError> {
        let obj_dist = self.obj_dist(left_coords, right_coords)?;
        let tl = self.left.obj_angle(left_coords)?;

        // Re-center the left bearing on the middle of the baseline.
        let obj_angle = tl - (self.distance / 2.0 / obj_dist);
        let x = self.center.central_x_from_angle(obj_angle);
        let y0 = (left_coords.y + right_coords.y) / 2.0;
        let x0 = self.center.to_default(&Point2::new(x, 0.0)).x;

        debug!("center bearing = {obj_angle}, x = {x}, x0 = {x0}, y0 = {y0}");

        Ok(ObjectPosition {
            x0: x0 as i64,
            y0: y0 as i64,
            depth: obj_dist,
        })
    }

    /// [`DoubleCameraModel::obj_coords`] together with
    /// [`DoubleCameraModel::obj_dist_err`].
    pub fn obj_coords_with_err(
        &self,
        left_coords: &Point2<f64>,
        right_coords: &Point2<f64>,
    ) -> Result<(ObjectPosition, f64), StereoError> {
        let position = self.obj_coords(left_coords, right_coords)?;
        let err = self.obj_dist_err(left_coords, right_coords)?;
        Ok((position, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_rig() -> DoubleCameraModel {
        DoubleCameraModel::from_config(&StereoConfig::default()).unwrap()
    }

    fn half_tan() -> f64 {
        (78f64.to_radians() / 2.0).tan()
    }

    #[test]
    fn test_new_rejects_bad_baseline() {
        let cam = CameraModel::from_degrees(2048.0, 1080.0, 78.0).unwrap();
        for baseline in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = DoubleCameraModel::new(cam.clone(), cam.clone(), cam.clone(), baseline);
            assert!(matches!(result, Err(StereoError::InvalidBaseline(_))));
        }
    }

    #[test]
    fn test_obj_dist_reference_scenario() {
        let rig = reference_rig();
        let dist = rig
            .obj_dist(&Point2::new(1045.0, 0.0), &Point2::new(648.0, 0.0))
            .unwrap();

        // tl - tr = tan(39 deg) * (21 + 376) * 2 / 2048
        let expected = 100.0 / (half_tan() * 397.0 * 2.0 / 2048.0);
        assert_relative_eq!(dist, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_obj_coords_reference_scenario() {
        let rig = reference_rig();
        let pos = rig
            .obj_coords(&Point2::new(1045.0, 0.0), &Point2::new(648.0, 0.0))
            .unwrap();

        assert!(pos.depth.is_finite() && pos.depth > 0.0);
        // Mean of the two central offsets (21 and -376) shifted back by 1024.
        assert_eq!(pos.x0, 846);
        assert_eq!(pos.y0, 0);
    }

    #[test]
    fn test_obj_coords_y_is_mean_of_inputs() {
        let rig = reference_rig();
        let pos = rig
            .obj_coords(&Point2::new(1200.0, 301.0), &Point2::new(900.0, 306.0))
            .unwrap();
        assert_eq!(pos.y0, 303);
    }

    #[test]
    fn test_non_converging_lines_of_sight() {
        let rig = reference_rig();
        let left = Point2::new(500.0, 0.0);
        let right = Point2::new(1500.0, 0.0);

        let err = rig.obj_dist(&left, &right).unwrap_err();
        assert!(err.is_geometry_error());
        assert!(!err.is_range_error());

        let err = rig.obj_coords(&left, &right).unwrap_err();
        assert!(err.is_geometry_error());
        assert_eq!(
            err.to_string(),
            "Incorrect coordinate values. Lines of sight of cameras do not cross."
        );
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let rig = reference_rig();
        let nan = Point2::new(f64::NAN, 0.0);
        let right = Point2::new(648.0, 0.0);

        let err = rig.obj_dist(&nan, &right).unwrap_err();
        assert!(err.is_range_error());
        assert!(rig.obj_coords(&nan, &right).unwrap_err().is_range_error());
        assert!(rig.obj_dist_err(&nan, &right).unwrap_err().is_range_error());
        assert!(rig
            .obj_coords(&Point2::new(1045.0, 0.0), &Point2::new(648.0, f64::INFINITY))
            .unwrap_err()
            .is_range_error());
        assert!(rig
            .left
            .to_central(&Point2::new(f64::NAN, f64::NAN))
            .unwrap_err()
            .is_range_error());
    }

    #[test]
    fn test_parallel_lines_of_sight_rejected() {
        let rig = reference_rig();
        let p = Point2::new(1300.0, 10.0);
        assert!(rig.obj_dist(&p, &p).unwrap_err().is_geometry_error());
        assert!(rig.obj_coords(&p, &p).unwrap_err().is_geometry_error());
        assert!(rig.obj_dist_err(&p, &p).unwrap_err().is_geometry_error());
    }

    #[test]
    fn test_out_of_range_coordinate_propagates() {
        let rig = reference_rig();
        let err = rig
            .obj_coords(&Point2::new(1045.0, 0.0), &Point2::new(648.0, 1081.0))
            .unwrap_err();
        assert!(err.is_range_error());
        assert_eq!(
            err.to_string(),
            "Coordinate values must not exceed frame width and height."
        );

        let err = rig
            .obj_coords(&Point2::new(-1.0, 0.0), &Point2::new(648.0, 0.0))
            .unwrap_err();
        assert!(err.is_range_error());
    }

    #[test]
    fn test_obj_dist_err_symmetric_for_identical_cameras() {
        let rig = reference_rig();
        let a = Point2::new(1045.0, 0.0);
        let b = Point2::new(648.0, 0.0);

        let forward = rig.obj_dist_err(&a, &b).unwrap();
        let swapped = rig.obj_dist_err(&b, &a).unwrap();
        assert_relative_eq!(forward, swapped, max_relative = 1e-12);

        let dist = rig.obj_dist(&a, &b).unwrap();
        let dd_dtan = dist * dist / rig.distance;
        let expected = dd_dtan * rig.left.obj_angle_err() * std::f64::consts::SQRT_2;
        assert_relative_eq!(forward, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_obj_coords_with_err() {
        let rig = reference_rig();
        let a = Point2::new(1045.0, 0.0);
        let b = Point2::new(648.0, 0.0);
        let (pos, err) = rig.obj_coords_with_err(&a, &b).unwrap();
        assert_eq!(pos, rig.obj_coords(&a, &b).unwrap());
        assert_eq!(err, rig.obj_dist_err(&a, &b).unwrap());
    }

    #[test]
    fn test_obj_coords_is_idempotent() {
        let rig = reference_rig();
        let a = Point2::new(1333.0, 77.0);
        let b = Point2::new(1002.0, 79.0);
        let first = rig.obj_coords(&a, &b).unwrap();
        let second = rig.obj_coords(&a, &b).unwrap();
        assert_eq!(first.x0, second.x0);
        assert_eq!(first.y0, second.y0);
        assert_eq!(first.depth.to_bits(), second.depth.to_bits());
    }

    #[test]
    fn test_rig_is_shareable_across_threads() {
        let rig = std::sync::Arc::new(reference_rig());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let rig = rig.clone();
                std::thread::spawn(move || {
                    rig.obj_coords(
                        &Point2::new(1100.0 + i as f64, 0.0),
                        &Point2::new(700.0, 0.0),
                    )
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}

//! Implements the linear-tangent camera model.
//!
//! This module provides the [`CameraModel`] struct: a single camera described
//! only by its frame size and horizontal angle of view. The bearing of a pixel
//! is modelled as `tan(theta) = tan(aov / 2) * 2x / width`, with `x` the pixel's
//! horizontal offset in the Central CS. The tangent is interpolated linearly in
//! pixel offset rather than derived from a focal length, and the stereo
//! formulas in [`crate::stereo`] are built on this same linear model.

use crate::camera::{validation, CameraModelError, Resolution};
use crate::geometry::FrameTransform;
use log::info;
use nalgebra::Point2;
use std::fs;
use std::io::Write;
use yaml_rust::{Yaml, YamlLoader};

/// A single camera of the rig.
///
/// # Examples
///
/// ```rust
/// use nalgebra::Point2;
/// use stereo_photogrammetry::camera::CameraModel;
///
/// let camera = CameraModel::from_degrees(2048.0, 1080.0, 78.0).unwrap();
///
/// // The horizontal center of the frame has zero bearing.
/// assert_eq!(camera.obj_angle(&Point2::new(1024.0, 300.0)).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CameraModel {
    /// Frame size in pixels.
    pub resolution: Resolution,
    /// Horizontal angle of view in radians, measured along the width.
    pub aov: f64,
    transform: FrameTransform,
}

impl CameraModel {
    /// Creates a new [`CameraModel`].
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - frame size in pixels, both positive.
    /// * `aov` - horizontal angle of view in radians, `0 < aov < pi`.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::InvalidResolution`]
    /// * [`CameraModelError::InvalidAngleOfView`]
    pub fn new(width: f64, height: f64, aov: f64) -> Result<Self, CameraModelError> {
        let resolution = Resolution { width, height };
        validation::validate_resolution(&resolution)?;
        validation::validate_angle_of_view(aov)?;

        Ok(Self::new_unchecked(width, height, aov))
    }

    /// Builds a camera from parameters already known to be valid.
    pub(crate) fn new_unchecked(width: f64, height: f64, aov: f64) -> Self {
        CameraModel {
            resolution: Resolution { width, height },
            aov,
            transform: FrameTransform::new(width, height),
        }
    }

    /// Same as [`CameraModel::new`] with the angle of view given in degrees.
    pub fn from_degrees(width: f64, height: f64, aov_deg: f64) -> Result<Self, CameraModelError> {
        Self::new(width, height, aov_deg.to_radians())
    }

    /// Converts a Default CS pixel coordinate to the Central CS.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::NonFiniteCoordinate`]: `x0` or `y0` is NaN or infinite.
    /// * [`CameraModelError::NegativeCoordinate`]: `x0 < 0` or `y0 < 0`.
    /// * [`CameraModelError::CoordinateOutsideFrame`]: `x0 > width` or `y0 > height`.
    pub fn to_central(&self, point: &Point2<f64>) -> Result<Point2<f64>, CameraModelError> {
        validation::validate_pixel(point.x, point.y, &self.resolution)?;
        Ok(self.transform.apply(point))
    }

    /// Converts a Central CS coordinate back to the Default CS.
    ///
    /// Not bounds checked: the virtual center camera produces coordinates
    /// that may fall outside its own frame.
    pub fn to_default(&self, point: &Point2<f64>) -> Point2<f64> {
        self.transform.apply_inverse(point)
    }

    /// Returns the TANGENT of the horizontal angle between the optical axis and
    /// the line of sight through the pixel `point` (Default CS).
    ///
    /// Positive when the object is to the camera's right, negative to its left.
    /// The frame edge (`x0 = width`) maps to exactly `tan(aov / 2)`.
    pub fn obj_angle(&self, point: &Point2<f64>) -> Result<f64, CameraModelError> {
        let central = self.to_central(point)?;
        Ok(self.half_aov_tan() * central.x * 2.0 / self.resolution.width)
    }

    /// Bearing tangent change caused by one pixel of horizontal quantization.
    pub fn obj_angle_err(&self) -> f64 {
        self.half_aov_tan() * 2.0 / self.resolution.width
    }

    /// Inverse of [`CameraModel::obj_angle`] on the horizontal axis: the
    /// Central CS `x` at which this camera would see the bearing `tan_theta`.
    pub fn central_x_from_angle(&self, tan_theta: f64) -> f64 {
        tan_theta / self.half_aov_tan() * self.resolution.width / 2.0
    }

    fn half_aov_tan(&self) -> f64 {
        (self.aov / 2.0).tan()
    }

    /// Builds a camera from a YAML camera node holding `resolution: [w, h]`
    /// and `angle_of_view` in degrees.
    pub(crate) fn from_yaml_node(node: &Yaml, name: &str) -> Result<Self, CameraModelError> {
        let resolution_yaml = node["resolution"].as_vec().ok_or_else(|| {
            CameraModelError::InvalidParams(format!(
                "YAML missing '{name}.resolution' or not an array"
            ))
        })?;
        if resolution_yaml.len() != 2 {
            return Err(CameraModelError::InvalidParams(format!(
                "'{name}.resolution' must hold exactly two values"
            )));
        }

        let width = yaml_number(&resolution_yaml[0]).ok_or_else(|| {
            CameraModelError::InvalidParams("Invalid width: not a number".to_string())
        })?;
        let height = yaml_number(&resolution_yaml[1]).ok_or_else(|| {
            CameraModelError::InvalidParams("Invalid height: not a number".to_string())
        })?;
        let aov_deg = yaml_number(&node["angle_of_view"]).ok_or_else(|| {
            CameraModelError::InvalidParams(format!(
                "YAML missing '{name}.angle_of_view' or not a number"
            ))
        })?;

        Self::from_degrees(width, height, aov_deg)
    }

    pub(crate) fn to_yaml_value(&self) -> Result<serde_yaml::Value, CameraModelError> {
        let mapping = serde_yaml::Mapping::from_iter([
            (
                serde_yaml::Value::String("resolution".to_string()),
                serde_yaml::to_value(vec![self.resolution.width, self.resolution.height])?,
            ),
            (
                serde_yaml::Value::String("angle_of_view".to_string()),
                serde_yaml::to_value(self.aov.to_degrees())?,
            ),
        ]);
        Ok(serde_yaml::Value::Mapping(mapping))
    }

    /// Loads the camera stored under `cam0` in a YAML file.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::IOError`]: the file cannot be read.
    /// * [`CameraModelError::YamlError`]: the content is not valid YAML.
    /// * [`CameraModelError::InvalidParams`]: missing or ill-typed fields.
    /// * Any validation error from [`CameraModel::new`].
    pub fn load_from_yaml(path: &str) -> Result<Self, CameraModelError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = docs
            .first()
            .ok_or_else(|| CameraModelError::YamlError("Empty YAML document".to_string()))?;

        let model = Self::from_yaml_node(&doc["cam0"], "cam0")?;
        info!(
            "Loaded camera from {}: {}x{} px, aov {:.3} deg",
            path,
            model.resolution.width,
            model.resolution.height,
            model.aov.to_degrees()
        );
        Ok(model)
    }

    /// Saves the camera under `cam0` in a YAML file.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), CameraModelError> {
        let yaml = serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("cam0".to_string()),
            self.to_yaml_value()?,
        )]));
        let yaml_string = serde_yaml::to_string(&yaml)?;

        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;

        Ok(())
    }
}

/// Reads a YAML scalar that may have been written as either an integer or a real.
pub(crate) fn yaml_number(node: &Yaml) -> Option<f64> {
    node.as_f64().or_else(|| node.as_i64().map(|v| v as f64))
}

//! Shared camera types: frame resolution, the camera error type and the
//! parameter validation helpers used by every model in the crate.

pub mod linear;

pub use linear::CameraModel;

use serde::{Deserialize, Serialize};

/// Frame size in pixels. Stored as floats since the geometry works on
/// half-pixel offsets (e.g. `width / 2` for odd widths).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: f64,
    pub height: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraModelError {
    #[error("Coordinate values must be finite numbers.")]
    NonFiniteCoordinate { x0: f64, y0: f64 },
    #[error("Coordinate values must be greater than zero in default CS.")]
    NegativeCoordinate { x0: f64, y0: f64 },
    #[error("Coordinate values must not exceed frame width and height.")]
    CoordinateOutsideFrame {
        x0: f64,
        y0: f64,
        width: f64,
        height: f64,
    },
    #[error("Frame width and height must be positive and finite")]
    InvalidResolution,
    #[error("Angle of view must lie strictly between 0 and pi radians, got {0}")]
    InvalidAngleOfView(f64),
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl CameraModelError {
    /// True for the out-of-range pixel coordinate family of errors.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            CameraModelError::NonFiniteCoordinate { .. }
                | CameraModelError::NegativeCoordinate { .. }
                | CameraModelError::CoordinateOutsideFrame { .. }
        )
    }
}

impl From<std::io::Error> for CameraModelError {
    fn from(err: std::io::Error) -> Self {
        CameraModelError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for CameraModelError {
    fn from(err: yaml_rust::ScanError) -> Self {
        CameraModelError::YamlError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CameraModelError {
    fn from(err: serde_yaml::Error) -> Self {
        CameraModelError::YamlError(err.to_string())
    }
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;
    use std::f64::consts::PI;

    pub fn validate_resolution(resolution: &Resolution) -> Result<(), CameraModelError> {
        if !(resolution.width.is_finite() && resolution.height.is_finite())
            || resolution.width <= 0.0
            || resolution.height <= 0.0
        {
            return Err(CameraModelError::InvalidResolution);
        }
        Ok(())
    }

    pub fn validate_angle_of_view(aov: f64) -> Result<(), CameraModelError> {
        if !aov.is_finite() || aov <= 0.0 || aov >= PI {
            return Err(CameraModelError::InvalidAngleOfView(aov));
        }
        Ok(())
    }

    /// Checks that a Default CS pixel coordinate lies inside the closed frame
    /// `[0, width] x [0, height]`.
    pub fn validate_pixel(
        x0: f64,
        y0: f64,
        resolution: &Resolution,
    ) -> Result<(), CameraModelError> {
        if !x0.is_finite() || !y0.is_finite() {
            return Err(CameraModelError::NonFiniteCoordinate { x0, y0 });
        }
        if x0 < 0.0 || y0 < 0.0 {
            return Err(CameraModelError::NegativeCoordinate { x0, y0 });
        }
        if x0 > resolution.width || y0 > resolution.height {
            return Err(CameraModelError::CoordinateOutsideFrame {
                x0,
                y0,
                width: resolution.width,
                height: resolution.height,
            });
        }
        Ok(())
    }
}

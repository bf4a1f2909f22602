//! Stereo Photogrammetry Library
//!
//! Estimates the position and depth of an object seen by two calibrated
//! cameras of a stereo rig from its pixel coordinates in both images.
//! The library provides:
//! - [`CameraModel`]: a single camera with its Default/Central coordinate
//!   systems and the linear-tangent bearing model
//! - [`DoubleCameraModel`]: the stereo solve (depth, depth error, position in
//!   the virtual center camera)
//! - [`StereoConfig`]: immutable rig configuration, loadable from YAML
//! - [`util`]: row parsing, batch evaluation and result export used by the
//!   `photogrammetry` binary

pub mod camera;
pub mod geometry;
pub mod stereo;
pub mod util;

// Re-export commonly used types
pub use camera::{CameraModel, CameraModelError, Resolution};
pub use geometry::FrameTransform;
pub use stereo::{DoubleCameraModel, ObjectPosition, StereoConfig, StereoError};
pub use util::{RowError, RowResult, Triangulation, UtilError};

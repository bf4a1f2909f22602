//! Rig configuration: the three cameras and the baseline, read once at startup
//! and handed to [`crate::stereo::DoubleCameraModel::from_config`].
//!
//! YAML layout:
//!
//! ```yaml
//! baseline: 100.0
//! cam0:                       # left camera
//!   resolution: [2048, 1080]
//!   angle_of_view: 78.0       # degrees
//! cam1: ...                   # right camera, optional (defaults to cam0)
//! cam_center: ...             # virtual center camera, optional (defaults to cam0)
//! ```

use crate::camera::linear::yaml_number;
use crate::camera::{CameraModel, CameraModelError};
use crate::stereo::StereoError;
use log::info;
use std::fs;
use std::io::Write;
use yaml_rust::{Yaml, YamlLoader};

pub const DEFAULT_WIDTH: f64 = 2048.0;
pub const DEFAULT_HEIGHT: f64 = 1080.0;
pub const DEFAULT_AOV_DEG: f64 = 78.0;
pub const DEFAULT_BASELINE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StereoConfig {
    pub left: CameraModel,
    pub right: CameraModel,
    pub center: CameraModel,
    /// Distance between left and right cameras, in the unit depths are reported in.
    pub baseline: f64,
}

impl StereoConfig {
    /// A rig whose three cameras share one configuration.
    pub fn symmetric(camera: CameraModel, baseline: f64) -> Result<Self, StereoError> {
        validate_baseline(baseline)?;
        Ok(StereoConfig {
            left: camera.clone(),
            right: camera.clone(),
            center: camera,
            baseline,
        })
    }

    pub fn load_from_yaml(path: &str) -> Result<Self, StereoError> {
        let contents = fs::read_to_string(path).map_err(CameraModelError::from)?;
        let config = Self::from_yaml_str(&contents)?;
        info!(
            "Loaded stereo configuration from {}: baseline {}",
            path, config.baseline
        );
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, StereoError> {
        let docs = YamlLoader::load_from_str(contents).map_err(CameraModelError::from)?;
        let doc = docs
            .first()
            .ok_or_else(|| CameraModelError::YamlError("Empty YAML document".to_string()))?;

        let baseline = yaml_number(&doc["baseline"]).ok_or_else(|| {
            CameraModelError::InvalidParams("YAML missing 'baseline' or not a number".to_string())
        })?;
        validate_baseline(baseline)?;

        let left = CameraModel::from_yaml_node(&doc["cam0"], "cam0")?;
        let right = optional_camera(doc, "cam1")?.unwrap_or_else(|| left.clone());
        let center = optional_camera(doc, "cam_center")?.unwrap_or_else(|| left.clone());

        Ok(StereoConfig {
            left,
            right,
            center,
            baseline,
        })
    }

    pub fn save_to_yaml(&self, path: &str) -> Result<(), StereoError> {
        let yaml = serde_yaml::Value::Mapping(serde_yaml::Mapping::from_iter([
            (
                serde_yaml::Value::String("baseline".to_string()),
                serde_yaml::to_value(self.baseline).map_err(CameraModelError::from)?,
            ),
            (
                serde_yaml::Value::String("cam0".to_string()),
                self.left.to_yaml_value()?,
            ),
            (
                serde_yaml::Value::String("cam1".to_string()),
                self.right.to_yaml_value()?,
            ),
            (
                serde_yaml::Value::String("cam_center".to_string()),
                self.center.to_yaml_value()?,
            ),
        ]));
        let yaml_string = serde_yaml::to_string(&yaml).map_err(CameraModelError::from)?;

        let mut file = fs::File::create(path).map_err(CameraModelError::from)?;
        file.write_all(yaml_string.as_bytes())
            .map_err(CameraModelError::from)?;
        Ok(())
    }
}

impl Default for StereoConfig {
    /// 2048x1080 cameras with a 78 degree angle of view, 100 units apart.
    fn default() -> Self {
        let camera =
            CameraModel::new_unchecked(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_AOV_DEG.to_radians());
        StereoConfig {
            left: camera.clone(),
            right: camera.clone(),
            center: camera,
            baseline: DEFAULT_BASELINE,
        }
    }
}

fn validate_baseline(baseline: f64) -> Result<(), StereoError> {
    if !baseline.is_finite() || baseline <= 0.0 {
        return Err(StereoError::InvalidBaseline(baseline));
    }
    Ok(())
}

fn optional_camera(doc: &Yaml, key: &str) -> Result<Option<CameraModel>, CameraModelError> {
    match &doc[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        node => CameraModel::from_yaml_node(node, key).map(Some),
    }
}

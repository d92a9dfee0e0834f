//! JSON vehicle profiles.
//!
//! ```json
//! {
//!   "mass": 1200.0,
//!   "wheel_radius": 0.31,
//!   "engine": { "kind": "table", "points": [[1000, 280], [4500, 420], [6500, 360]] }
//! }
//! ```
//!
//! Any field left out takes the reference car's value.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{ConstantTorque, EngineTorqueCurve, TableTorque};
use crate::profile::{ProfileError, ProfileParams, VehicleProfile};

/// Errors from loading or saving profile files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),
}

/// Serialized form of an engine torque curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineSpec {
    Constant { torque: f64 },
    Table { points: Vec<(f64, f64)> },
}

impl Default for EngineSpec {
    fn default() -> Self {
        EngineSpec::Constant { torque: 448.0 }
    }
}

impl EngineSpec {
    pub fn build(&self) -> Result<Arc<dyn EngineTorqueCurve>, ProfileError> {
        Ok(match self {
            EngineSpec::Constant { torque } => {
                if !torque.is_finite() {
                    return Err(ProfileError::NonFinite {
                        field: "engine.torque",
                        value: *torque,
                    });
                }
                Arc::new(ConstantTorque::new(*torque))
            }
            EngineSpec::Table { points } => Arc::new(TableTorque::new(points.clone())?),
        })
    }
}

/// On-disk vehicle profile: physical constants plus an engine description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(flatten)]
    pub params: ProfileParams,
    #[serde(default)]
    pub engine: EngineSpec,
}

impl ProfileConfig {
    /// Validate into a ready-to-simulate profile.
    pub fn build(&self) -> Result<VehicleProfile, ProfileError> {
        VehicleProfile::new(self.params, self.engine.build()?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(path = %path.display(), "loaded vehicle profile");
        Ok(config)
    }

    /// Load and validate in one go.
    pub fn load_profile(path: impl AsRef<Path>) -> Result<VehicleProfile, ConfigError> {
        Ok(Self::load(path)?.build()?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

use anyhow::Result;
use frame_rotate::RotationAngle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use virtual_camera::{SessionConfig, SessionPreset};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera id to use; the first discovered camera when unset.
    pub device: Option<String>,
    pub rotation: RotationAngle,
    pub preset: SessionPreset,
    pub min_fps: f32,
    pub frame_timeout_ms: u64,
    pub max_consecutive_errors: u32,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            device: None,
            rotation: RotationAngle::Deg0,
            preset: session.preferred_preset,
            min_fps: session.min_fps,
            frame_timeout_ms: session.frame_timeout_ms,
            max_consecutive_errors: session.max_consecutive_errors,
        }
    }
}

impl Config {
    /// Load from `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            preferred_preset: self.preset,
            min_fps: self.min_fps,
            frame_timeout_ms: self.frame_timeout_ms,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub driver: String,
}

/// Capture quality presets, tried in order of preference.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPreset {
    #[default]
    Hd1280x720,
    Medium,
}

impl SessionPreset {
    pub fn resolution(self) -> (u32, u32) {
        match self {
            SessionPreset::Hd1280x720 => (1280, 720),
            SessionPreset::Medium => (480, 360),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preset to request; falls back to `Medium` when the device lacks it.
    pub preferred_preset: SessionPreset,
    /// Frame rate below which the session logs a health warning.
    pub min_fps: f32,
    /// No frame for this long counts as a stalled camera.
    pub frame_timeout_ms: u64,
    /// Consecutive read failures after which the worker gives up.
    pub max_consecutive_errors: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preferred_preset: SessionPreset::Hd1280x720,
            min_fps: 10.0,
            frame_timeout_ms: 1000,
            max_consecutive_errors: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_resolutions() {
        assert_eq!(SessionPreset::Hd1280x720.resolution(), (1280, 720));
        assert_eq!(SessionPreset::Medium.resolution(), (480, 360));
    }

    #[test]
    fn test_config_fills_missing_fields() {
        let cfg: SessionConfig = serde_json::from_str(r#"{ "preferred_preset": "medium" }"#).unwrap();
        assert_eq!(cfg.preferred_preset, SessionPreset::Medium);
        assert_eq!(cfg.max_consecutive_errors, SessionConfig::default().max_consecutive_errors);
    }
}

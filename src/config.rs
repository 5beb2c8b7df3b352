use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration, loadable from a TOML file
///
/// ```toml
/// max_frames = 1000
///
/// [thresholds]
/// kick_amplitude = 0.25
///
/// [model]
/// presence_threshold = 0.6
///
/// [report]
/// top_n = 3
///
/// [action]
/// fps = 16
/// top_k = 5
/// ```
///
/// Every field is optional; missing ones keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames read per video before the rest is ignored
    pub max_frames: usize,
    pub thresholds: Thresholds,
    pub model: ModelConfig,
    pub report: ReportConfig,
    pub action: ActionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_frames: 1000,
            thresholds: Thresholds::default(),
            model: ModelConfig::default(),
            report: ReportConfig::default(),
            action: ActionConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Numeric limits used by the technique rules
///
/// Distances are in normalized image units, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Generic left/right symmetry tolerance
    pub body_alignment: f64,
    /// Elbow spread tolerance for pulls
    pub arm_movement: f64,
    /// Breaststroke hands/knees may reach this multiple of shoulder width
    pub shoulder_width_ratio: f64,
    /// Minimum butterfly shoulder-to-hip vertical travel
    pub shoulder_hip_distance: f64,
    pub freestyle_body_angle: f64,
    /// Body angle limit for breaststroke and backstroke
    pub body_angle: f64,
    /// Minimum wrist-to-shoulder reach in freestyle
    pub arm_extension: f64,
    /// Elbow angle above which the freestyle catch is a dropped elbow
    pub catch_elbow_angle: f64,
    /// Minimum shoulder depth difference counted as rotation
    pub shoulder_rotation: f64,
    pub kick_amplitude: f64,
    pub hand_entry_width: f64,
    /// How far freestyle hips may sit below the shoulders
    pub hip_drop: f64,
    pub backstroke_entry_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            body_alignment: 0.1,
            arm_movement: 0.3,
            shoulder_width_ratio: 1.2,
            shoulder_hip_distance: 0.2,
            freestyle_body_angle: 10.0,
            body_angle: 15.0,
            arm_extension: 0.4,
            catch_elbow_angle: 120.0,
            shoulder_rotation: 0.1,
            kick_amplitude: 0.3,
            hand_entry_width: 0.3,
            hip_drop: 0.1,
            backstroke_entry_ratio: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Square input edge of the landmark network
    pub input_size: u32,
    /// Minimum pose presence probability to accept a detection
    pub presence_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 256,
            presence_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Items shown per list for each video
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Settings for the `recognize` command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Rate the video is resampled to before classification
    pub fps: u32,
    /// Number of ranked classes printed
    pub top_k: usize,
    /// Upper bound on clip length; the whole video is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clip_frames: Option<usize>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            fps: 16,
            top_k: 5,
            max_clip_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            max_frames = 200

            [thresholds]
            kick_amplitude = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.max_frames, 200);
        assert_eq!(config.thresholds.kick_amplitude, 0.25);
        assert_eq!(config.thresholds.body_alignment, 0.1);
        assert_eq!(config.model.input_size, 256);
        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.action.fps, 16);
        assert_eq!(config.action.max_clip_frames, None);
    }

    #[test]
    fn test_action_section() {
        let config: Config = toml::from_str(
            r#"
            [action]
            top_k = 3
            max_clip_frames = 480
            "#,
        )
        .unwrap();

        assert_eq!(config.action.top_k, 3);
        assert_eq!(config.action.fps, 16);
        assert_eq!(config.action.max_clip_frames, Some(480));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("swim-coach-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.thresholds.catch_elbow_angle = 110.0;

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.thresholds, config.thresholds);
    }
}

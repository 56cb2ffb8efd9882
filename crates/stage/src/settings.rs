use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading stage settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tunables for the lighting scene. Every field has a default, so a
/// settings file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// Viewport used for the main camera's aspect before the first resize.
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Edge length of the square mirror and flip render targets.
    pub mirror_size: u32,
    pub shadow_map_size: u32,
    /// Text extruded next to the box.
    pub text: String,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            mirror_size: 512,
            shadow_map_size: 1024,
            text: "BEES".into(),
        }
    }
}

impl StageSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_yaml_str(&data)?;
        tracing::debug!(path = %path.as_ref().display(), ?settings, "stage settings loaded");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_reference_scene() {
        let s = StageSettings::default();
        assert_eq!(s.mirror_size, 512);
        assert_eq!(s.shadow_map_size, 1024);
        assert_eq!(s.text, "BEES");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let s = StageSettings::from_yaml_str("text: HIVE\nmirror_size: 256\n").unwrap();
        assert_eq!(s.text, "HIVE");
        assert_eq!(s.mirror_size, 256);
        assert_eq!(s.viewport_width, 1280);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = StageSettings::from_yaml_str("mirror_size: [nope").unwrap_err();
        assert!(matches!(err, SettingsError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "viewport_width: 800\nviewport_height: 600").unwrap();
        let s = StageSettings::load(tmp.path()).unwrap();
        assert_eq!((s.viewport_width, s.viewport_height), (800, 600));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StageSettings::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}

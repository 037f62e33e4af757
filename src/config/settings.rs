use std::path::Path;

use serde::Deserialize;

use crate::scale::ScaleAlgorithm;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scale_factor: u32,
    pub algorithm: ScaleAlgorithm,
    pub jpeg_quality: i32,
    pub png_compression: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scale_factor: 2,
            algorithm: ScaleAlgorithm::Epx,
            jpeg_quality: 90,
            png_compression: -1,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::UpscaleError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

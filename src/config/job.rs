use std::path::Path;

use serde::Deserialize;

use crate::scale::ScaleAlgorithm;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    pub scale_factor: Option<u32>,
    pub algorithm: Option<ScaleAlgorithm>,
    pub jpeg_quality: Option<i32>,
    pub png_compression: Option<i32>,
}

impl JobFile {
    /// ジョブYAMLをパースする。ジョブが1件もない場合はエラー。
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let job_file: JobFile = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::UpscaleError::config(format!("Failed to parse job YAML: {e}"))
        })?;

        if job_file.jobs.is_empty() {
            return Err(crate::error::UpscaleError::config(
                "Job file must contain at least one job",
            ));
        }

        Ok(job_file)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

use super::job::Job;
use super::settings::Settings;
use crate::scale::ScaleAlgorithm;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub scale_factor: u32,
    pub algorithm: ScaleAlgorithm,
    pub jpeg_quality: i32,
    pub png_compression: i32,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            scale_factor: job.scale_factor.unwrap_or(settings.scale_factor),
            algorithm: job.algorithm.unwrap_or(settings.algorithm),
            jpeg_quality: job.jpeg_quality.unwrap_or(settings.jpeg_quality),
            png_compression: job.png_compression.unwrap_or(settings.png_compression),
        }
    }

    /// Settingsのみから構成する（コマンドライン単発実行用）。
    pub fn from_settings(settings: &Settings) -> Self {
        MergedConfig {
            scale_factor: settings.scale_factor,
            algorithm: settings.algorithm,
            jpeg_quality: settings.jpeg_quality,
            png_compression: settings.png_compression,
        }
    }
}

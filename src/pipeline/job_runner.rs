// Phase 6: ジョブ単位: 画像読込 -> 拡大 -> エンコード出力

use std::path::PathBuf;

use tracing::info;

use crate::config::merged::MergedConfig;
use crate::encode::{OutputFormat, jpeg, png};
use crate::load;
use crate::scale::{self, ScaleAlgorithm};
use crate::surface::Surface;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub scale_factor: u32,
    pub algorithm: ScaleAlgorithm,
    /// JPEG quality, clamped to 0-100 by the encoder.
    pub jpeg_quality: i32,
    /// zlib level, clamped to -1..=9 by the encoder (-1 = default).
    pub png_compression: i32,
}

impl JobConfig {
    pub fn new(input_path: PathBuf, output_path: PathBuf, merged: &MergedConfig) -> Self {
        JobConfig {
            input_path,
            output_path,
            scale_factor: merged.scale_factor,
            algorithm: merged.algorithm,
            jpeg_quality: merged.jpeg_quality,
            png_compression: merged.png_compression,
        }
    }
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Load the input image, upscale it and write the output file.
///
/// The output format follows the output file extension. Arguments are
/// checked before the input is decoded.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    scale::validate_factor(config.scale_factor)?;
    let format = OutputFormat::from_path(&config.output_path)?;

    let src = load::load_surface(&config.input_path)?;
    let (src_width, src_height) = (src.width(), src.height());
    let argb = src.to_argb();
    drop(src);

    info!(
        input = %config.input_path.display(),
        factor = config.scale_factor,
        "Scaling image..."
    );
    let scaled = scale::scale(
        config.scale_factor,
        config.algorithm,
        &argb,
        src_width,
        src_height,
    )?;
    drop(argb);

    let width = src_width * config.scale_factor;
    let height = src_height * config.scale_factor;
    let dst = Surface::from_argb(width, height, &scaled)?;
    drop(scaled);

    info!(output = %config.output_path.display(), ?format, "Saving image...");
    match format {
        OutputFormat::Jpeg => jpeg::encode_to_file(&config.output_path, &dst, config.jpeg_quality)?,
        OutputFormat::Png => png::encode_to_file(&config.output_path, &dst, config.png_compression)?,
    }

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        width,
        height,
    })
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use pixel_upscale::config::job::JobFile;
use pixel_upscale::config::merged::MergedConfig;
use pixel_upscale::config::{self};
use pixel_upscale::pipeline::job_runner::JobConfig;
use pixel_upscale::pipeline::orchestrator::run_all_jobs;
use pixel_upscale::scale;

fn print_usage() {
    eprintln!("Usage: pixel_upscale <scale_factor> <input_image> <output_image>");
    eprintln!("       pixel_upscale --jobs <jobs.yaml>...");
    eprintln!(
        "  scale_factor can be between {} and {}; the output format follows the",
        scale::MIN_FACTOR,
        scale::MAX_FACTOR
    );
    eprintln!("  output extension (.png, .jpg, .jpeg).");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pixel_upscale {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging();

    let job_configs = if args[0] == "--jobs" {
        if args.len() < 2 {
            print_usage();
            return ExitCode::FAILURE;
        }
        match collect_job_files(&args[1..]) {
            Ok(jobs) => jobs,
            Err(msg) => {
                eprintln!("ERROR: {msg}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        match single_job(&args) {
            Ok(job) => vec![job],
            Err(msg) => {
                eprintln!("ERROR: {msg}");
                return ExitCode::FAILURE;
            }
        }
    };

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                eprintln!(
                    "OK: {} -> {} ({}x{})",
                    job_result.input_path.display(),
                    job_result.output_path.display(),
                    job_result.width,
                    job_result.height
                );
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job_configs[i].input_path.display(),
                    job_configs[i].output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `<scale_factor> <input> <output>`; other settings come from a
/// settings.yaml next to the input image.
fn single_job(args: &[String]) -> Result<JobConfig, String> {
    if args.len() != 3 {
        print_usage();
        return Err(format!("expected 3 arguments, got {}", args.len()));
    }

    let scale_factor: u32 = args[0]
        .parse()
        .map_err(|_| format!("invalid scale_factor '{}'", args[0]))?;
    scale::validate_factor(scale_factor).map_err(|e| e.to_string())?;

    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);

    let settings = config::load_settings_for_job(&input_path)
        .map_err(|e| format!("Failed to load settings for {}: {e}", input_path.display()))?;
    let mut merged = MergedConfig::from_settings(&settings);
    merged.scale_factor = scale_factor;

    Ok(JobConfig::new(input_path, output_path, &merged))
}

fn collect_job_files(paths: &[String]) -> Result<Vec<JobConfig>, String> {
    let mut job_configs = Vec::new();

    for job_file_arg in paths {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = config::load_settings_for_job(job_file_path)
            .map_err(|e| format!("Failed to load settings for {job_file_arg}: {e}"))?;

        let job_file = JobFile::from_file(job_file_path)
            .map_err(|e| format!("Failed to read job file {job_file_arg}: {e}"))?;

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            job_configs.push(JobConfig::new(
                resolve_path(&job_dir, &job.input),
                resolve_path(&job_dir, &job.output),
                &merged,
            ));
        }
    }

    Ok(job_configs)
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

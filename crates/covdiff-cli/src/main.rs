//! cov-diff reports how much of a change's newly added Go code is exercised
//! by tests, by combining a unified diff with a Go coverage profile.
//!
//! Exit codes: 0 when the check passes, 2 when the percentage is below the
//! configured minimum, 1 on any error.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use covdiff_adapters_repo::GoFunctionBodies;
use covdiff_app::{AppError, CheckRequest, check};
use covdiff_config::{
    ActionInputs, CliOverrides, ConfigError, discover_config, load_config, resolve_config,
};
use covdiff_render::{render_github_output, render_set_output_command};
use covdiff_types::{OUTPUT_NAME, Report};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_CODE_ERROR: i32 = 1;

/// Report test coverage on the lines a change adds.
#[derive(Parser, Debug)]
#[command(name = "cov-diff")]
#[command(version, about)]
struct Cli {
    /// Path to the repository checkout
    #[arg(long)]
    path: Option<PathBuf>,

    /// Go coverage profile (`go test -coverprofile`)
    #[arg(long)]
    coverprofile: Option<PathBuf>,

    /// Unified diff of the change
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Module path prefixing file names in the coverage profile
    #[arg(long)]
    module: Option<String>,

    /// Leave files in `package main` out of the measurement
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    ignore_main: Option<bool>,

    /// Fail with exit code 2 when coverage is below this percentage
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    min_coverage: Option<u32>,

    /// Path to config file (default: auto-discover covdiff.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Write the JSON report to this path
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    App(#[from] AppError),
}

fn main() {
    let exit_code = match Cli::try_parse() {
        Ok(cli) => {
            init_tracing(cli.verbose);
            match run(cli) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("error: {}", e);
                    EXIT_CODE_ERROR
                }
            }
        }
        Err(clap_err) => {
            // Exit code 2 is reserved for the coverage gate.
            let _ = clap_err.print();
            if clap_err.use_stderr() {
                EXIT_CODE_ERROR
            } else {
                0
            }
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let config = match &cli.config {
        Some(path) => Some(load_config(path)?),
        None => discover_config()?.map(|(path, config)| {
            debug!(path = %path.display(), "using discovered config");
            config
        }),
    };

    let inputs = ActionInputs::from_env()?;
    let overrides = CliOverrides {
        path: cli.path,
        coverprofile: cli.coverprofile,
        diff: cli.diff,
        module: cli.module,
        ignore_main: cli.ignore_main,
        min_coverage_pct: cli.min_coverage,
    };
    let effective = resolve_config(config.as_ref(), &inputs, &overrides)?;
    debug!(?effective, "resolved configuration");

    let request = CheckRequest {
        diff_text: read_file(&effective.diff)?,
        coverage_text: read_file(&effective.coverprofile)?,
        module: effective.module.clone(),
        min_coverage_pct: effective.min_coverage_pct,
    };
    let structure = GoFunctionBodies::new(&effective.repo_path, effective.ignore_main);

    let result = check(&request, &effective.files, &structure)?;
    print!("{}", result.text);

    if let Some(out) = &cli.out {
        write_report(out, &result.report)?;
    }
    if effective.github_output {
        publish_output(&result.report.coverage_pct.to_string())?;
    }

    Ok(result.exit_code)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::FileRead {
        path: path.display().to_string(),
        source,
    })
}

fn write_report(path: &Path, report: &Report) -> Result<(), CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CliError::DirCreate {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    fs::write(path, json).map_err(|source| CliError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}

/// Publish the percentage as a step output.
///
/// Appends to the file named by `GITHUB_OUTPUT` when set, otherwise prints
/// the legacy workflow command.
fn publish_output(value: &str) -> Result<(), CliError> {
    match std::env::var("GITHUB_OUTPUT") {
        Ok(path) if !path.is_empty() => {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| CliError::FileWrite {
                    path: path.clone(),
                    source,
                })?;
            file.write_all(render_github_output(OUTPUT_NAME, value).as_bytes())
                .map_err(|source| CliError::FileWrite { path, source })
        }
        _ => {
            print!("{}", render_set_output_command(OUTPUT_NAME, value));
            Ok(())
        }
    }
}
